//! Water heating, lighting, and appliance measures.

use crate::dwelling::{DwellingState, component};
use crate::energy::Fuel;
use crate::error::EngineError;

use super::{Guard, GuardView, Measure, MeasureKind, RetrofitOption, Target, missing};

const WRAP_GAIN: f64 = 0.03;
const LED_WATTS: f64 = 9.0;
const NEW_FRIDGE_KWH: f64 = 400.0;
const FRIDGE_REPLACE_ABOVE_KWH: f64 = 600.0;

/// Energy factor of a replacement water heater on `fuel`.
pub fn replacement_energy_factor(fuel: Fuel) -> f64 {
    match fuel {
        Fuel::NaturalGas | Fuel::Propane => 0.67,
        Fuel::Electricity => 0.95,
        Fuel::FuelOil | Fuel::Kerosene | Fuel::Wood => 0.62,
    }
}

pub struct WaterHeaterReplacement;

impl Measure for WaterHeaterReplacement {
    fn kind(&self) -> MeasureKind {
        MeasureKind::WaterHeaterReplacement
    }

    fn targets(&self, _state: &DwellingState) -> Vec<Target> {
        vec![Target::single(component::WATER_HEATER)]
    }

    fn guard(&self, _target: &Target, view: &GuardView<'_>) -> Guard {
        let dhw = &view.state.water_heater;
        if dhw.energy_factor >= replacement_energy_factor(dhw.fuel) - 0.01 {
            Guard::Skip("water heater already efficient")
        } else {
            Guard::Apply
        }
    }

    fn apply(
        &self,
        _target: &Target,
        _option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        let dhw = state.water_heater_mut();
        dhw.energy_factor = replacement_energy_factor(dhw.fuel);
        dhw.tank_insulated = true;
        Ok(1.0)
    }
}

/// Insulating blanket on an existing tank.
pub struct WaterHeaterWrap;

impl Measure for WaterHeaterWrap {
    fn kind(&self) -> MeasureKind {
        MeasureKind::WaterHeaterWrap
    }

    fn targets(&self, _state: &DwellingState) -> Vec<Target> {
        vec![Target::single(component::WATER_HEATER)]
    }

    fn guard(&self, target: &Target, view: &GuardView<'_>) -> Guard {
        if view.state.water_heater.tank_insulated {
            Guard::Skip("tank already insulated")
        } else if view.committed(MeasureKind::WaterHeaterReplacement, &target.component) {
            Guard::Skip("water heater replaced in this pass")
        } else {
            Guard::Apply
        }
    }

    fn apply(
        &self,
        _target: &Target,
        _option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        let dhw = state.water_heater_mut();
        dhw.energy_factor += WRAP_GAIN;
        dhw.tank_insulated = true;
        Ok(1.0)
    }
}

pub struct LowFlowShowerhead;

impl Measure for LowFlowShowerhead {
    fn kind(&self) -> MeasureKind {
        MeasureKind::LowFlowShowerhead
    }

    fn targets(&self, _state: &DwellingState) -> Vec<Target> {
        vec![Target::single(component::WATER_HEATER)]
    }

    fn guard(&self, _target: &Target, view: &GuardView<'_>) -> Guard {
        let dhw = &view.state.water_heater;
        if dhw.low_flow_showers {
            Guard::Skip("showerheads already low-flow")
        } else if dhw.gallons_per_day <= 0.0 {
            Guard::Skip("no hot water use")
        } else {
            Guard::Apply
        }
    }

    fn apply(
        &self,
        _target: &Target,
        _option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        state.water_heater_mut().low_flow_showers = true;
        Ok(1.0)
    }
}

/// Swaps incandescent lamps for LEDs.
pub struct LightingRetrofit;

impl Measure for LightingRetrofit {
    fn kind(&self) -> MeasureKind {
        MeasureKind::LightingRetrofit
    }

    fn targets(&self, _state: &DwellingState) -> Vec<Target> {
        vec![Target::single(component::LIGHTING)]
    }

    fn guard(&self, _target: &Target, view: &GuardView<'_>) -> Guard {
        let lt = &view.state.lighting;
        if lt.retrofitted {
            Guard::Skip("lighting already retrofitted")
        } else if lt.lamps == 0 || lt.watts_per_lamp <= LED_WATTS {
            Guard::Skip("no inefficient lamps")
        } else {
            Guard::Apply
        }
    }

    fn apply(
        &self,
        _target: &Target,
        _option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        let lt = state.lighting_mut();
        lt.watts_per_lamp = LED_WATTS;
        lt.retrofitted = true;
        Ok(f64::from(lt.lamps))
    }
}

pub struct RefrigeratorReplacement;

impl Measure for RefrigeratorReplacement {
    fn kind(&self) -> MeasureKind {
        MeasureKind::RefrigeratorReplacement
    }

    fn targets(&self, state: &DwellingState) -> Vec<Target> {
        state
            .refrigerators
            .iter()
            .enumerate()
            .map(|(i, r)| Target::new(r.code.clone(), i))
            .collect()
    }

    fn guard(&self, target: &Target, view: &GuardView<'_>) -> Guard {
        match view.state.refrigerators.get(target.index) {
            Some(r) if r.replaced => Guard::Skip("refrigerator already replaced"),
            Some(r) if r.annual_kwh <= FRIDGE_REPLACE_ABOVE_KWH => {
                Guard::Skip("refrigerator already efficient")
            }
            Some(_) => Guard::Apply,
            None => Guard::Skip("refrigerator not found"),
        }
    }

    fn apply(
        &self,
        target: &Target,
        _option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        let fridge = state
            .refrigerators_mut()
            .get_mut(target.index)
            .ok_or_else(|| missing(self.kind(), target))?;
        fridge.annual_kwh = NEW_FRIDGE_KWH;
        fridge.replaced = true;
        Ok(1.0)
    }
}
