//! Heating, cooling, distribution, and controls.

use crate::dwelling::{DwellingState, component};
use crate::economics::MeasureClass;
use crate::energy::Fuel;
use crate::error::EngineError;

use super::{Guard, GuardView, Measure, MeasureKind, RetrofitOption, Target};

const DUCT_SEALING_GAIN: f64 = 0.10;
const MAX_DUCT_EFFICIENCY: f64 = 0.95;
const TUNE_UP_GAIN: f64 = 0.03;
const NEW_SEER: f64 = 16.0;
const MIN_ACCEPTABLE_SEER: f64 = 13.0;

/// Seasonal efficiency of the replacement installed for a `fuel` system.
///
/// Electric systems are replaced by an air-source heat pump, so the figure is
/// a seasonal COP rather than an AFUE.
pub fn replacement_afue(fuel: Fuel) -> f64 {
    match fuel {
        Fuel::NaturalGas | Fuel::Propane => 0.95,
        Fuel::FuelOil | Fuel::Kerosene => 0.87,
        Fuel::Electricity => 2.5,
        Fuel::Wood => 0.75,
    }
}

/// Seals supply and return ducts outside the conditioned space.
pub struct DuctSealing;

impl Measure for DuctSealing {
    fn kind(&self) -> MeasureKind {
        MeasureKind::DuctSealing
    }

    fn targets(&self, _state: &DwellingState) -> Vec<Target> {
        vec![Target::single(component::DUCTS)]
    }

    fn guard(&self, _target: &Target, view: &GuardView<'_>) -> Guard {
        let ducts = &view.state.ducts;
        if ducts.sealed {
            Guard::Skip("ducts already sealed")
        } else if !ducts.outside_envelope {
            Guard::Skip("ducts inside conditioned space")
        } else if ducts.distribution_efficiency >= MAX_DUCT_EFFICIENCY {
            Guard::Skip("distribution already efficient")
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
        let ducts = state.ducts_mut();
        ducts.distribution_efficiency =
            (ducts.distribution_efficiency + DUCT_SEALING_GAIN).min(MAX_DUCT_EFFICIENCY);
        ducts.sealed = true;
        Ok(1.0)
    }
}

/// Replaces the heating system with a high-efficiency unit of the same fuel.
pub struct HeatingReplacement;

impl Measure for HeatingReplacement {
    fn kind(&self) -> MeasureKind {
        MeasureKind::HeatingReplacement
    }

    fn targets(&self, _state: &DwellingState) -> Vec<Target> {
        vec![Target::single(component::HEATING)]
    }

    fn guard(&self, _target: &Target, view: &GuardView<'_>) -> Guard {
        let heat = &view.state.heating;
        if !heat.red_tagged && heat.afue >= replacement_afue(heat.fuel) - 0.01 {
            Guard::Skip("system already high efficiency")
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
        let heat = state.heating_mut();
        heat.afue = replacement_afue(heat.fuel);
        heat.red_tagged = false;
        heat.tuned = true;
        Ok(1.0)
    }

    fn class(&self, state: &DwellingState) -> MeasureClass {
        if state.heating.red_tagged {
            MeasureClass::MandatoryEquipment(self.kind())
        } else {
            MeasureClass::Standard(self.kind())
        }
    }
}

/// Cleans and adjusts the existing combustion system.
pub struct HeatingTuneUp;

impl Measure for HeatingTuneUp {
    fn kind(&self) -> MeasureKind {
        MeasureKind::HeatingTuneUp
    }

    fn targets(&self, _state: &DwellingState) -> Vec<Target> {
        vec![Target::single(component::HEATING)]
    }

    fn guard(&self, target: &Target, view: &GuardView<'_>) -> Guard {
        let heat = &view.state.heating;
        if heat.red_tagged {
            Guard::Skip("system is red-tagged")
        } else if view.state.is_required(MeasureKind::HeatingReplacement) {
            Guard::Skip("replacement is required")
        } else if view.committed(MeasureKind::HeatingReplacement, &target.component) {
            Guard::Skip("system replaced in this pass")
        } else if heat.tuned {
            Guard::Skip("system already tuned")
        } else if matches!(heat.fuel, Fuel::Electricity | Fuel::Wood) {
            Guard::Skip("no tune-up for this fuel")
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
        let heat = state.heating_mut();
        heat.afue = (heat.afue + TUNE_UP_GAIN).min(0.98);
        heat.tuned = true;
        Ok(1.0)
    }
}

/// Installs a setback thermostat.
pub struct ProgrammableThermostat;

impl Measure for ProgrammableThermostat {
    fn kind(&self) -> MeasureKind {
        MeasureKind::ProgrammableThermostat
    }

    fn targets(&self, _state: &DwellingState) -> Vec<Target> {
        vec![Target::single(component::THERMOSTAT)]
    }

    fn guard(&self, _target: &Target, view: &GuardView<'_>) -> Guard {
        if view.state.heating.setback {
            Guard::Skip("setback already in use")
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
        state.heating_mut().setback = true;
        Ok(1.0)
    }
}

/// Replaces a low-SEER central air conditioner.
pub struct CoolingReplacement;

impl Measure for CoolingReplacement {
    fn kind(&self) -> MeasureKind {
        MeasureKind::CoolingReplacement
    }

    fn targets(&self, state: &DwellingState) -> Vec<Target> {
        match state.cooling {
            Some(_) => vec![Target::single(component::COOLING)],
            None => Vec::new(),
        }
    }

    fn guard(&self, _target: &Target, view: &GuardView<'_>) -> Guard {
        match &view.state.cooling {
            None => Guard::Skip("no cooling system"),
            Some(cs) if cs.seer >= MIN_ACCEPTABLE_SEER => Guard::Skip("cooling already efficient"),
            Some(_) => Guard::Apply,
        }
    }

    fn apply(
        &self,
        target: &Target,
        _option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        let cs = state
            .cooling_mut()
            .ok_or_else(|| super::missing(self.kind(), target))?;
        cs.seer = NEW_SEER;
        Ok(1.0)
    }
}
