//! Measures that change air leakage: window and door work plus whole-house
//! air sealing.
//!
//! Window and door measures lower the leakage attributed to their component;
//! the dwelling's derived effective cfm50 subtracts those reductions from the
//! blower-door figure. Whole-house air sealing brings the effective figure
//! down to the auditor's target, which already counts the component work, so
//! the part of the audited-to-target reduction that windows and doors
//! delivered is withheld from it through the interaction ledger.

use crate::dwelling::{DoorGroup, DwellingState, WindowGroup, component};
use crate::error::EngineError;

use super::{Guard, GuardView, Measure, MeasureKind, RetrofitOption, Target, missing};

const NEW_WINDOW_U: f64 = 0.30;
/// Share of audited leakage left after replacing a window.
const NEW_WINDOW_LEAKAGE: f64 = 0.3;
/// Share of current leakage left after adding a storm panel.
const STORM_LEAKAGE: f64 = 0.6;
const NEW_DOOR_U: f64 = 0.20;
const NEW_DOOR_LEAKAGE: f64 = 0.4;
const WEATHERSTRIP_LEAKAGE: f64 = 0.7;

fn window_targets(state: &DwellingState) -> Vec<Target> {
    state
        .envelope
        .windows
        .iter()
        .enumerate()
        .filter(|(_, w)| w.count > 0 && w.area_ft2 > 0.0)
        .map(|(i, w)| Target::new(w.code.clone(), i))
        .collect()
}

fn door_targets(state: &DwellingState) -> Vec<Target> {
    state
        .envelope
        .doors
        .iter()
        .enumerate()
        .filter(|(_, d)| d.count > 0)
        .map(|(i, d)| Target::new(d.code.clone(), i))
        .collect()
}

fn window_mut<'a>(
    kind: MeasureKind,
    target: &Target,
    state: &'a mut DwellingState,
) -> Result<&'a mut WindowGroup, EngineError> {
    state
        .envelope_mut()
        .windows
        .get_mut(target.index)
        .ok_or_else(|| missing(kind, target))
}

fn door_mut<'a>(
    kind: MeasureKind,
    target: &Target,
    state: &'a mut DwellingState,
) -> Result<&'a mut DoorGroup, EngineError> {
    state
        .envelope_mut()
        .doors
        .get_mut(target.index)
        .ok_or_else(|| missing(kind, target))
}

/// Replaces a window group with low-e double glazing.
pub struct WindowReplacement;

impl Measure for WindowReplacement {
    fn kind(&self) -> MeasureKind {
        MeasureKind::WindowReplacement
    }

    fn targets(&self, state: &DwellingState) -> Vec<Target> {
        window_targets(state)
    }

    fn guard(&self, target: &Target, view: &GuardView<'_>) -> Guard {
        match view.state.envelope.windows.get(target.index) {
            Some(w) if w.replaced => Guard::Skip("window already replaced"),
            Some(w) if w.u_value <= 0.35 => Guard::Skip("window already efficient"),
            Some(_) => Guard::Apply,
            None => Guard::Skip("window not found"),
        }
    }

    fn apply(
        &self,
        target: &Target,
        _option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        let w = window_mut(self.kind(), target, state)?;
        w.u_value = NEW_WINDOW_U;
        w.leakage_cfm50 = w.audited_leakage_cfm50 * NEW_WINDOW_LEAKAGE;
        w.has_storm = false;
        w.replaced = true;
        Ok(w.area_ft2)
    }

    fn apply_leakage_only(
        &self,
        target: &Target,
        state: &mut DwellingState,
    ) -> Result<(), EngineError> {
        let w = window_mut(self.kind(), target, state)?;
        w.leakage_cfm50 = w.audited_leakage_cfm50 * NEW_WINDOW_LEAKAGE;
        Ok(())
    }
}

/// Adds interior or exterior storm panels to a window group.
pub struct StormWindow;

impl Measure for StormWindow {
    fn kind(&self) -> MeasureKind {
        MeasureKind::StormWindow
    }

    fn targets(&self, state: &DwellingState) -> Vec<Target> {
        window_targets(state)
    }

    fn guard(&self, target: &Target, view: &GuardView<'_>) -> Guard {
        match view.state.envelope.windows.get(target.index) {
            Some(w) if w.has_storm => Guard::Skip("storm panels already present"),
            Some(w) if w.replaced => Guard::Skip("window already replaced"),
            Some(_) => Guard::Apply,
            None => Guard::Skip("window not found"),
        }
    }

    fn apply(
        &self,
        target: &Target,
        _option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        let w = window_mut(self.kind(), target, state)?;
        w.has_storm = true;
        w.leakage_cfm50 *= STORM_LEAKAGE;
        Ok(w.area_ft2)
    }

    fn apply_leakage_only(
        &self,
        target: &Target,
        state: &mut DwellingState,
    ) -> Result<(), EngineError> {
        let w = window_mut(self.kind(), target, state)?;
        w.leakage_cfm50 *= STORM_LEAKAGE;
        Ok(())
    }
}

/// Replaces an exterior door group with insulated, gasketed doors.
pub struct DoorReplacement;

impl Measure for DoorReplacement {
    fn kind(&self) -> MeasureKind {
        MeasureKind::DoorReplacement
    }

    fn targets(&self, state: &DwellingState) -> Vec<Target> {
        door_targets(state)
    }

    fn guard(&self, target: &Target, view: &GuardView<'_>) -> Guard {
        match view.state.envelope.doors.get(target.index) {
            Some(d) if d.replaced => Guard::Skip("door already replaced"),
            Some(d) if d.u_value <= 0.25 => Guard::Skip("door already insulated"),
            Some(_) => Guard::Apply,
            None => Guard::Skip("door not found"),
        }
    }

    fn apply(
        &self,
        target: &Target,
        _option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        let d = door_mut(self.kind(), target, state)?;
        d.u_value = NEW_DOOR_U;
        d.leakage_cfm50 = d.audited_leakage_cfm50 * NEW_DOOR_LEAKAGE;
        d.weatherstripped = true;
        d.replaced = true;
        Ok(f64::from(d.count))
    }

    fn apply_leakage_only(
        &self,
        target: &Target,
        state: &mut DwellingState,
    ) -> Result<(), EngineError> {
        let d = door_mut(self.kind(), target, state)?;
        d.leakage_cfm50 = d.audited_leakage_cfm50 * NEW_DOOR_LEAKAGE;
        Ok(())
    }
}

/// Weatherstrips a door group. Changes leakage only.
pub struct DoorWeatherstrip;

impl Measure for DoorWeatherstrip {
    fn kind(&self) -> MeasureKind {
        MeasureKind::DoorWeatherstrip
    }

    fn targets(&self, state: &DwellingState) -> Vec<Target> {
        door_targets(state)
    }

    fn guard(&self, target: &Target, view: &GuardView<'_>) -> Guard {
        match view.state.envelope.doors.get(target.index) {
            Some(d) if d.weatherstripped => Guard::Skip("door already weatherstripped"),
            Some(d) if d.replaced => Guard::Skip("door already replaced"),
            Some(d) if d.leakage_cfm50 <= 0.0 => Guard::Skip("door has no measured leakage"),
            Some(_) => Guard::Apply,
            None => Guard::Skip("door not found"),
        }
    }

    fn apply(
        &self,
        target: &Target,
        _option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        let d = door_mut(self.kind(), target, state)?;
        d.leakage_cfm50 *= WEATHERSTRIP_LEAKAGE;
        d.weatherstripped = true;
        Ok(f64::from(d.count))
    }

    fn apply_leakage_only(
        &self,
        target: &Target,
        state: &mut DwellingState,
    ) -> Result<(), EngineError> {
        let d = door_mut(self.kind(), target, state)?;
        d.leakage_cfm50 *= WEATHERSTRIP_LEAKAGE;
        Ok(())
    }
}

/// Whole-house air sealing down to the auditor's target cfm50.
pub struct InfiltrationReduction;

impl Measure for InfiltrationReduction {
    fn kind(&self) -> MeasureKind {
        MeasureKind::InfiltrationReduction
    }

    fn targets(&self, _state: &DwellingState) -> Vec<Target> {
        vec![Target::single(component::HOUSE)]
    }

    fn guard(&self, _target: &Target, view: &GuardView<'_>) -> Guard {
        let target = view.state.air_leakage.target_cfm50;
        if target <= 0.0 {
            Guard::Skip("no air sealing target")
        } else if target >= view.state.derived.effective_cfm50 {
            Guard::Skip("house already at target leakage")
        } else {
            Guard::Apply
        }
    }

    /// Returns the effective cfm50 removed.
    fn apply(
        &self,
        _target: &Target,
        _option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        let component_reduction = state.component_leakage_reduction();
        let leak = state.air_leakage_mut();
        let sealed = leak.target_cfm50 + component_reduction;
        let reduced = leak.cfm50 - sealed;
        if reduced <= 0.0 {
            return Ok(0.0);
        }
        leak.cfm50 = sealed;
        Ok(reduced)
    }
}
