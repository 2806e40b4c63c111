//! Insulation measures: attic, walls, and floor.

use crate::dwelling::{DwellingState, FoundationKind};
use crate::error::EngineError;

use super::{Guard, GuardView, Measure, MeasureKind, RetrofitOption, Target, missing};

/// Added R-values tried for blown attic insulation.
pub const LOOSE_FILL_LEVELS: [f64; 4] = [19.0, 30.0, 38.0, 49.0];
const BATT_R: f64 = 19.0;
const WALL_CAVITY_R: f64 = 11.0;
const FLOOR_R: f64 = 19.0;

/// Blown loose fill over an unfloored attic, several depths.
pub struct AtticLooseFill;

impl Measure for AtticLooseFill {
    fn kind(&self) -> MeasureKind {
        MeasureKind::AtticInsulation
    }

    fn targets(&self, state: &DwellingState) -> Vec<Target> {
        state
            .envelope
            .attics
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.floored)
            .map(|(i, a)| Target::new(a.code.clone(), i))
            .collect()
    }

    fn guard(&self, target: &Target, view: &GuardView<'_>) -> Guard {
        match view.state.envelope.attics.get(target.index) {
            Some(a) if a.area_ft2 <= 0.0 => Guard::Skip("attic has no area"),
            Some(a) if a.total_r() >= 38.0 => Guard::Skip("attic already at R-38"),
            Some(_) => Guard::Apply,
            None => Guard::Skip("attic not found"),
        }
    }

    fn options(&self, _target: &Target, _state: &DwellingState) -> Vec<RetrofitOption> {
        LOOSE_FILL_LEVELS
            .iter()
            .map(|&r| RetrofitOption {
                label: format!("R-{r:.0}"),
                cost_factor: r / LOOSE_FILL_LEVELS[0],
                level: r,
            })
            .collect()
    }

    fn apply(
        &self,
        target: &Target,
        option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        let attic = state
            .envelope_mut()
            .attics
            .get_mut(target.index)
            .ok_or_else(|| missing(self.kind(), target))?;
        attic.added_r += option.level;
        Ok(attic.area_ft2)
    }
}

/// Fiberglass batts, usable on floored attics too.
pub struct AtticBatts;

impl Measure for AtticBatts {
    fn kind(&self) -> MeasureKind {
        MeasureKind::AtticBattInsulation
    }

    fn targets(&self, state: &DwellingState) -> Vec<Target> {
        state
            .envelope
            .attics
            .iter()
            .enumerate()
            .map(|(i, a)| Target::new(a.code.clone(), i))
            .collect()
    }

    fn guard(&self, target: &Target, view: &GuardView<'_>) -> Guard {
        if view.committed(MeasureKind::AtticInsulation, &target.component) {
            return Guard::Skip("loose fill already installed on this attic");
        }
        match view.state.envelope.attics.get(target.index) {
            Some(a) if a.area_ft2 <= 0.0 => Guard::Skip("attic has no area"),
            Some(a) if a.total_r() >= 30.0 => Guard::Skip("attic already at R-30"),
            Some(_) => Guard::Apply,
            None => Guard::Skip("attic not found"),
        }
    }

    fn apply(
        &self,
        target: &Target,
        _option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        let attic = state
            .envelope_mut()
            .attics
            .get_mut(target.index)
            .ok_or_else(|| missing(self.kind(), target))?;
        attic.added_r += BATT_R;
        Ok(attic.area_ft2)
    }
}

/// Dense-pack cellulose in empty wall cavities.
pub struct WallInsulation;

impl Measure for WallInsulation {
    fn kind(&self) -> MeasureKind {
        MeasureKind::WallInsulation
    }

    fn targets(&self, state: &DwellingState) -> Vec<Target> {
        state
            .envelope
            .walls
            .iter()
            .enumerate()
            .filter(|(_, w)| !w.cavity_insulated)
            .map(|(i, w)| Target::new(w.code.clone(), i))
            .collect()
    }

    fn guard(&self, target: &Target, view: &GuardView<'_>) -> Guard {
        match view.state.envelope.walls.get(target.index) {
            Some(w) if w.cavity_insulated => Guard::Skip("cavity already insulated"),
            Some(w) if w.gross_area_ft2 <= 0.0 => Guard::Skip("wall has no area"),
            Some(w) if w.uninsulatable_fraction >= 1.0 => Guard::Skip("wall cannot be reached"),
            Some(_) => Guard::Apply,
            None => Guard::Skip("wall not found"),
        }
    }

    fn apply(
        &self,
        target: &Target,
        _option: &RetrofitOption,
        state: &mut DwellingState,
    ) -> Result<f64, EngineError> {
        let wall = state
            .envelope_mut()
            .walls
            .get_mut(target.index)
            .ok_or_else(|| missing(self.kind(), target))?;
        wall.added_r = WALL_CAVITY_R;
        wall.cavity_insulated = true;
        Ok(wall.gross_area_ft2 * (1.0 - wall.uninsulatable_fraction))
    }
}

/// Batts under the floor of a crawlspace or basement.
pub struct FoundationInsulation;

impl Measure for FoundationInsulation {
    fn kind(&self) -> MeasureKind {
        MeasureKind::FoundationInsulation
    }

    fn targets(&self, state: &DwellingState) -> Vec<Target> {
        let fnd = &state.envelope.foundation;
        if fnd.kind == FoundationKind::Slab {
            Vec::new()
        } else {
            vec![Target::new(fnd.code.clone(), 0)]
        }
    }

    fn guard(&self, _target: &Target, view: &GuardView<'_>) -> Guard {
        let fnd = &view.state.envelope.foundation;
        if fnd.floor_area_ft2 <= 0.0 {
            Guard::Skip("foundation has no area")
        } else if fnd.existing_r + fnd.added_r >= FLOOR_R {
            Guard::Skip("floor already insulated")
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
        let fnd = &mut state.envelope_mut().foundation;
        fnd.added_r = FLOOR_R;
        Ok(fnd.floor_area_ft2)
    }
}
