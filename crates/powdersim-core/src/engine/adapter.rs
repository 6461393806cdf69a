use super::capability::{self, EngineId};
use super::error::CalcError;
use super::pool::CancelToken;
use super::progress::ProgressReporter;
use crate::core::experiment::{BeamMode, ExperimentType};
use crate::core::models::atom::AtomSite;
use crate::core::models::background::Background;
use crate::core::models::pattern::Pattern;
use crate::core::models::phase::{Phase, SpaceGroupSetting, validate_scale};
use crate::core::models::reflection::ReflectionList;
use crate::core::models::result::CalcResult;
use crate::core::symmetry::SpaceGroup;
use crate::core::uncertainty::Measured;

/// The contract every calculation engine adapter fulfils.
///
/// An adapter translates the common structural model into its engine's native objects,
/// runs the engine and normalizes the output into a [`CalcResult`]. Mutating operations
/// either succeed completely or leave the adapter untouched.
pub trait EngineAdapter {
    fn engine_id(&self) -> EngineId;

    /// Shared bookkeeping of the registered model.
    fn state(&self) -> &ModelState;

    /// Prepares an empty model for `ty`. Calling it again with the current type is a
    /// no-op; any other type discards the model and starts over.
    fn create_model(&mut self, ty: ExperimentType) -> Result<(), CalcError>;

    fn add_phase(&mut self, phase: &Phase) -> Result<(), CalcError>;
    fn remove_phase(&mut self, label: &str) -> Result<(), CalcError>;
    fn add_atom(&mut self, phase: &str, atom: &AtomSite) -> Result<(), CalcError>;
    fn remove_atom(&mut self, phase: &str, atom: &str) -> Result<(), CalcError>;
    fn set_space_group(&mut self, phase: &str, setting: &SpaceGroupSetting)
    -> Result<(), CalcError>;
    fn set_pattern(&mut self, pattern: &Pattern) -> Result<(), CalcError>;
    /// Sets individual profile parameters of the active beam kind, e.g. `("w", 0.01)`.
    fn update_resolution(&mut self, values: &[(String, Measured)]) -> Result<(), CalcError>;
    fn set_background(&mut self, background: &Background) -> Result<(), CalcError>;
    fn set_phase_scale(&mut self, phase: &str, scale: f64) -> Result<(), CalcError>;

    fn calculate_with(
        &mut self,
        x: &[f64],
        reporter: &ProgressReporter<'_>,
    ) -> Result<&CalcResult, CalcError>;

    fn calculate(&mut self, x: &[f64]) -> Result<&CalcResult, CalcError> {
        self.calculate_with(x, &ProgressReporter::new())
    }

    /// Token interrupting a running calculation, for adapters that can be interrupted.
    fn cancel_token(&self) -> Option<CancelToken> {
        None
    }

    fn experiment_type(&self) -> ExperimentType {
        self.state().experiment_type()
    }

    fn is_tof(&self) -> bool {
        self.experiment_type().is_tof()
    }

    fn pattern(&self) -> &Pattern {
        self.state().pattern()
    }

    fn background(&self) -> &Background {
        self.state().background()
    }

    /// Scale of `phase`, or 1 when the phase is not registered.
    fn phase_scale(&self, phase: &str) -> f64 {
        self.state().phase_scale(phase)
    }

    fn phase_labels(&self) -> Vec<String> {
        self.state().labels()
    }

    fn last_result(&self) -> Option<&CalcResult> {
        self.state().last_result()
    }

    /// Scaled profile of `label` from the last successful calculation.
    fn phase_profile(&self, label: &str) -> Option<&[f64]> {
        self.last_result()
            .and_then(|r| r.phase(label))
            .map(|p| p.profile.as_slice())
    }

    fn total_profile(&self) -> Option<&[f64]> {
        self.last_result().map(|r| r.total.as_slice())
    }

    /// Reflection lists keyed by registered phase label.
    ///
    /// With `x` given, the pattern is recalculated first unless `x` is the grid of the
    /// last result. Phases that have not been calculated yet report an empty list.
    fn reflections(
        &mut self,
        phase: Option<&str>,
        x: Option<&[f64]>,
    ) -> Result<Vec<(String, ReflectionList)>, CalcError> {
        if let Some(phase) = phase {
            self.state().phase(phase)?;
        }
        if let Some(x) = x {
            let stale = self.last_result().is_none_or(|r| r.x != x);
            if stale {
                self.calculate(x)?;
            }
        }
        let labels = match phase {
            Some(label) => vec![label.to_string()],
            None => self.phase_labels(),
        };
        let result = self.last_result();
        Ok(labels
            .into_iter()
            .map(|label| {
                let list = result
                    .and_then(|r| r.phase(&label))
                    .map(|p| p.reflections.clone())
                    .unwrap_or_default();
                (label, list)
            })
            .collect())
    }
}

/// Caller-side model shared by all adapters: registered phases in insertion order,
/// instrument, background and the last result record.
#[derive(Debug, Clone, Default)]
pub struct ModelState {
    experiment: ExperimentType,
    phases: Vec<Phase>,
    pattern: Pattern,
    background: Background,
    last: Option<CalcResult>,
}

impl ModelState {
    /// An empty model for `ty`, after checking that `engine` can handle it.
    pub fn for_engine(engine: EngineId, ty: ExperimentType) -> Result<Self, CalcError> {
        if !capability::supports(engine, &ty) {
            return Err(CalcError::NoCapableEngine(ty));
        }
        Ok(Self {
            experiment: ty,
            ..Self::default()
        })
    }

    pub fn experiment_type(&self) -> ExperimentType {
        self.experiment
    }

    pub fn beam(&self) -> BeamMode {
        self.experiment.beam()
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn labels(&self) -> Vec<String> {
        self.phases.iter().map(|p| p.label.clone()).collect()
    }

    pub fn phase(&self, label: &str) -> Result<&Phase, CalcError> {
        self.phases
            .iter()
            .find(|p| p.label == label)
            .ok_or_else(|| CalcError::UnknownPhase(label.to_string()))
    }

    fn phase_mut(&mut self, label: &str) -> Result<&mut Phase, CalcError> {
        self.phases
            .iter_mut()
            .find(|p| p.label == label)
            .ok_or_else(|| CalcError::UnknownPhase(label.to_string()))
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn phase_scale(&self, label: &str) -> f64 {
        self.phase(label).map(|p| p.scale.value).unwrap_or(1.0)
    }

    pub fn last_result(&self) -> Option<&CalcResult> {
        self.last.as_ref()
    }

    pub fn add_phase(&mut self, phase: &Phase) -> Result<(), CalcError> {
        if self.phases.iter().any(|p| p.label == phase.label) {
            return Err(CalcError::DuplicatePhase(phase.label.clone()));
        }
        phase.validate()?;
        SpaceGroup::from_setting(&phase.space_group)?;
        self.phases.push(phase.clone());
        Ok(())
    }

    pub fn remove_phase(&mut self, label: &str) -> Result<Phase, CalcError> {
        let index = self
            .phases
            .iter()
            .position(|p| p.label == label)
            .ok_or_else(|| CalcError::UnknownPhase(label.to_string()))?;
        Ok(self.phases.remove(index))
    }

    pub fn add_atom(&mut self, phase: &str, atom: &AtomSite) -> Result<(), CalcError> {
        let target = self.phase_mut(phase)?;
        if target.atom(&atom.label).is_some() {
            return Err(CalcError::DuplicateAtom {
                phase: phase.to_string(),
                atom: atom.label.clone(),
            });
        }
        atom.validate()?;
        target.atoms.push(atom.clone());
        Ok(())
    }

    pub fn remove_atom(&mut self, phase: &str, atom: &str) -> Result<AtomSite, CalcError> {
        let target = self.phase_mut(phase)?;
        let index = target
            .atom_index(atom)
            .ok_or_else(|| CalcError::UnknownAtom {
                phase: phase.to_string(),
                atom: atom.to_string(),
            })?;
        Ok(target.atoms.remove(index))
    }

    pub fn set_space_group(
        &mut self,
        phase: &str,
        setting: &SpaceGroupSetting,
    ) -> Result<SpaceGroup, CalcError> {
        self.phase(phase)?;
        let group = SpaceGroup::from_setting(setting)?;
        self.phase_mut(phase)?.space_group = setting.clone();
        Ok(group)
    }

    pub fn set_pattern(&mut self, pattern: &Pattern) -> Result<(), CalcError> {
        pattern.validate()?;
        self.pattern = pattern.clone();
        Ok(())
    }

    /// Applies every value or none of them.
    pub fn update_resolution(&mut self, values: &[(String, Measured)]) -> Result<(), CalcError> {
        let mut pattern = self.pattern.clone();
        for (key, value) in values {
            pattern.set_profile_parameter(self.beam(), key, *value)?;
        }
        pattern.validate()?;
        self.pattern = pattern;
        Ok(())
    }

    pub fn set_background(&mut self, background: &Background) {
        self.background = background.clone();
    }

    pub fn set_phase_scale(&mut self, phase: &str, scale: f64) -> Result<(), CalcError> {
        let target = self.phase_mut(phase)?;
        validate_scale(phase, scale)?;
        target.scale = Measured::new(scale);
        Ok(())
    }

    /// The grid handed to the engine: constant-wavelength grids are shifted by the
    /// instrument zero, time-of-flight grids pass through unchanged.
    pub fn engine_grid(&self, x: &[f64]) -> Vec<f64> {
        match self.beam() {
            BeamMode::ConstantWavelength => {
                let zero = self.pattern.cw.zero_shift.value;
                x.iter().map(|v| v + zero).collect()
            }
            BeamMode::TimeOfFlight => x.to_vec(),
        }
    }

    /// Moves reflection positions from the engine grid back onto the caller's grid, so
    /// listed reflections line up with the peaks of the returned profile.
    pub fn caller_reflections(&self, mut reflections: ReflectionList) -> ReflectionList {
        if matches!(self.beam(), BeamMode::ConstantWavelength) {
            let zero = self.pattern.cw.zero_shift.value;
            reflections.coord.iter_mut().for_each(|c| *c -= zero);
        }
        reflections
    }

    pub fn store_result(&mut self, result: CalcResult) -> &CalcResult {
        self.last.insert(result)
    }
}

/// Checks that a calculation grid is finite and strictly ascending. Empty and
/// single-point grids are accepted.
pub fn validate_grid(x: &[f64]) -> Result<(), CalcError> {
    if let Some(bad) = x.iter().find(|v| !v.is_finite()) {
        return Err(CalcError::InvalidGrid(format!("grid contains {bad}")));
    }
    if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
        return Err(CalcError::InvalidGrid(format!(
            "grid is not strictly ascending at index {}",
            i + 1
        )));
    }
    Ok(())
}

/// Linear interpolation of values sampled on the uniform grid `start + i·step`,
/// clamped to the end samples outside the sampled span.
pub(crate) fn interpolate_uniform(start: f64, step: f64, values: &[f64], at: f64) -> f64 {
    let (Some(&first), Some(&last)) = (values.first(), values.last()) else {
        return 0.0;
    };
    if !(step > 0.0) {
        return first;
    }
    let position = (at - start) / step;
    if position <= 0.0 {
        return first;
    }
    let upper = values.len() - 1;
    if position >= upper as f64 {
        return last;
    }
    let i = position.floor() as usize;
    let t = position - i as f64;
    values[i] * (1.0 - t) + values[(i + 1).min(upper)] * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::phase::Cell;

    fn state() -> ModelState {
        ModelState::for_engine(EngineId::Rietveld, ExperimentType::default()).unwrap()
    }

    fn nacl() -> Phase {
        Phase::new("NaCl", Cell::cubic(5.64), SpaceGroupSetting::new("F m -3 m"))
            .with_atom(AtomSite::new("Na", "Na", [0.0, 0.0, 0.0]))
    }

    #[test]
    fn grids_must_be_strictly_ascending() {
        assert!(validate_grid(&[]).is_ok());
        assert!(validate_grid(&[5.0]).is_ok());
        assert!(validate_grid(&[1.0, 2.0, 3.0]).is_ok());
        assert!(matches!(
            validate_grid(&[1.0, 1.0, 2.0]),
            Err(CalcError::InvalidGrid(_))
        ));
        assert!(matches!(
            validate_grid(&[1.0, f64::NAN]),
            Err(CalcError::InvalidGrid(_))
        ));
    }

    #[test]
    fn unsupported_types_are_rejected_at_model_creation() {
        let tof = ExperimentType::parse("tof").unwrap();
        let err = ModelState::for_engine(EngineId::Simulator, tof).unwrap_err();
        assert!(matches!(err, CalcError::NoCapableEngine(_)));
    }

    #[test]
    fn duplicate_and_unknown_labels_are_reported() {
        let mut state = state();
        state.add_phase(&nacl()).unwrap();
        assert!(matches!(
            state.add_phase(&nacl()),
            Err(CalcError::DuplicatePhase(label)) if label == "NaCl"
        ));
        assert!(matches!(
            state.add_atom("NaCl", &AtomSite::new("Na", "Na", [0.5, 0.5, 0.5])),
            Err(CalcError::DuplicateAtom { .. })
        ));
        assert!(matches!(
            state.remove_atom("NaCl", "Cl"),
            Err(CalcError::UnknownAtom { .. })
        ));
        assert!(matches!(
            state.set_phase_scale("KCl", 2.0),
            Err(CalcError::UnknownPhase(_))
        ));
    }

    #[test]
    fn failed_space_group_change_keeps_the_old_setting() {
        let mut state = state();
        state.add_phase(&nacl()).unwrap();
        let err = state
            .set_space_group("NaCl", &SpaceGroupSetting::new("X 9 9"))
            .unwrap_err();
        assert!(matches!(err, CalcError::Symmetry(_)));
        assert_eq!(state.phase("NaCl").unwrap().space_group.hm_symbol, "F m -3 m");
    }

    #[test]
    fn resolution_updates_are_all_or_nothing() {
        let mut state = state();
        let values = vec![
            ("u".to_string(), Measured::new(0.02)),
            ("bogus".to_string(), Measured::new(1.0)),
        ];
        assert!(matches!(
            state.update_resolution(&values),
            Err(CalcError::InvalidModel(_))
        ));
        assert_eq!(state.pattern(), &Pattern::default());

        state
            .update_resolution(&[("u".to_string(), Measured::with_error(0.02, 0.001))])
            .unwrap();
        assert_eq!(state.pattern().cw.resolution.u.value, 0.02);
    }

    #[test]
    fn constant_wavelength_grids_are_zero_shifted() {
        let mut state = state();
        let mut pattern = Pattern::default();
        pattern.cw.zero_shift = Measured::new(0.1);
        state.set_pattern(&pattern).unwrap();
        assert_eq!(state.engine_grid(&[10.0, 20.0]), vec![10.1, 20.1]);

        let tof = ModelState::for_engine(EngineId::Rietveld, ExperimentType::parse("tof").unwrap())
            .unwrap();
        assert_eq!(tof.engine_grid(&[1000.0]), vec![1000.0]);
    }

    #[test]
    fn uniform_interpolation_is_linear_and_clamped() {
        let values = [0.0, 10.0, 20.0];
        assert_eq!(interpolate_uniform(1.0, 1.0, &values, 1.5), 5.0);
        assert_eq!(interpolate_uniform(1.0, 1.0, &values, 0.0), 0.0);
        assert_eq!(interpolate_uniform(1.0, 1.0, &values, 9.0), 20.0);
        assert_eq!(interpolate_uniform(1.0, 1.0, &[], 2.0), 0.0);
    }
}
