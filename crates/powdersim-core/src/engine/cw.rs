use super::adapter::{EngineAdapter, ModelState, validate_grid};
use super::capability::EngineId;
use super::config::CalculatorConfig;
use super::error::CalcError;
use super::native::{BeamSetup, CrystalModel, ExpandedSite, PowderModel, RietveldEngine};
use super::pool::{self, CancelToken, PhaseJob};
use super::progress::{Progress, ProgressReporter};
use crate::core::experiment::ExperimentType;
use crate::core::models::atom::AtomSite;
use crate::core::models::background::Background;
use crate::core::models::pattern::Pattern;
use crate::core::models::phase::{Cell, Phase, SpaceGroupSetting};
use crate::core::models::result::{CalcResult, PhaseContribution};
use crate::core::symmetry::SpaceGroup;
use crate::core::uncertainty::Measured;
use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

new_key_type! {
    pub struct ObjectKey;
}

const SETUP: &str = "setup";
const RESOLUTION: &str = "resolution";
const BACKGROUND: &str = "background";
const PHASE_LIST: &str = "phase_list";
const PHASE_OBJECTS: [&str; 4] = ["crystal", "cell", "space_group", "atoms"];

fn object_name(kind: &str, label: &str) -> String {
    format!("{kind}:{label}")
}

/// A node of the engine-side object graph.
#[derive(Debug, Clone)]
enum EngineObject {
    Crystal {
        cell: ObjectKey,
        space_group: ObjectKey,
        atoms: ObjectKey,
    },
    Cell(Cell),
    SpaceGroup(SpaceGroup),
    Atoms(Vec<ExpandedSite>),
    /// Instrument geometry: wavelength and zero, or the TOF conversion constants.
    Setup(BeamSetup),
    /// Peak-shape parameters of the same beam kind as the setup.
    Resolution(BeamSetup),
    Background(Background),
    PhaseList(Vec<String>),
}

/// Named storage for engine objects.
///
/// Objects are addressed by opaque names such as `cell:<label>`; re-storing under an
/// existing name overwrites the object in place so keys held by other objects stay valid.
#[derive(Debug, Default)]
struct ObjectArena {
    objects: SlotMap<ObjectKey, EngineObject>,
    names: HashMap<String, ObjectKey>,
}

impl ObjectArena {
    fn put(&mut self, name: String, object: EngineObject) -> ObjectKey {
        if let Some(&key) = self.names.get(&name) {
            if let Some(slot) = self.objects.get_mut(key) {
                *slot = object;
                return key;
            }
        }
        let key = self.objects.insert(object);
        self.names.insert(name, key);
        key
    }

    fn get(&self, name: &str) -> Option<&EngineObject> {
        self.names.get(name).and_then(|&key| self.objects.get(key))
    }

    fn by_key(&self, key: ObjectKey) -> Option<&EngineObject> {
        self.objects.get(key)
    }

    fn remove(&mut self, name: &str) -> Option<EngineObject> {
        let key = self.names.remove(name)?;
        self.objects.remove(key)
    }

    fn clear(&mut self) {
        self.objects.clear();
        self.names.clear();
    }
}

fn missing(name: &str) -> CalcError {
    CalcError::Internal(format!("engine object '{name}' is missing"))
}

/// Adapter for Rietveld-style constant-wavelength and time-of-flight engines.
///
/// ## Overview
///
/// The adapter mirrors every registered phase into an engine-side object graph: one
/// crystal object per phase referencing its cell, space group and symmetry-expanded
/// atom list, plus shared setup, resolution, background and phase-list objects. A
/// calculation assembles one single-phase [`PowderModel`] per registered phase from that
/// graph and hands the models to the worker pool, one engine clone per task.
pub struct CwAdapter<E: RietveldEngine> {
    engine: E,
    config: CalculatorConfig,
    state: ModelState,
    arena: ObjectArena,
    current_crystal: HashMap<String, ObjectKey>,
    cancel: CancelToken,
}

impl<E: RietveldEngine + 'static> CwAdapter<E> {
    /// Creates an adapter with an empty model for `ty`.
    ///
    /// # Arguments
    ///
    /// * `engine` - The engine prototype; it is silenced and cloned for every phase task.
    /// * `ty` - The experiment type; both beam kinds of one-dimensional powder data work.
    /// * `config` - Worker pool and polling settings.
    ///
    /// # Errors
    ///
    /// Returns [`CalcError::NoCapableEngine`] for experiment types outside the Rietveld
    /// engine's capability.
    pub fn new(
        mut engine: E,
        ty: ExperimentType,
        config: CalculatorConfig,
    ) -> Result<Self, CalcError> {
        engine.silence();
        let mut adapter = Self {
            engine,
            config,
            state: ModelState::for_engine(EngineId::Rietveld, ty)?,
            arena: ObjectArena::default(),
            current_crystal: HashMap::new(),
            cancel: CancelToken::new(),
        };
        adapter.init_model();
        Ok(adapter)
    }

    fn init_model(&mut self) {
        self.arena.clear();
        self.current_crystal.clear();
        self.store_setup();
        self.store_resolution();
        self.arena.put(
            BACKGROUND.to_string(),
            EngineObject::Background(self.state.background().clone()),
        );
        self.store_phase_list();
    }

    fn store_setup(&mut self) {
        let setup = BeamSetup::from_pattern(self.state.beam(), self.state.pattern());
        self.arena.put(SETUP.to_string(), EngineObject::Setup(setup));
    }

    fn store_resolution(&mut self) {
        let resolution = BeamSetup::from_pattern(self.state.beam(), self.state.pattern());
        self.arena
            .put(RESOLUTION.to_string(), EngineObject::Resolution(resolution));
    }

    fn store_phase_list(&mut self) {
        self.arena.put(
            PHASE_LIST.to_string(),
            EngineObject::PhaseList(self.state.labels()),
        );
    }

    fn store_crystal(&mut self, phase: &Phase, space_group: SpaceGroup) {
        let label = &phase.label;
        let sites = phase
            .atoms
            .iter()
            .map(|atom| ExpandedSite::expand(atom, &space_group))
            .collect();
        let cell = self
            .arena
            .put(object_name("cell", label), EngineObject::Cell(phase.cell));
        let space_group = self.arena.put(
            object_name("space_group", label),
            EngineObject::SpaceGroup(space_group),
        );
        let atoms = self
            .arena
            .put(object_name("atoms", label), EngineObject::Atoms(sites));
        let crystal = self.arena.put(
            object_name("crystal", label),
            EngineObject::Crystal {
                cell,
                space_group,
                atoms,
            },
        );
        self.current_crystal.insert(label.clone(), crystal);
    }

    /// Re-expands the symmetry orbit of every atom of `label`.
    fn expand_atoms(&mut self, label: &str) -> Result<(), CalcError> {
        let phase = self.state.phase(label)?;
        let group_name = object_name("space_group", label);
        let Some(EngineObject::SpaceGroup(group)) = self.arena.get(&group_name) else {
            return Err(missing(&group_name));
        };
        let sites = phase
            .atoms
            .iter()
            .map(|atom| ExpandedSite::expand(atom, group))
            .collect();
        self.arena
            .put(object_name("atoms", label), EngineObject::Atoms(sites));
        Ok(())
    }

    /// The beam setup handed to the engine: geometry from the setup object, peak shape
    /// from the resolution object.
    fn beam_setup(&self) -> Result<BeamSetup, CalcError> {
        let Some(EngineObject::Setup(geometry)) = self.arena.get(SETUP) else {
            return Err(missing(SETUP));
        };
        let Some(EngineObject::Resolution(shape)) = self.arena.get(RESOLUTION) else {
            return Err(missing(RESOLUTION));
        };
        match (geometry, shape) {
            (BeamSetup::ConstantWavelength(g), BeamSetup::ConstantWavelength(s)) => {
                let mut merged = *s;
                merged.wavelength = g.wavelength;
                merged.zero_shift = g.zero_shift;
                Ok(BeamSetup::ConstantWavelength(merged))
            }
            (BeamSetup::TimeOfFlight(g), BeamSetup::TimeOfFlight(s)) => {
                let mut merged = *s;
                merged.zero = g.zero;
                merged.dtt1 = g.dtt1;
                merged.dtt2 = g.dtt2;
                merged.ttheta_bank = g.ttheta_bank;
                Ok(BeamSetup::TimeOfFlight(merged))
            }
            _ => Err(CalcError::Internal(
                "setup and resolution describe different beam kinds".to_string(),
            )),
        }
    }

    fn crystal_model(&self, label: &str) -> Result<CrystalModel, CalcError> {
        let crystal_name = object_name("crystal", label);
        let key = self
            .current_crystal
            .get(label)
            .copied()
            .ok_or_else(|| missing(&crystal_name))?;
        let Some(EngineObject::Crystal {
            cell,
            space_group,
            atoms,
        }) = self.arena.by_key(key)
        else {
            return Err(missing(&crystal_name));
        };
        match (
            self.arena.by_key(*cell),
            self.arena.by_key(*space_group),
            self.arena.by_key(*atoms),
        ) {
            (
                Some(EngineObject::Cell(cell)),
                Some(EngineObject::SpaceGroup(space_group)),
                Some(EngineObject::Atoms(sites)),
            ) => Ok(CrystalModel {
                label: label.to_string(),
                cell: *cell,
                space_group: space_group.clone(),
                sites: sites.clone(),
            }),
            _ => Err(missing(&crystal_name)),
        }
    }

    fn phase_jobs(&self) -> Result<Vec<PhaseJob>, CalcError> {
        let Some(EngineObject::PhaseList(labels)) = self.arena.get(PHASE_LIST) else {
            return Err(missing(PHASE_LIST));
        };
        let beam = self.beam_setup()?;
        let radiation = self.state.experiment_type().radiation();
        labels
            .iter()
            .map(|label| -> Result<PhaseJob, CalcError> {
                Ok(PhaseJob {
                    label: label.clone(),
                    model: PowderModel {
                        beam: beam.clone(),
                        radiation,
                        crystal: self.crystal_model(label)?,
                    },
                })
            })
            .collect()
    }

    /// Names of the engine objects currently held, sorted.
    pub fn object_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.arena.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<E: RietveldEngine + 'static> EngineAdapter for CwAdapter<E> {
    fn engine_id(&self) -> EngineId {
        EngineId::Rietveld
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn create_model(&mut self, ty: ExperimentType) -> Result<(), CalcError> {
        if ty == self.state.experiment_type() {
            return Ok(());
        }
        self.state = ModelState::for_engine(EngineId::Rietveld, ty)?;
        self.init_model();
        info!(experiment = %ty, "Created a new Rietveld model.");
        Ok(())
    }

    fn add_phase(&mut self, phase: &Phase) -> Result<(), CalcError> {
        let space_group = SpaceGroup::from_setting(&phase.space_group)?;
        self.state.add_phase(phase)?;
        self.store_crystal(phase, space_group);
        self.store_phase_list();
        debug!(phase = %phase.label, atoms = phase.atoms.len(), "Phase registered.");
        Ok(())
    }

    fn remove_phase(&mut self, label: &str) -> Result<(), CalcError> {
        self.state.remove_phase(label)?;
        for kind in PHASE_OBJECTS {
            self.arena.remove(&object_name(kind, label));
        }
        self.current_crystal.remove(label);
        self.store_phase_list();
        Ok(())
    }

    fn add_atom(&mut self, phase: &str, atom: &AtomSite) -> Result<(), CalcError> {
        self.state.add_atom(phase, atom)?;
        self.expand_atoms(phase)
    }

    fn remove_atom(&mut self, phase: &str, atom: &str) -> Result<(), CalcError> {
        self.state.remove_atom(phase, atom)?;
        self.expand_atoms(phase)
    }

    fn set_space_group(
        &mut self,
        phase: &str,
        setting: &SpaceGroupSetting,
    ) -> Result<(), CalcError> {
        let group = self.state.set_space_group(phase, setting)?;
        self.arena.put(
            object_name("space_group", phase),
            EngineObject::SpaceGroup(group),
        );
        self.expand_atoms(phase)
    }

    fn set_pattern(&mut self, pattern: &Pattern) -> Result<(), CalcError> {
        self.state.set_pattern(pattern)?;
        self.store_setup();
        self.store_resolution();
        Ok(())
    }

    fn update_resolution(&mut self, values: &[(String, Measured)]) -> Result<(), CalcError> {
        self.state.update_resolution(values)?;
        self.store_resolution();
        Ok(())
    }

    fn set_background(&mut self, background: &Background) -> Result<(), CalcError> {
        self.state.set_background(background);
        self.arena.put(
            BACKGROUND.to_string(),
            EngineObject::Background(background.clone()),
        );
        Ok(())
    }

    fn set_phase_scale(&mut self, phase: &str, scale: f64) -> Result<(), CalcError> {
        self.state.set_phase_scale(phase, scale)
    }

    fn cancel_token(&self) -> Option<CancelToken> {
        Some(self.cancel.clone())
    }

    #[instrument(skip_all, name = "rietveld_calculation")]
    fn calculate_with(
        &mut self,
        x: &[f64],
        reporter: &ProgressReporter<'_>,
    ) -> Result<&CalcResult, CalcError> {
        validate_grid(x)?;
        let grid = self.state.engine_grid(x);
        let jobs = self.phase_jobs()?;
        let background = match self.arena.get(BACKGROUND) {
            Some(EngineObject::Background(background)) => background.evaluate(&grid),
            _ => vec![0.0; grid.len()],
        };

        info!(
            phases = jobs.len(),
            points = grid.len(),
            tof = self.state.experiment_type().is_tof(),
            "Calculating Rietveld pattern."
        );
        reporter.report(Progress::CalculationStart {
            engine: EngineId::Rietveld,
            phases: jobs.len() as u64,
        });

        let labels: Vec<String> = jobs.iter().map(|job| job.label.clone()).collect();
        let profiles = pool::run_phases(
            &self.engine,
            jobs,
            &grid,
            &self.config,
            &self.cancel,
            reporter,
        )?;

        let contributions = labels
            .into_iter()
            .zip(profiles)
            .map(|(label, profile)| {
                let scale = self.state.phase_scale(&label);
                PhaseContribution {
                    profile: profile.intensity.iter().map(|p| scale * p).collect(),
                    reflections: self.state.caller_reflections(profile.reflections),
                    label,
                    scale,
                }
            })
            .collect();
        let result = CalcResult::assemble(
            x.to_vec(),
            background,
            contributions,
            self.state.pattern().global_scale(),
        );

        reporter.report(Progress::CalculationFinish);
        Ok(self.state.store_result(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::CalculatorConfigBuilder;
    use crate::engine::native::KinematicEngine;

    fn adapter(ty: &str) -> CwAdapter<KinematicEngine> {
        CwAdapter::new(
            KinematicEngine::new(),
            ExperimentType::parse(ty).unwrap(),
            CalculatorConfig::default(),
        )
        .unwrap()
    }

    fn copper() -> Phase {
        Phase::new("Cu", Cell::cubic(3.615), SpaceGroupSetting::new("F m -3 m"))
            .with_atom(AtomSite::new("Cu1", "Cu", [0.0, 0.0, 0.0]))
    }

    fn iron() -> Phase {
        Phase::new("Fe", Cell::cubic(2.8665), SpaceGroupSetting::new("I m -3 m"))
            .with_atom(AtomSite::new("Fe1", "Fe", [0.0, 0.0, 0.0]))
    }

    fn grid(start: f64, stop: f64, points: usize) -> Vec<f64> {
        let step = (stop - start) / (points - 1) as f64;
        (0..points).map(|i| start + i as f64 * step).collect()
    }

    fn argmax(values: &[f64]) -> usize {
        values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap()
    }

    fn flat_background() -> Background {
        Background::new([(0.0, 1.0), (180.0, 1.0)]).unwrap()
    }

    #[test]
    fn registering_a_phase_creates_its_object_graph() {
        let mut adapter = adapter("xray");
        adapter.add_phase(&copper()).unwrap();
        assert_eq!(
            adapter.object_names(),
            vec![
                "atoms:Cu",
                "background",
                "cell:Cu",
                "crystal:Cu",
                "phase_list",
                "resolution",
                "setup",
                "space_group:Cu"
            ]
        );
        adapter.remove_phase("Cu").unwrap();
        assert_eq!(
            adapter.object_names(),
            vec!["background", "phase_list", "resolution", "setup"]
        );
    }

    #[test]
    fn background_only_without_phases() {
        let mut adapter = adapter("neut");
        adapter.set_pattern(&Pattern::default().with_wavelength(1.54)).unwrap();
        adapter.set_background(&flat_background()).unwrap();
        let result = adapter.calculate(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(result.total, vec![1.0, 1.0, 1.0]);
        assert!(result.phases.is_empty());
    }

    #[test]
    fn empty_phase_contributes_nothing() {
        let mut adapter = adapter("neut");
        adapter.set_background(&flat_background()).unwrap();
        adapter
            .add_phase(&Phase::new("Empty", Cell::cubic(4.0), SpaceGroupSetting::new("P m -3 m")))
            .unwrap();
        let total = adapter.calculate(&[10.0, 20.0, 30.0]).unwrap().total.clone();
        assert_eq!(total, vec![1.0, 1.0, 1.0]);
        let reflections = adapter.reflections(Some("Empty"), None).unwrap();
        assert_eq!(reflections.len(), 1);
        assert!(reflections[0].1.is_empty());
    }

    #[test]
    fn total_is_global_scale_times_scaled_phases_plus_background() {
        let mut adapter = adapter("xray");
        let mut pattern = Pattern::default();
        pattern.scale = Some(Measured::new(1000.0));
        adapter.set_pattern(&pattern).unwrap();
        adapter.set_background(&flat_background()).unwrap();
        adapter.add_phase(&copper()).unwrap();
        adapter.set_phase_scale("Cu", 3.0).unwrap();

        let x = grid(40.0, 46.0, 301);
        let result = adapter.calculate(&x).unwrap().clone();
        assert_eq!(result.len(), x.len());
        assert_eq!(result.global_scale, 2.0);
        for j in 0..x.len() {
            let expected = 2.0 * result.phases[0].profile[j] + result.background[j];
            assert!((result.total[j] - expected).abs() <= 1e-9 * expected.abs().max(1.0));
        }
        let peak = x[argmax(&result.total)];
        assert!((peak - 43.32).abs() < 0.05, "peak at {peak}");
    }

    #[test]
    fn zero_shift_moves_peaks_in_caller_coordinates() {
        let mut adapter = adapter("xray");
        let mut pattern = Pattern::default();
        pattern.cw.zero_shift = Measured::new(0.2);
        adapter.set_pattern(&pattern).unwrap();
        adapter.add_phase(&copper()).unwrap();
        let x = grid(40.0, 46.0, 601);
        let total = adapter.calculate(&x).unwrap().total.clone();
        let peak = x[argmax(&total)];
        assert!((peak - 43.12).abs() < 0.05, "peak at {peak}");
    }

    #[test]
    fn zero_shifted_reflections_sit_under_their_peaks() {
        let x = grid(40.0, 46.0, 601);
        let mut plain = adapter("xray");
        plain.add_phase(&copper()).unwrap();
        let unshifted = plain.calculate(&x).unwrap().phases[0].reflections.clone();

        let mut shifted = adapter("xray");
        let mut pattern = Pattern::default();
        pattern.cw.zero_shift = Measured::new(0.2);
        shifted.set_pattern(&pattern).unwrap();
        shifted.add_phase(&copper()).unwrap();
        let result = shifted.calculate(&x).unwrap();
        let peak = x[argmax(&result.total)];
        let listed = &result.phases[0].reflections;

        assert_eq!(listed.h, unshifted.h);
        for (a, b) in listed.coord.iter().zip(&unshifted.coord) {
            assert!((b - a - 0.2).abs() < 1e-9, "{a} vs {b}");
        }
        let first = listed.coord[0];
        assert!((first - peak).abs() < 0.05, "reflection at {first}, peak at {peak}");
    }

    #[test]
    fn add_then_remove_restores_the_output() {
        let mut adapter = adapter("xray");
        adapter.add_phase(&copper()).unwrap();
        let x = grid(30.0, 90.0, 241);
        let before = adapter.calculate(&x).unwrap().total.clone();
        adapter.add_phase(&iron()).unwrap();
        let with_iron = adapter.calculate(&x).unwrap().total.clone();
        assert_ne!(before, with_iron);
        adapter.remove_phase("Fe").unwrap();
        let after = adapter.calculate(&x).unwrap().total.clone();
        assert_eq!(before, after);
    }

    #[test]
    fn registration_order_does_not_change_the_total() {
        let x = grid(30.0, 90.0, 241);
        let mut forward = adapter("xray");
        forward.add_phase(&copper()).unwrap();
        forward.add_phase(&iron()).unwrap();
        let mut backward = adapter("xray");
        backward.add_phase(&iron()).unwrap();
        backward.add_phase(&copper()).unwrap();

        let a = forward.calculate(&x).unwrap().total.clone();
        let b = backward.calculate(&x).unwrap().total.clone();
        for (p, q) in a.iter().zip(&b) {
            assert!((p - q).abs() <= 1e-9 * p.abs().max(1.0));
        }
        assert_eq!(forward.phase_labels(), vec!["Cu", "Fe"]);
        assert_eq!(backward.phase_labels(), vec!["Fe", "Cu"]);
    }

    #[test]
    fn space_group_changes_re_expand_atom_orbits() {
        let mut adapter = adapter("xray");
        let phase = Phase::new("Cu", Cell::cubic(3.615), SpaceGroupSetting::new("P 1"))
            .with_atom(AtomSite::new("Cu1", "Cu", [0.0, 0.0, 0.0]));
        adapter.add_phase(&phase).unwrap();
        assert_eq!(adapter.crystal_model("Cu").unwrap().atom_count(), 1);

        adapter
            .set_space_group("Cu", &SpaceGroupSetting::new("F m -3 m"))
            .unwrap();
        assert_eq!(adapter.crystal_model("Cu").unwrap().atom_count(), 4);

        adapter
            .add_atom("Cu", &AtomSite::new("Cu2", "Cu", [0.5, 0.0, 0.0]))
            .unwrap();
        assert_eq!(adapter.crystal_model("Cu").unwrap().atom_count(), 8);
        adapter.remove_atom("Cu", "Cu2").unwrap();
        assert_eq!(adapter.crystal_model("Cu").unwrap().atom_count(), 4);
    }

    #[test]
    fn failed_calculation_keeps_the_previous_result() {
        let mut adapter = adapter("xray");
        adapter.add_phase(&copper()).unwrap();
        let x = grid(40.0, 46.0, 61);
        let first = adapter.calculate(&x).unwrap().clone();
        let err = adapter.calculate(&[3.0, 2.0, 1.0]).unwrap_err();
        assert!(matches!(err, CalcError::InvalidGrid(_)));
        assert_eq!(adapter.last_result(), Some(&first));
    }

    #[test]
    fn engine_failures_leave_state_unchanged() {
        let mut adapter = adapter("xray");
        adapter.add_phase(&copper()).unwrap();
        let x = grid(40.0, 46.0, 61);
        let first = adapter.calculate(&x).unwrap().clone();

        adapter
            .update_resolution(&[("w".to_string(), Measured::new(-1.0))])
            .unwrap();
        let err = adapter.calculate(&x).unwrap_err();
        assert!(
            matches!(&err, CalcError::EngineCalcFailed { phase, .. } if phase == "Cu"),
            "unexpected error {err:?}"
        );
        assert_eq!(adapter.last_result(), Some(&first));
    }

    #[test]
    fn resolution_updates_change_peak_widths() {
        let mut adapter = adapter("xray");
        adapter.add_phase(&copper()).unwrap();
        let x = grid(40.0, 46.0, 601);
        let narrow = adapter.calculate(&x).unwrap().total.clone();
        adapter
            .update_resolution(&[("w".to_string(), Measured::new(0.09))])
            .unwrap();
        let broad = adapter.calculate(&x).unwrap().total.clone();
        let peak = argmax(&narrow);
        assert!(broad[peak] < narrow[peak]);
        assert!(matches!(
            adapter.update_resolution(&[("sigma1".to_string(), Measured::new(1.0))]),
            Err(CalcError::InvalidModel(_))
        ));
    }

    #[test]
    fn time_of_flight_models_use_the_tof_setup() {
        let mut adapter = adapter("tof");
        assert!(adapter.is_tof());
        adapter.add_phase(&copper()).unwrap();
        let d111 = 3.615 / 3.0f64.sqrt();
        let x = grid(19_000.0, 23_000.0, 801);
        let result = adapter.calculate(&x).unwrap();
        let peak = x[argmax(&result.total)];
        assert!((peak - 10_000.0 * d111).abs() < 20.0, "peak at {peak}");
        assert!(result.phases[0].reflections.iter().any(|r| r.hkl == [1, 1, 1]));
    }

    #[test]
    fn changing_the_experiment_type_discards_the_model() {
        let mut adapter = adapter("xray");
        adapter.add_phase(&copper()).unwrap();
        adapter.create_model(ExperimentType::parse("xray").unwrap()).unwrap();
        assert_eq!(adapter.phase_labels(), vec!["Cu"]);

        adapter.create_model(ExperimentType::parse("tof").unwrap()).unwrap();
        assert!(adapter.phase_labels().is_empty());
        assert!(adapter.is_tof());
        assert!(matches!(
            adapter.create_model(ExperimentType::parse("sc").unwrap()),
            Err(CalcError::NoCapableEngine(_))
        ));
    }

    #[test]
    fn reflections_recalculate_for_a_new_grid() {
        let mut adapter = adapter("xray");
        adapter.add_phase(&copper()).unwrap();
        let none = adapter.reflections(None, None).unwrap();
        assert_eq!(none.len(), 1);
        assert!(none[0].1.is_empty());

        let x = grid(40.0, 52.0, 121);
        let listed = adapter.reflections(None, Some(&x)).unwrap();
        let hkls: Vec<[i32; 3]> = listed[0].1.iter().map(|r| r.hkl).collect();
        assert_eq!(hkls.len(), 2);
        assert!(matches!(
            adapter.reflections(Some("Fe"), None),
            Err(CalcError::UnknownPhase(_))
        ));
    }

    #[test]
    fn sequential_and_parallel_runs_agree() {
        let x = grid(30.0, 90.0, 121);
        let mut sequential = CwAdapter::new(
            KinematicEngine::new(),
            ExperimentType::parse("xray").unwrap(),
            CalculatorConfigBuilder::new().parallel(false).build().unwrap(),
        )
        .unwrap();
        let mut parallel = adapter("xray");
        let adapters: [&mut dyn EngineAdapter; 2] = [&mut sequential, &mut parallel];
        for adapter in adapters {
            adapter.add_phase(&copper()).unwrap();
            adapter.add_phase(&iron()).unwrap();
        }
        let a = sequential.calculate(&x).unwrap().clone();
        let b = parallel.calculate(&x).unwrap().clone();
        assert_eq!(a, b);
    }
}
