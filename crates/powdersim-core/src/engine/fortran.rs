use super::adapter::{EngineAdapter, ModelState, interpolate_uniform, validate_grid};
use super::capability::EngineId;
use super::config::CalculatorConfig;
use super::error::CalcError;
use super::native::{EngineFault, JobInfo, PowderSimulator, SimReflection};
use super::progress::{Progress, ProgressReporter};
use crate::core::experiment::{ExperimentType, Radiation};
use crate::core::io::cif::write_phase_cif;
use crate::core::models::atom::AtomSite;
use crate::core::models::background::Background;
use crate::core::models::pattern::Pattern;
use crate::core::models::phase::{Phase, SpaceGroupSetting};
use crate::core::models::reflection::{Reflection, ReflectionList};
use crate::core::models::result::{CalcResult, PhaseContribution};
use crate::core::uncertainty::Measured;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, instrument, warn};

/// Describes a simulator run over the uniform span of `grid`.
///
/// The grid must hold at least two points; its first and last values become the
/// 2θ range and the step is `(last − first) / (n − 1)`.
pub fn job_info(
    grid: &[f64],
    pattern: &Pattern,
    radiation: Radiation,
) -> Result<JobInfo, CalcError> {
    let (Some(&first), Some(&last)) = (grid.first(), grid.last()) else {
        return Err(too_short(grid.len()));
    };
    let points = grid.len();
    if points < 2 {
        return Err(too_short(points));
    }
    let res = &pattern.cw.resolution;
    Ok(JobInfo {
        range_2theta: (first, last),
        theta_step: (last - first) / (points - 1) as f64,
        points,
        wavelength: pattern.cw.wavelength.value,
        u: res.u.value,
        v: res.v.value,
        w: res.w.value,
        x: res.x.value,
        y: res.y.value,
        radiation,
    })
}

fn too_short(points: usize) -> CalcError {
    CalcError::InvalidGrid(format!(
        "the simulator needs at least two grid points, got {points}"
    ))
}

/// Keeps file names portable whatever the phase label contains.
fn file_stem(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Adapter for CIF-driven powder-pattern simulators.
///
/// Every calculation writes one structure file per phase into a temporary directory,
/// discovers them again by glob, and runs the simulator on each file over the uniform
/// span of the caller's grid. The simulated patterns are interpolated back onto the
/// caller's grid.
pub struct FortranAdapter<S: PowderSimulator> {
    simulator: S,
    config: CalculatorConfig,
    state: ModelState,
}

impl<S: PowderSimulator> FortranAdapter<S> {
    pub fn new(
        mut simulator: S,
        ty: ExperimentType,
        config: CalculatorConfig,
    ) -> Result<Self, CalcError> {
        simulator.silence();
        Ok(Self {
            simulator,
            config,
            state: ModelState::for_engine(EngineId::Simulator, ty)?,
        })
    }

    /// Writes the transient structure files, returning them in phase order.
    fn write_structures(&self, dir: &Path) -> Result<Vec<PathBuf>, CalcError> {
        let job = &self.config.job_name;
        for (index, phase) in self.state.phases().iter().enumerate() {
            let name = format!("{job}_{index:04}_{}.cif", file_stem(&phase.label));
            write_phase_cif(phase, dir.join(name))?;
        }

        let dir_text = dir.to_string_lossy();
        let pattern = format!("{}/{job}_*.cif", glob::Pattern::escape(&dir_text));
        let mut files = glob::glob(&pattern)
            .map_err(|e| CalcError::Internal(format!("invalid structure file pattern: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CalcError::Internal(format!("cannot list structure files: {e}")))?;
        files.sort();

        let expected = self.state.phases().len();
        if files.len() != expected {
            return Err(CalcError::Internal(format!(
                "expected {expected} structure files, found {}",
                files.len()
            )));
        }
        Ok(files)
    }

    fn simulate(
        &mut self,
        path: &Path,
        job: &JobInfo,
    ) -> Result<(Vec<SimReflection>, Vec<f64>), EngineFault> {
        let crystal = self.simulator.load_cif(path)?;
        let reflections = self.simulator.reflections(&crystal, job)?;
        let pattern = self.simulator.pattern(&crystal, &reflections, job)?;
        if pattern.len() != job.points {
            return Err(EngineFault::LengthMismatch {
                expected: job.points,
                found: pattern.len(),
            });
        }
        if pattern.iter().any(|v| !v.is_finite()) {
            return Err(EngineFault::NonFinite);
        }
        Ok((reflections, pattern))
    }
}

/// Converts simulator reflections to 2θ positions in degrees; reflections beyond the
/// diffraction limit are dropped.
fn reflection_list(reflections: &[SimReflection], wavelength: f64) -> ReflectionList {
    let mut list: ReflectionList = reflections
        .iter()
        .filter_map(|r| {
            let sin_theta = r.stl * wavelength;
            (sin_theta < 1.0).then(|| Reflection {
                hkl: r.hkl,
                coord: 2.0 * sin_theta.asin().to_degrees(),
                multiplicity: r.multiplicity,
            })
        })
        .collect();
    list.sort_by_coord();
    list
}

impl<S: PowderSimulator> EngineAdapter for FortranAdapter<S> {
    fn engine_id(&self) -> EngineId {
        EngineId::Simulator
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn create_model(&mut self, ty: ExperimentType) -> Result<(), CalcError> {
        if ty != self.state.experiment_type() {
            self.state = ModelState::for_engine(EngineId::Simulator, ty)?;
        }
        Ok(())
    }

    fn add_phase(&mut self, phase: &Phase) -> Result<(), CalcError> {
        self.state.add_phase(phase)
    }

    fn remove_phase(&mut self, label: &str) -> Result<(), CalcError> {
        self.state.remove_phase(label).map(drop)
    }

    fn add_atom(&mut self, phase: &str, atom: &AtomSite) -> Result<(), CalcError> {
        self.state.add_atom(phase, atom)
    }

    fn remove_atom(&mut self, phase: &str, atom: &str) -> Result<(), CalcError> {
        self.state.remove_atom(phase, atom).map(drop)
    }

    fn set_space_group(
        &mut self,
        phase: &str,
        setting: &SpaceGroupSetting,
    ) -> Result<(), CalcError> {
        self.state.set_space_group(phase, setting).map(drop)
    }

    fn set_pattern(&mut self, pattern: &Pattern) -> Result<(), CalcError> {
        self.state.set_pattern(pattern)
    }

    fn update_resolution(&mut self, values: &[(String, Measured)]) -> Result<(), CalcError> {
        self.state.update_resolution(values)
    }

    fn set_background(&mut self, background: &Background) -> Result<(), CalcError> {
        self.state.set_background(background);
        Ok(())
    }

    fn set_phase_scale(&mut self, phase: &str, scale: f64) -> Result<(), CalcError> {
        self.state.set_phase_scale(phase, scale)
    }

    #[instrument(skip_all, name = "simulator_calculation")]
    fn calculate_with(
        &mut self,
        x: &[f64],
        reporter: &ProgressReporter<'_>,
    ) -> Result<&CalcResult, CalcError> {
        validate_grid(x)?;
        if self.state.phases().is_empty() {
            return Err(CalcError::NoPhases);
        }
        let grid = self.state.engine_grid(x);
        let radiation = self.state.experiment_type().radiation();
        let job = job_info(&grid, self.state.pattern(), radiation)?;
        let background = self.state.background().evaluate(&grid);

        let phases = self.state.phases().len();
        info!(phases, points = job.points, "Running powder simulator.");
        reporter.report(Progress::CalculationStart {
            engine: EngineId::Simulator,
            phases: phases as u64,
        });

        let dir = tempfile::Builder::new().prefix("powdersim-").tempdir()?;
        let outcome = self.simulate_all(&dir, &job, &grid, reporter);
        let path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            warn!(path = %path.display(), error = %e, "Failed to remove transient structure files.");
        }
        let contributions = outcome?;

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

impl<S: PowderSimulator> FortranAdapter<S> {
    fn simulate_all(
        &mut self,
        dir: &TempDir,
        job: &JobInfo,
        grid: &[f64],
        reporter: &ProgressReporter<'_>,
    ) -> Result<Vec<PhaseContribution>, CalcError> {
        let files = self.write_structures(dir.path())?;
        let phases: Vec<(String, f64)> = self
            .state
            .phases()
            .iter()
            .map(|p| (p.label.clone(), p.scale.value))
            .collect();

        let mut contributions = Vec::with_capacity(phases.len());
        for ((label, scale), path) in phases.into_iter().zip(&files) {
            debug!(phase = %label, file = %path.display(), "Simulating phase.");
            let (reflections, pattern) = self
                .simulate(path, job)
                .map_err(|cause| CalcError::engine(&label, cause))?;
            let profile = grid
                .iter()
                .map(|&at| {
                    scale * interpolate_uniform(job.range_2theta.0, job.theta_step, &pattern, at)
                })
                .collect();
            reporter.report(Progress::PhaseComputed {
                label: label.clone(),
            });
            contributions.push(PhaseContribution {
                reflections: self
                    .state
                    .caller_reflections(reflection_list(&reflections, job.wavelength)),
                label,
                scale,
                profile,
            });
        }
        Ok(contributions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::phase::Cell;
    use crate::engine::native::{CrystalModel, ReferenceSimulator};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn adapter() -> FortranAdapter<ReferenceSimulator> {
        FortranAdapter::new(
            ReferenceSimulator::new(),
            ExperimentType::parse("xray").unwrap(),
            CalculatorConfig::default(),
        )
        .unwrap()
    }

    fn copper() -> Phase {
        Phase::new("Cu", Cell::cubic(3.615), SpaceGroupSetting::new("F m -3 m"))
            .with_atom(AtomSite::new("Cu1", "Cu", [0.0, 0.0, 0.0]))
    }

    /// Records the structure files it is handed and delegates to the reference simulator.
    struct RecordingSimulator {
        inner: ReferenceSimulator,
        seen: Rc<RefCell<Vec<PathBuf>>>,
    }

    impl PowderSimulator for RecordingSimulator {
        type Crystal = CrystalModel;

        fn silence(&mut self) {
            self.inner.silence();
        }

        fn load_cif(&mut self, path: &Path) -> Result<CrystalModel, EngineFault> {
            assert!(path.exists());
            self.seen.borrow_mut().push(path.to_path_buf());
            self.inner.load_cif(path)
        }

        fn reflections(
            &self,
            crystal: &CrystalModel,
            job: &JobInfo,
        ) -> Result<Vec<SimReflection>, EngineFault> {
            self.inner.reflections(crystal, job)
        }

        fn pattern(
            &self,
            crystal: &CrystalModel,
            reflections: &[SimReflection],
            job: &JobInfo,
        ) -> Result<Vec<f64>, EngineFault> {
            self.inner.pattern(crystal, reflections, job)
        }
    }

    #[test]
    fn job_info_spans_the_grid() {
        let grid: Vec<f64> = (0..11).map(|i| 10.0 + i as f64).collect();
        let job = job_info(&grid, &Pattern::default(), Radiation::XRay).unwrap();
        assert_eq!(job.range_2theta, (10.0, 20.0));
        assert_eq!(job.theta_step, 1.0);
        assert_eq!(job.points, 11);
        assert_eq!(job.w, 0.01);
    }

    #[test]
    fn short_grids_and_missing_phases_are_rejected() {
        let mut adapter = adapter();
        assert!(matches!(adapter.calculate(&[10.0, 20.0]), Err(CalcError::NoPhases)));
        adapter.add_phase(&copper()).unwrap();
        assert!(matches!(adapter.calculate(&[10.0]), Err(CalcError::InvalidGrid(_))));
        assert!(matches!(adapter.calculate(&[]), Err(CalcError::InvalidGrid(_))));
    }

    #[test]
    fn time_of_flight_is_not_supported() {
        let err = FortranAdapter::new(
            ReferenceSimulator::new(),
            ExperimentType::parse("tof").unwrap(),
            CalculatorConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, CalcError::NoCapableEngine(_)));
    }

    #[test]
    fn simulates_copper_with_scaled_profile_and_reflections() {
        let mut adapter = adapter();
        adapter.add_phase(&copper()).unwrap();
        adapter.set_phase_scale("Cu", 2.0).unwrap();
        adapter
            .set_background(&Background::new([(0.0, 5.0), (180.0, 5.0)]).unwrap())
            .unwrap();
        let x: Vec<f64> = (0..1201).map(|i| 40.0 + i as f64 * 0.01).collect();
        let result = adapter.calculate(&x).unwrap();

        assert_eq!(result.total.len(), x.len());
        let contribution = &result.phases[0];
        assert_eq!(contribution.scale, 2.0);
        for j in 0..x.len() {
            let expected = contribution.profile[j] + 5.0;
            assert!((result.total[j] - expected).abs() < 1e-9 * expected);
        }

        let coords: Vec<f64> = contribution.reflections.iter().map(|r| r.coord).collect();
        assert!((coords[0] - 43.32).abs() < 0.01, "first reflection at {}", coords[0]);
        assert!(contribution.reflections.iter().any(|r| r.hkl == [2, 0, 0]));
    }

    #[test]
    fn reflections_are_reported_on_the_caller_grid() {
        let x: Vec<f64> = (0..601).map(|i| 40.0 + i as f64 * 0.01).collect();
        let mut plain = adapter();
        plain.add_phase(&copper()).unwrap();
        let expected = plain.calculate(&x).unwrap().phases[0].reflections.clone();

        let mut shifted = adapter();
        let mut pattern = Pattern::default();
        pattern.cw.zero_shift = Measured::new(0.2);
        shifted.set_pattern(&pattern).unwrap();
        shifted.add_phase(&copper()).unwrap();
        let listed = shifted.calculate(&x).unwrap().phases[0].reflections.clone();

        assert_eq!(listed.h, expected.h);
        for (a, b) in listed.coord.iter().zip(&expected.coord) {
            assert!((b - a - 0.2).abs() < 1e-9, "{a} vs {b}");
        }
    }

    #[test]
    fn transient_files_are_named_by_job_and_removed() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let simulator = RecordingSimulator {
            inner: ReferenceSimulator::new(),
            seen: Rc::clone(&seen),
        };
        let mut adapter = FortranAdapter::new(
            simulator,
            ExperimentType::parse("xray").unwrap(),
            CalculatorConfig::default(),
        )
        .unwrap();
        adapter.add_phase(&copper()).unwrap();
        adapter
            .add_phase(&Phase::new("Cu/alt", Cell::cubic(3.6), SpaceGroupSetting::new("F m -3 m")))
            .unwrap();
        adapter.calculate(&[40.0, 41.0, 42.0]).unwrap();

        let seen = seen.borrow();
        let names: Vec<String> = seen
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["phase_0000_Cu.cif", "phase_0001_Cu_alt.cif"]);
        assert!(seen.iter().all(|p| !p.exists()));
    }

    #[test]
    fn uniform_grids_reproduce_the_simulator_pattern() {
        let mut adapter = adapter();
        adapter.add_phase(&copper()).unwrap();
        let x: Vec<f64> = (0..601).map(|i| 40.0 + i as f64 * 0.01).collect();
        let total = adapter.calculate(&x).unwrap().total.clone();

        let job = job_info(&x, &Pattern::default(), Radiation::XRay).unwrap();
        let mut simulator = ReferenceSimulator::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cu.cif");
        write_phase_cif(&copper(), &path).unwrap();
        let crystal = simulator.load_cif(&path).unwrap();
        let reflections = simulator.reflections(&crystal, &job).unwrap();
        let direct = simulator.pattern(&crystal, &reflections, &job).unwrap();

        for (a, b) in total.iter().zip(&direct) {
            assert!((a - b).abs() <= 1e-9 * b.abs().max(1.0));
        }
    }
}
