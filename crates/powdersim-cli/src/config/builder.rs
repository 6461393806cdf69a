use super::file::{FileGrid, FileJob};
use super::models::SimulationJob;
use crate::cli::SimulateArgs;
use crate::error::{CliError, Result};
use powdersim::core::experiment::ExperimentType;
use powdersim::core::io::cif::{
    CifDocument, CifError, background_from_block, measured_from_block, pattern_from_block,
    phase_from_block,
};
use powdersim::core::models::background::Background;
use powdersim::core::models::pattern::Pattern;
use powdersim::core::models::phase::Phase;
use powdersim::engine::error::CalcError;
use std::path::Path;
use tracing::{debug, info};

pub fn build_job(args: &SimulateArgs, threads: Option<usize>) -> Result<SimulationJob> {
    validate_args(args, threads)?;
    let file = FileJob::from_file(&args.job)?;
    resolve_job(file, args, threads)
}

/// Rejects command-line combinations that no job file can make valid.
fn validate_args(args: &SimulateArgs, threads: Option<usize>) -> Result<()> {
    if threads == Some(0) {
        return Err(CliError::Argument(
            "--threads must be at least 1".to_string(),
        ));
    }
    for (index, engine) in args.engines.iter().enumerate() {
        if args.engines[..index].contains(engine) {
            return Err(CliError::Argument(format!(
                "--engine {} is given more than once",
                engine
            )));
        }
    }
    if args.reflections.as_ref() == Some(&args.output) {
        return Err(CliError::Argument(
            "--reflections and --output must name different files".to_string(),
        ));
    }
    Ok(())
}

fn resolve_job(
    file: FileJob,
    args: &SimulateArgs,
    threads: Option<usize>,
) -> Result<SimulationJob> {
    let experiment = match args.experiment.as_deref().or(file.experiment.as_deref()) {
        Some(text) => ExperimentType::parse(text)?,
        None => ExperimentType::default(),
    };

    let mut calculator = file.calculator.unwrap_or_default();
    if !args.engines.is_empty() {
        calculator.preference = args.engines.clone();
    }
    if threads.is_some() {
        calculator.max_workers = threads;
    }
    if args.sequential {
        calculator.parallel = false;
    }
    calculator.validate()?;

    let mut phases = Vec::new();
    for path in &file.phases {
        phases.extend(read_phases(path)?);
    }
    for (label, scale) in &file.phase_scales {
        let phase = phases
            .iter_mut()
            .find(|p| &p.label == label)
            .ok_or_else(|| {
                CliError::Config(format!("'phase-scales' names unknown phase '{}'", label))
            })?;
        phase.scale.value = *scale;
    }

    let instrument = file
        .instrument
        .as_deref()
        .map(|path| read_cif(path).map(|doc| (path, doc)))
        .transpose()?;

    let pattern = match (file.pattern, &instrument) {
        (Some(pattern), _) => pattern,
        (None, Some((path, doc))) => doc
            .first_block()
            .and_then(pattern_from_block)
            .map_err(|e| CliError::cif(*path, e))?,
        (None, None) => Pattern::default(),
    };

    let background = match (file.background, &instrument) {
        (Some(points), _) => Background::new(points.into_iter().map(|[x, y]| (x, y)))
            .map_err(CalcError::from)?,
        (None, Some((path, doc))) => doc
            .first_block()
            .and_then(background_from_block)
            .map_err(|e| CliError::cif(*path, e))?,
        (None, None) => Background::default(),
    };

    let grid = match file.grid {
        Some(grid) => resolve_grid(&grid)?,
        None => {
            return Err(CliError::Config(
                "The job file has no [grid] table".to_string(),
            ));
        }
    };

    info!(
        experiment = %experiment,
        phases = phases.len(),
        points = grid.len(),
        "Job resolved."
    );
    Ok(SimulationJob {
        experiment,
        calculator,
        phases,
        pattern,
        background,
        grid,
    })
}

fn read_cif(path: &Path) -> Result<CifDocument> {
    CifDocument::read_from_path(path).map_err(|e| CliError::cif(path, e))
}

/// Reads every data block of a structure file as a phase.
fn read_phases(path: &Path) -> Result<Vec<Phase>> {
    let doc = read_cif(path)?;
    if doc.blocks.is_empty() {
        return Err(CliError::cif(path, CifError::NoDataBlock));
    }
    let phases = doc
        .blocks
        .iter()
        .map(phase_from_block)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| CliError::cif(path, e))?;
    debug!("Read {} phase(s) from {:?}", phases.len(), path);
    Ok(phases)
}

fn resolve_grid(grid: &FileGrid) -> Result<Vec<f64>> {
    if let Some(path) = &grid.measured {
        if grid.start.is_some() || grid.stop.is_some() || grid.points.is_some() {
            return Err(CliError::Config(
                "[grid] takes either 'measured' or 'start'/'stop'/'points', not both".to_string(),
            ));
        }
        let doc = read_cif(path)?;
        let measured = doc
            .first_block()
            .and_then(measured_from_block)
            .map_err(|e| CliError::cif(path, e))?;
        return Ok(measured.x);
    }

    let (Some(start), Some(stop), Some(points)) = (grid.start, grid.stop, grid.points) else {
        return Err(CliError::Config(
            "[grid] needs 'start', 'stop' and 'points'".to_string(),
        ));
    };
    linear_grid(start, stop, points)
}

fn linear_grid(start: f64, stop: f64, points: usize) -> Result<Vec<f64>> {
    match points {
        0 => Ok(Vec::new()),
        1 => Ok(vec![start]),
        _ if stop > start => {
            let step = (stop - start) / (points - 1) as f64;
            Ok((0..points).map(|i| start + i as f64 * step).collect())
        }
        _ => Err(CliError::Config(format!(
            "[grid] stop ({}) must be greater than start ({})",
            stop, start
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powdersim::engine::capability::EngineId;
    use std::fs;
    use std::path::PathBuf;

    const COPPER: &str = "data_Cu\n_cell_length_a 3.615\n_cell_length_b 3.615\n_cell_length_c 3.615\n_cell_angle_alpha 90\n_cell_angle_beta 90\n_cell_angle_gamma 90\n_symmetry_space_group_name_H-M 'F m -3 m'\nloop_\n_atom_site_label\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\nCu1 0 0 0\n";

    const INSTRUMENT: &str = "data_instr\n_diffrn_radiation_wavelength 1.54\nloop_\n_pd_background_line_segment_X\n_pd_background_line_segment_intensity\n0 1\n180 1\n";

    fn args(job: PathBuf) -> SimulateArgs {
        SimulateArgs {
            job,
            output: PathBuf::from("out.csv"),
            reflections: None,
            experiment: None,
            engines: Vec::new(),
            sequential: false,
        }
    }

    fn write_job(dir: &Path, body: &str) -> PathBuf {
        fs::write(dir.join("cu.cif"), COPPER).unwrap();
        fs::write(dir.join("instr.cif"), INSTRUMENT).unwrap();
        let path = dir.join("job.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn job_is_resolved_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_job(
            dir.path(),
            "experiment = \"xray\"\nphases = [\"cu.cif\"]\ninstrument = \"instr.cif\"\n[phase-scales]\nCu = 0.25\n[grid]\nstart = 10.0\nstop = 20.0\npoints = 11\n",
        );

        let job = build_job(&args(path), None).unwrap();
        assert_eq!(job.experiment.to_string(), "pd-cwl-unp-1d-xray");
        assert_eq!(job.phases.len(), 1);
        assert_eq!(job.phases[0].label, "Cu");
        assert_eq!(job.phases[0].scale.value, 0.25);
        assert_eq!(job.pattern.cw.wavelength.value, 1.54);
        assert_eq!(job.background.points(), &[(0.0, 1.0), (180.0, 1.0)]);
        assert_eq!(job.grid.len(), 11);
        assert!((job.grid[1] - 11.0).abs() < 1e-12);
        assert_eq!(job.grid[10], 20.0);
    }

    #[test]
    fn command_line_overrides_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_job(
            dir.path(),
            "experiment = \"xray\"\nbackground = [[0.0, 2.0], [10.0, 2.0]]\ninstrument = \"instr.cif\"\n[grid]\nstart = 0.0\nstop = 1.0\npoints = 2\n[calculator]\npreference = [\"rietveld\"]\n",
        );
        let mut args = args(path);
        args.experiment = Some("tof".to_string());
        args.engines = vec![EngineId::Simulator, EngineId::Rietveld];
        args.sequential = true;

        let job = build_job(&args, Some(3)).unwrap();
        assert_eq!(job.experiment.to_string(), "pd-tof-unp-1d-neut");
        assert_eq!(
            job.calculator.preference,
            vec![EngineId::Simulator, EngineId::Rietveld]
        );
        assert_eq!(job.calculator.max_workers, Some(3));
        assert!(!job.calculator.parallel);
        assert_eq!(job.background.points(), &[(0.0, 2.0), (10.0, 2.0)]);
    }

    #[test]
    fn contradictory_arguments_are_rejected_before_the_file_is_read() {
        let missing = PathBuf::from("does-not-exist.toml");
        assert!(matches!(
            build_job(&args(missing.clone()), Some(0)),
            Err(CliError::Argument(_))
        ));

        let mut repeated = args(missing.clone());
        repeated.engines = vec![EngineId::Pdf, EngineId::Rietveld, EngineId::Pdf];
        assert!(matches!(build_job(&repeated, None), Err(CliError::Argument(_))));

        let mut clash = args(missing);
        clash.reflections = Some(clash.output.clone());
        assert!(matches!(build_job(&clash, None), Err(CliError::Argument(_))));
    }

    #[test]
    fn missing_grid_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_job(dir.path(), "phases = [\"cu.cif\"]\n");
        assert!(matches!(build_job(&args(path), None), Err(CliError::Config(_))));
    }

    #[test]
    fn scale_for_unknown_phase_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_job(
            dir.path(),
            "phases = [\"cu.cif\"]\n[phase-scales]\nNi = 1.0\n[grid]\nstart = 0.0\nstop = 1.0\npoints = 2\n",
        );
        assert!(matches!(build_job(&args(path), None), Err(CliError::Config(_))));
    }

    #[test]
    fn broken_structure_file_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_job(
            dir.path(),
            "phases = [\"broken.cif\"]\n[grid]\nstart = 0.0\nstop = 1.0\npoints = 2\n",
        );
        fs::write(dir.path().join("broken.cif"), "data_x\n_cell_length_a 1.0\n").unwrap();
        match build_job(&args(path), None) {
            Err(CliError::FileParsing { path, .. }) => {
                assert_eq!(path, dir.path().join("broken.cif"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn linear_grid_edge_cases() {
        assert!(linear_grid(0.0, 1.0, 0).unwrap().is_empty());
        assert_eq!(linear_grid(5.0, 1.0, 1).unwrap(), vec![5.0]);
        assert!(linear_grid(5.0, 1.0, 3).is_err());
    }

    #[test]
    fn measured_grid_excludes_generated_grid() {
        let grid = FileGrid {
            start: Some(1.0),
            measured: Some(PathBuf::from("data.cif")),
            ..FileGrid::default()
        };
        assert!(matches!(resolve_grid(&grid), Err(CliError::Config(_))));
    }
}
