use crate::cli::SimulateArgs;
use crate::config::{SimulationJob, build_job};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use powdersim::core::io::table::{write_profile_csv_to_path, write_reflections_csv_to_path};
use powdersim::core::models::result::CalcResult;
use powdersim::engine::progress::ProgressReporter;
use powdersim::workflows::dispatcher::Dispatcher;
use tracing::{info, warn};

pub fn run(args: SimulateArgs, threads: Option<usize>, quiet: bool) -> Result<()> {
    info!("Resolving job from {:?}", &args.job);
    let job = build_job(&args, threads)?;

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let result = calculate(&job, &reporter)?;

    if result.phases.is_empty() {
        warn!("The job has no phases; the profile is the background alone.");
    }

    write_profile_csv_to_path(&result, &args.output)?;
    println!(
        "✓ Profile with {} point(s) written to: {}",
        result.len(),
        args.output.display()
    );

    if let Some(path) = &args.reflections {
        write_reflections_csv_to_path(&result, path)?;
        let count: usize = result.phases.iter().map(|p| p.reflections.len()).sum();
        println!("✓ {} reflection(s) written to: {}", count, path.display());
    }

    Ok(())
}

/// Loads the job into a dispatcher and runs one calculation on its grid.
pub fn calculate(job: &SimulationJob, reporter: &ProgressReporter<'_>) -> Result<CalcResult> {
    let mut dispatcher = Dispatcher::new(job.calculator.clone())?;
    dispatcher.set_experiment_type(job.experiment)?;
    info!(
        experiment = %dispatcher.experiment_type(),
        engine = %dispatcher.engine_id(),
        "Engine selected."
    );

    dispatcher.set_pattern(&job.pattern)?;
    dispatcher.set_background(&job.background)?;
    for phase in &job.phases {
        dispatcher.add_phase(phase)?;
    }

    let result = dispatcher.calculate_with(&job.grid, reporter)?;
    Ok(result.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use powdersim::core::experiment::ExperimentType;
    use powdersim::core::models::background::Background;
    use powdersim::core::models::pattern::Pattern;
    use powdersim::engine::capability::EngineId;
    use powdersim::engine::config::CalculatorConfig;
    use std::fs;
    use std::path::PathBuf;

    fn empty_job() -> SimulationJob {
        SimulationJob {
            experiment: ExperimentType::default(),
            calculator: CalculatorConfig::default(),
            phases: Vec::new(),
            pattern: Pattern::default().with_wavelength(1.54),
            background: Background::new([(0.0, 1.0), (180.0, 1.0)]).unwrap(),
            grid: vec![10.0, 20.0, 30.0],
        }
    }

    #[test]
    fn job_without_phases_yields_the_background() {
        let result = calculate(&empty_job(), &ProgressReporter::new()).unwrap();
        assert_eq!(result.total, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn calculation_honours_the_engine_preference() {
        let mut job = empty_job();
        job.calculator.preference = vec![EngineId::Pdf];
        let err = calculate(&job, &ProgressReporter::new()).unwrap_err();
        assert!(err.to_string().contains("No engine"), "{err}");
    }

    #[test]
    fn simulate_writes_profile_and_reflections() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("cu.cif"),
            "data_Cu\n_cell_length_a 3.615\n_cell_length_b 3.615\n_cell_length_c 3.615\n_cell_angle_alpha 90\n_cell_angle_beta 90\n_cell_angle_gamma 90\n_symmetry_space_group_name_H-M 'F m -3 m'\nloop_\n_atom_site_label\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\nCu1 0 0 0\n",
        )
        .unwrap();
        let job_path = dir.path().join("job.toml");
        fs::write(
            &job_path,
            "experiment = \"xray\"\nphases = [\"cu.cif\"]\n[grid]\nstart = 30.0\nstop = 100.0\npoints = 701\n",
        )
        .unwrap();
        let output = dir.path().join("profile.csv");
        let reflections = dir.path().join("refl.csv");
        let args = SimulateArgs {
            job: job_path,
            output: output.clone(),
            reflections: Some(reflections.clone()),
            experiment: None,
            engines: Vec::new(),
            sequential: true,
        };

        run(args, None, true).unwrap();

        let profile = fs::read_to_string(&output).unwrap();
        let mut lines = profile.lines();
        assert_eq!(lines.next(), Some("x,total,background,Cu"));
        assert_eq!(lines.count(), 701);

        let refl = fs::read_to_string(&reflections).unwrap();
        assert!(refl.starts_with("phase,h,k,l,coord,multiplicity"));
        assert!(refl.lines().skip(1).all(|l| l.starts_with("Cu,")));
        assert!(refl.lines().count() > 1);
    }

    #[test]
    fn missing_job_file_is_an_io_error() {
        let args = SimulateArgs {
            job: PathBuf::from("/definitely/not/here.toml"),
            output: PathBuf::from("out.csv"),
            reflections: None,
            experiment: None,
            engines: Vec::new(),
            sequential: false,
        };
        assert!(matches!(
            run(args, None, true),
            Err(crate::error::CliError::Io(_))
        ));
    }
}
