use clap::{Args, Parser, Subcommand};
use powdersim::engine::capability::EngineId;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "powdersim CLI - Calculate powder diffraction and pair distribution patterns from CIF structures with a pluggable set of calculation engines.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used for per-phase calculations.
    /// Defaults to one worker per phase.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Calculate a pattern from a TOML job file and write it as CSV.
    Simulate(SimulateArgs),
    /// Show which engines support which experiment types.
    Engines(EnginesArgs),
    /// Print the canonical form of an experiment type.
    ParseType(ParseTypeArgs),
}

/// Arguments for the `simulate` subcommand.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Path to the job description in TOML format.
    #[arg(long, required = true, value_name = "PATH")]
    pub job: PathBuf,

    /// Path for the calculated profile table (CSV).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Also write the reflection list of every phase to this CSV file.
    #[arg(short, long, value_name = "PATH")]
    pub reflections: Option<PathBuf>,

    /// Override the experiment type of the job file (e.g. 'pd-tof', 'xray').
    #[arg(short, long, value_name = "TYPE")]
    pub experiment: Option<String>,

    /// Override the engine preference order. Can be given multiple times.
    #[arg(long = "engine", value_name = "ENGINE", num_args(1..))]
    pub engines: Vec<EngineId>,

    /// Evaluate phases one after another instead of on a worker pool.
    #[arg(long)]
    pub sequential: bool,
}

/// Arguments for the `engines` subcommand.
#[derive(Args, Debug)]
pub struct EnginesArgs {
    /// Only list the engines able to handle this experiment type.
    #[arg(short, long, value_name = "TYPE")]
    pub experiment: Option<String>,
}

/// Arguments for the `parse-type` subcommand.
#[derive(Args, Debug)]
pub struct ParseTypeArgs {
    /// Full or partial experiment type, e.g. 'tof' or 'pd-cwl-unp-1d-xray'.
    #[arg(value_name = "TYPE")]
    pub experiment: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn simulate_arguments_are_parsed() {
        let cli = Cli::try_parse_from([
            "powdersim",
            "-vv",
            "-j",
            "4",
            "simulate",
            "--job",
            "job.toml",
            "--output",
            "out.csv",
            "--engine",
            "pdf",
            "--engine",
            "rietveld",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.threads, Some(4));
        let Commands::Simulate(args) = cli.command else {
            panic!("expected the simulate command");
        };
        assert_eq!(args.job, PathBuf::from("job.toml"));
        assert_eq!(args.engines, vec![EngineId::Pdf, EngineId::Rietveld]);
        assert!(args.reflections.is_none());
        assert!(!args.sequential);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["powdersim", "-q", "-v", "parse-type", "tof"]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let result = Cli::try_parse_from([
            "powdersim", "simulate", "-j", "1", "--job", "a", "--output", "b", "--engine", "gsas",
        ]);
        assert!(result.is_err());
    }
}
