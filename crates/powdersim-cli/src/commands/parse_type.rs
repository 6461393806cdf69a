use crate::cli::ParseTypeArgs;
use crate::error::Result;
use powdersim::core::experiment::{Axis, ExperimentType};
use powdersim::engine::capability::capable_engines;

pub fn run(args: ParseTypeArgs) -> Result<()> {
    let ty = ExperimentType::parse(&args.experiment)?;
    println!("{}", describe(&ty));
    Ok(())
}

/// The canonical form of `ty` followed by one line per axis and the capable engines.
pub fn describe(ty: &ExperimentType) -> String {
    let mut lines = vec![ty.to_string()];
    for axis in Axis::ALL {
        lines.push(format!("  {:<15} {}", axis.to_string(), ty.value(axis).token()));
    }
    let engines: Vec<String> = capable_engines(ty).iter().map(|e| e.to_string()).collect();
    let engines = if engines.is_empty() {
        "none".to_string()
    } else {
        engines.join(", ")
    };
    lines.push(format!("  {:<15} {}", "engines", engines));
    lines.join("\n")
}
