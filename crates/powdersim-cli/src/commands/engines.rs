use crate::cli::EnginesArgs;
use crate::error::Result;
use powdersim::core::experiment::ExperimentType;
use powdersim::engine::capability::{EngineId, capable_engines, supported_types};

pub fn run(args: EnginesArgs) -> Result<()> {
    match args.experiment {
        Some(text) => {
            let ty = ExperimentType::parse(&text)?;
            println!("{}", capable_report(&ty));
        }
        None => println!("{}", matrix_report()),
    }
    Ok(())
}

pub fn capable_report(ty: &ExperimentType) -> String {
    let engines = capable_engines(ty);
    if engines.is_empty() {
        return format!("{}: no engine supports this experiment type", ty);
    }
    let names: Vec<&str> = engines.iter().map(EngineId::name).collect();
    format!("{}: {}", ty, names.join(", "))
}

/// Every engine with the experiment types it supports.
pub fn matrix_report() -> String {
    let mut out = String::new();
    for engine in EngineId::ALL {
        let types = supported_types(engine);
        out.push_str(&format!("{} ({} types)\n", engine, types.len()));
        for ty in types {
            out.push_str(&format!("  {}\n", ty));
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_lists_every_engine() {
        let report = matrix_report();
        for engine in EngineId::ALL {
            assert!(report.contains(&format!("{} (", engine)));
        }
        assert!(report.contains("  pd-cwl-unp-1d-neut"));
    }

    #[test]
    fn capable_engines_for_a_type() {
        let ty = ExperimentType::parse("pd-tof-unp-1d-neut").unwrap();
        let report = capable_report(&ty);
        assert!(report.starts_with("pd-tof-unp-1d-neut: "));
        assert!(report.contains("rietveld"));
        assert!(!report.contains("simulator"));
    }
}
