use crate::error::{CliError, Result};
use powdersim::core::models::pattern::Pattern;
use powdersim::engine::config::CalculatorConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The calculation grid, either generated or taken from a measured pattern.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileGrid {
    pub start: Option<f64>,
    pub stop: Option<f64>,
    pub points: Option<usize>,
    /// CIF file whose scan coordinates become the grid.
    pub measured: Option<PathBuf>,
}

/// A job description as written in TOML. Relative paths are resolved against the
/// directory of the job file.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileJob {
    pub experiment: Option<String>,
    /// Structure CIF files, one phase per data block.
    #[serde(default)]
    pub phases: Vec<PathBuf>,
    #[serde(default)]
    pub phase_scales: BTreeMap<String, f64>,
    /// CIF file with instrumental parameters and background anchors.
    pub instrument: Option<PathBuf>,
    pub pattern: Option<Pattern>,
    /// Background anchors as `[x, intensity]` pairs.
    pub background: Option<Vec<[f64; 2]>>,
    pub grid: Option<FileGrid>,
    pub calculator: Option<CalculatorConfig>,
}

impl FileJob {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading job file from: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut job: FileJob = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        if let Some(base) = path.parent() {
            job.resolve_paths(base);
        }
        Ok(job)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.phases.iter_mut().for_each(resolve);
        if let Some(instrument) = self.instrument.as_mut() {
            resolve(instrument);
        }
        if let Some(measured) = self.grid.as_mut().and_then(|g| g.measured.as_mut()) {
            resolve(measured);
        }
    }
}
