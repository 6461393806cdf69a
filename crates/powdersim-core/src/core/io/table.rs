use crate::core::models::result::CalcResult;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV error for '{path}': {source}")]
    File { path: String, source: csv::Error },
}

/// Writes the calculated profile as `x,total,background,<phase...>` columns.
pub fn write_profile_csv<W: Write>(result: &CalcResult, writer: W) -> Result<(), TableError> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec![
        "x".to_string(),
        "total".to_string(),
        "background".to_string(),
    ];
    header.extend(result.phases.iter().map(|p| p.label.clone()));
    csv.write_record(&header)?;

    for (i, x) in result.x.iter().enumerate() {
        let mut row = Vec::with_capacity(header.len());
        row.push(x.to_string());
        row.push(result.total.get(i).copied().unwrap_or(0.0).to_string());
        row.push(result.background.get(i).copied().unwrap_or(0.0).to_string());
        for phase in &result.phases {
            row.push(phase.profile.get(i).copied().unwrap_or(0.0).to_string());
        }
        csv.write_record(&row)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ReflectionRow<'a> {
    phase: &'a str,
    h: i32,
    k: i32,
    l: i32,
    coord: f64,
    multiplicity: u32,
}

/// Writes every phase's reflections as `phase,h,k,l,coord,multiplicity` rows.
pub fn write_reflections_csv<W: Write>(result: &CalcResult, writer: W) -> Result<(), TableError> {
    let mut csv = csv::Writer::from_writer(writer);
    let mut wrote_any = false;
    for (label, reflections) in result.reflections() {
        for reflection in reflections.iter() {
            let [h, k, l] = reflection.hkl;
            csv.serialize(ReflectionRow {
                phase: label,
                h,
                k,
                l,
                coord: reflection.coord,
                multiplicity: reflection.multiplicity,
            })?;
            wrote_any = true;
        }
    }
    if !wrote_any {
        csv.write_record(["phase", "h", "k", "l", "coord", "multiplicity"])?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn write_profile_csv_to_path(result: &CalcResult, path: &Path) -> Result<(), TableError> {
    let file = std::fs::File::create(path).map_err(|e| TableError::File {
        path: path.to_string_lossy().to_string(),
        source: csv::Error::from(e),
    })?;
    write_profile_csv(result, file)
}

pub fn write_reflections_csv_to_path(result: &CalcResult, path: &Path) -> Result<(), TableError> {
    let file = std::fs::File::create(path).map_err(|e| TableError::File {
        path: path.to_string_lossy().to_string(),
        source: csv::Error::from(e),
    })?;
    write_reflections_csv(result, file)
}
