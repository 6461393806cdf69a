use super::CifError;
use crate::core::models::phase::Phase;
use crate::core::uncertainty::Measured;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

fn data_name(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn quoted(text: &str) -> String {
    if text.is_empty() {
        "'?'".to_string()
    } else if text.contains(char::is_whitespace) || text.starts_with(['_', '#', '$', '\'', '"']) {
        format!("'{text}'")
    } else {
        text.to_string()
    }
}

fn number(value: &Measured) -> String {
    format!("{}", value.value)
}

/// Serializes a phase into a self-contained CIF data block using DDLm tag spellings.
pub fn phase_to_cif(phase: &Phase) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_phase(&mut out, phase);
    out
}

fn write_phase(out: &mut String, phase: &Phase) -> std::fmt::Result {
    writeln!(out, "data_{}", data_name(&phase.label))?;
    writeln!(out)?;
    let cell = &phase.cell;
    for (tag, value) in [
        ("_cell.length_a", &cell.a),
        ("_cell.length_b", &cell.b),
        ("_cell.length_c", &cell.c),
        ("_cell.angle_alpha", &cell.alpha),
        ("_cell.angle_beta", &cell.beta),
        ("_cell.angle_gamma", &cell.gamma),
    ] {
        writeln!(out, "{tag:<24}{}", number(value))?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "_space_group.name_H-M_alt  {}",
        quoted(&phase.space_group.hm_symbol)
    )?;
    if let Some(code) = &phase.space_group.coord_code {
        writeln!(out, "_space_group.IT_coordinate_system_code  {}", quoted(code))?;
    }
    writeln!(out, "_phase.scale  {}", number(&phase.scale))?;

    if phase.atoms.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "loop_")?;
    for tag in [
        "_atom_site.label",
        "_atom_site.type_symbol",
        "_atom_site.fract_x",
        "_atom_site.fract_y",
        "_atom_site.fract_z",
        "_atom_site.occupancy",
        "_atom_site.U_iso_or_equiv",
    ] {
        writeln!(out, "{tag}")?;
    }
    for atom in &phase.atoms {
        let u_iso = atom
            .u_iso
            .as_ref()
            .map(number)
            .unwrap_or_else(|| "?".to_string());
        writeln!(
            out,
            "{} {} {} {} {} {} {}",
            quoted(&atom.label),
            quoted(&atom.type_symbol),
            number(&atom.fract[0]),
            number(&atom.fract[1]),
            number(&atom.fract[2]),
            number(&atom.occupancy),
            u_iso
        )?;
    }
    Ok(())
}

pub fn write_phase_cif(phase: &Phase, path: impl AsRef<Path>) -> Result<(), CifError> {
    let path = path.as_ref();
    fs::write(path, phase_to_cif(phase)).map_err(|source| CifError::File {
        path: path.to_path_buf(),
        source,
    })
}
