use super::{CifBlock, CifError};
use crate::core::models::atom::{AtomSite, element_symbol};
use crate::core::models::background::Background;
use crate::core::models::pattern::{Pattern, PeakShape};
use crate::core::models::phase::{Cell, Phase, SpaceGroupSetting};
use crate::core::uncertainty::{Measured, MeasuredParseError};
use std::f64::consts::PI;

const SPACE_GROUP_TAGS: &[&str] = &[
    "_space_group_name_h-m_alt",
    "_symmetry_space_group_name_h-m",
    "_space_group_name_h-m_full",
];
const COORD_CODE_TAGS: &[&str] = &["_space_group_it_coordinate_system_code"];
const PHASE_SCALE_TAGS: &[&str] = &["_phase_scale", "_pd_phase_block_scale"];
const PATTERN_SCALE_TAGS: &[&str] = &["_pattern_scale", "_pd_proc_scale"];

/// Parses a measured value, treating CIF's `?` and `.` as absent.
fn parse_optional(tag: &str, raw: &str) -> Result<Option<Measured>, CifError> {
    match Measured::parse(raw) {
        Ok(value) => Ok(Some(value)),
        Err(MeasuredParseError::Missing(_)) => Ok(None),
        Err(source) => Err(CifError::InvalidValue {
            tag: tag.to_string(),
            source,
        }),
    }
}

fn measured_of(block: &CifBlock, tags: &[&str]) -> Result<Option<Measured>, CifError> {
    match block.first_value(tags) {
        Some((tag, raw)) => parse_optional(tag, raw),
        None => Ok(None),
    }
}

fn required(block: &CifBlock, tag: &str) -> Result<Measured, CifError> {
    measured_of(block, &[tag])?.ok_or_else(|| CifError::MissingItem(tag.to_string()))
}

/// Builds a [`Phase`] from a structure block.
///
/// Displacements are read from `_atom_site.U_iso_or_equiv`, or converted from
/// `_atom_site.B_iso_or_equiv`. Missing occupancies default to 1 and missing type
/// symbols are derived from the site label.
pub fn phase_from_block(block: &CifBlock) -> Result<Phase, CifError> {
    let cell = Cell {
        a: required(block, "_cell_length_a")?,
        b: required(block, "_cell_length_b")?,
        c: required(block, "_cell_length_c")?,
        alpha: required(block, "_cell_angle_alpha")?,
        beta: required(block, "_cell_angle_beta")?,
        gamma: required(block, "_cell_angle_gamma")?,
    };

    let (_, symbol) = block
        .first_value(SPACE_GROUP_TAGS)
        .ok_or_else(|| CifError::MissingItem(SPACE_GROUP_TAGS[0].to_string()))?;
    let coord_code = block
        .first_value(COORD_CODE_TAGS)
        .map(|(_, code)| code.trim())
        .filter(|code| !code.is_empty() && *code != "?" && *code != ".")
        .map(str::to_string);
    let space_group = SpaceGroupSetting {
        hm_symbol: symbol.trim().to_string(),
        coord_code,
    };

    let mut phase = Phase::new(block.name.clone(), cell, space_group);
    if let Some(scale) = measured_of(block, PHASE_SCALE_TAGS)? {
        phase.scale = scale;
    }
    phase.atoms = atoms_from_block(block)?;
    phase.validate()?;
    Ok(phase)
}

fn atoms_from_block(block: &CifBlock) -> Result<Vec<AtomSite>, CifError> {
    let Some(labels) = block.column("_atom_site_label") else {
        return Ok(Vec::new());
    };
    let types = block.column("_atom_site_type_symbol");
    let fract: Vec<Vec<&str>> = ["_atom_site_fract_x", "_atom_site_fract_y", "_atom_site_fract_z"]
        .iter()
        .map(|tag| column_matching(block, tag, labels.len()))
        .collect::<Result<_, _>>()?;
    let occupancies = optional_column(block, "_atom_site_occupancy", labels.len())?;
    let u_iso = optional_column(block, "_atom_site_u_iso_or_equiv", labels.len())?;
    let b_iso = optional_column(block, "_atom_site_b_iso_or_equiv", labels.len())?;

    let mut atoms = Vec::with_capacity(labels.len());
    for (i, label) in labels.iter().enumerate() {
        let type_symbol = types
            .as_ref()
            .and_then(|t| t.get(i))
            .filter(|t| **t != "?" && **t != ".")
            .map(|t| t.to_string())
            .unwrap_or_else(|| element_symbol(label));

        let mut xyz = [Measured::default(); 3];
        for (axis, column) in fract.iter().enumerate() {
            let tag = ["_atom_site_fract_x", "_atom_site_fract_y", "_atom_site_fract_z"][axis];
            xyz[axis] = parse_optional(tag, column[i])?
                .ok_or_else(|| CifError::MissingItem(format!("{tag} of atom '{label}'")))?;
        }

        let mut atom = AtomSite::new(*label, type_symbol, [0.0; 3]);
        atom.set_fract(xyz);
        if let Some(occupancy) = occupancies.as_ref() {
            if let Some(value) = parse_optional("_atom_site_occupancy", occupancy[i])? {
                atom.occupancy = value;
            }
        }
        atom.u_iso = match (u_iso.as_ref(), b_iso.as_ref()) {
            (Some(u), _) => parse_optional("_atom_site_u_iso_or_equiv", u[i])?,
            (None, Some(b)) => parse_optional("_atom_site_b_iso_or_equiv", b[i])?.map(b_to_u),
            (None, None) => None,
        };
        atoms.push(atom);
    }
    Ok(atoms)
}

fn b_to_u(b: Measured) -> Measured {
    let factor = 8.0 * PI * PI;
    Measured {
        value: b.value / factor,
        error: b.error.map(|e| e / factor),
    }
}

fn column_matching<'a>(
    block: &'a CifBlock,
    tag: &str,
    len: usize,
) -> Result<Vec<&'a str>, CifError> {
    optional_column(block, tag, len)?.ok_or_else(|| CifError::MissingItem(tag.to_string()))
}

fn optional_column<'a>(
    block: &'a CifBlock,
    tag: &str,
    len: usize,
) -> Result<Option<Vec<&'a str>>, CifError> {
    match block.column(tag) {
        Some(column) if column.len() != len => Err(CifError::LengthMismatch {
            first: "_atom_site_label".to_string(),
            second: tag.to_string(),
        }),
        other => Ok(other),
    }
}

#[derive(Debug, Clone, Copy)]
enum PatternField {
    Wavelength,
    ZeroShift,
    ResolutionU,
    ResolutionV,
    ResolutionW,
    ResolutionX,
    ResolutionY,
    AsymmetryP1,
    AsymmetryP2,
    AsymmetryP3,
    AsymmetryP4,
    TofZero,
    Dtt1,
    Dtt2,
    TthetaBank,
    Sigma0,
    Sigma1,
    Sigma2,
    Gamma0,
    Gamma1,
    Gamma2,
    Alpha0,
    Alpha1,
    Beta0,
    Beta1,
    Qmax,
    Qdamp,
    Qbroad,
    Delta1,
    Delta2,
    Spdiameter,
}

impl PatternField {
    fn slot(self, pattern: &mut Pattern) -> &mut Measured {
        match self {
            PatternField::Wavelength => &mut pattern.cw.wavelength,
            PatternField::ZeroShift => &mut pattern.cw.zero_shift,
            PatternField::ResolutionU => &mut pattern.cw.resolution.u,
            PatternField::ResolutionV => &mut pattern.cw.resolution.v,
            PatternField::ResolutionW => &mut pattern.cw.resolution.w,
            PatternField::ResolutionX => &mut pattern.cw.resolution.x,
            PatternField::ResolutionY => &mut pattern.cw.resolution.y,
            PatternField::AsymmetryP1 => &mut pattern.cw.asymmetry.p1,
            PatternField::AsymmetryP2 => &mut pattern.cw.asymmetry.p2,
            PatternField::AsymmetryP3 => &mut pattern.cw.asymmetry.p3,
            PatternField::AsymmetryP4 => &mut pattern.cw.asymmetry.p4,
            PatternField::TofZero => &mut pattern.tof.zero,
            PatternField::Dtt1 => &mut pattern.tof.dtt1,
            PatternField::Dtt2 => &mut pattern.tof.dtt2,
            PatternField::TthetaBank => &mut pattern.tof.ttheta_bank,
            PatternField::Sigma0 => &mut pattern.tof.sigma0,
            PatternField::Sigma1 => &mut pattern.tof.sigma1,
            PatternField::Sigma2 => &mut pattern.tof.sigma2,
            PatternField::Gamma0 => &mut pattern.tof.gamma0,
            PatternField::Gamma1 => &mut pattern.tof.gamma1,
            PatternField::Gamma2 => &mut pattern.tof.gamma2,
            PatternField::Alpha0 => &mut pattern.tof.alpha0,
            PatternField::Alpha1 => &mut pattern.tof.alpha1,
            PatternField::Beta0 => &mut pattern.tof.beta0,
            PatternField::Beta1 => &mut pattern.tof.beta1,
            PatternField::Qmax => &mut pattern.pdf.qmax,
            PatternField::Qdamp => &mut pattern.pdf.qdamp,
            PatternField::Qbroad => &mut pattern.pdf.qbroad,
            PatternField::Delta1 => &mut pattern.pdf.delta1,
            PatternField::Delta2 => &mut pattern.pdf.delta2,
            PatternField::Spdiameter => &mut pattern.pdf.spdiameter,
        }
    }
}

/// Accepted spellings of each instrument parameter, primary spelling first.
const PATTERN_TAGS: &[(PatternField, &[&str])] = &[
    (
        PatternField::Wavelength,
        &[
            "_diffrn_radiation_wavelength",
            "_diffrn_radiation_wavelength_value",
            "_setup_wavelength",
        ],
    ),
    (
        PatternField::ZeroShift,
        &["_setup_offset_2theta", "_pd_calib_2theta_offset"],
    ),
    (PatternField::ResolutionU, &["_pd_instr_resolution_u"]),
    (PatternField::ResolutionV, &["_pd_instr_resolution_v"]),
    (PatternField::ResolutionW, &["_pd_instr_resolution_w"]),
    (PatternField::ResolutionX, &["_pd_instr_resolution_x"]),
    (PatternField::ResolutionY, &["_pd_instr_resolution_y"]),
    (PatternField::AsymmetryP1, &["_pd_instr_reflex_asymmetry_p1"]),
    (PatternField::AsymmetryP2, &["_pd_instr_reflex_asymmetry_p2"]),
    (PatternField::AsymmetryP3, &["_pd_instr_reflex_asymmetry_p3"]),
    (PatternField::AsymmetryP4, &["_pd_instr_reflex_asymmetry_p4"]),
    (PatternField::TofZero, &["_pd_instr_zero", "_tof_parameters_zero"]),
    (PatternField::Dtt1, &["_pd_instr_dtt1", "_tof_parameters_dtt1"]),
    (PatternField::Dtt2, &["_pd_instr_dtt2", "_tof_parameters_dtt2"]),
    (
        PatternField::TthetaBank,
        &["_pd_instr_2theta_bank", "_tof_parameters_2theta_bank"],
    ),
    (PatternField::Sigma0, &["_pd_instr_peak_shape_sigma0", "_tof_profile_sigma0"]),
    (PatternField::Sigma1, &["_pd_instr_peak_shape_sigma1", "_tof_profile_sigma1"]),
    (PatternField::Sigma2, &["_pd_instr_peak_shape_sigma2", "_tof_profile_sigma2"]),
    (PatternField::Gamma0, &["_pd_instr_peak_shape_gamma0", "_tof_profile_gamma0"]),
    (PatternField::Gamma1, &["_pd_instr_peak_shape_gamma1", "_tof_profile_gamma1"]),
    (PatternField::Gamma2, &["_pd_instr_peak_shape_gamma2", "_tof_profile_gamma2"]),
    (PatternField::Alpha0, &["_pd_instr_peak_shape_alpha0", "_tof_profile_alpha0"]),
    (PatternField::Alpha1, &["_pd_instr_peak_shape_alpha1", "_tof_profile_alpha1"]),
    (PatternField::Beta0, &["_pd_instr_peak_shape_beta0", "_tof_profile_beta0"]),
    (PatternField::Beta1, &["_pd_instr_peak_shape_beta1", "_tof_profile_beta1"]),
    (PatternField::Qmax, &["_pd_instr_qmax", "_pdf_parameters_qmax"]),
    (PatternField::Qdamp, &["_pd_instr_qdamp", "_pdf_parameters_qdamp"]),
    (PatternField::Qbroad, &["_pd_instr_qbroad", "_pdf_parameters_qbroad"]),
    (PatternField::Delta1, &["_pd_instr_delta1", "_pdf_parameters_delta1"]),
    (PatternField::Delta2, &["_pd_instr_delta2", "_pdf_parameters_delta2"]),
    (
        PatternField::Spdiameter,
        &["_pd_instr_spdiameter", "_pdf_parameters_spdiameter"],
    ),
];

const PEAK_SHAPE_TAGS: &[&str] = &["_pd_instr_peak_shape", "_tof_profile_peak_shape"];

/// Reads instrumental parameters from a block. Parameters that are not present keep
/// their defaults.
pub fn pattern_from_block(block: &CifBlock) -> Result<Pattern, CifError> {
    let mut pattern = Pattern::default();
    for (field, tags) in PATTERN_TAGS {
        if let Some(value) = measured_of(block, tags)? {
            *field.slot(&mut pattern) = value;
        }
    }
    if let Some((tag, raw)) = block.first_value(PEAK_SHAPE_TAGS) {
        pattern.tof.peak_shape = parse_peak_shape(tag, raw)?;
    }
    pattern.scale = measured_of(block, PATTERN_SCALE_TAGS)?;
    pattern.validate()?;
    Ok(pattern)
}

fn parse_peak_shape(tag: &str, raw: &str) -> Result<PeakShape, CifError> {
    let normalized: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    match normalized.as_str() {
        "gauss" | "gaussian" => Ok(PeakShape::Gauss),
        "pseudovoigt" | "pv" => Ok(PeakShape::PseudoVoigt),
        _ => Err(CifError::InvalidText {
            tag: tag.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Column pairs describing background anchors, constant-wavelength first.
const BACKGROUND_COLUMNS: &[(&str, &str)] = &[
    (
        "_pd_background_line_segment_x",
        "_pd_background_line_segment_intensity",
    ),
    (
        "_tof_backgroundpoint_time",
        "_tof_backgroundpoint_intensity",
    ),
];

/// Reads background anchors. A block without anchors yields an empty background.
pub fn background_from_block(block: &CifBlock) -> Result<Background, CifError> {
    for (x_tag, y_tag) in BACKGROUND_COLUMNS {
        let Some(xs) = block.column(x_tag) else {
            continue;
        };
        let ys = block
            .column(y_tag)
            .ok_or_else(|| CifError::MissingItem(y_tag.to_string()))?;
        let x = values_of(x_tag, &xs)?;
        let y = values_of(y_tag, &ys)?;
        if x.len() != y.len() {
            return Err(CifError::LengthMismatch {
                first: x_tag.to_string(),
                second: y_tag.to_string(),
            });
        }
        return Ok(Background::new(x.into_iter().zip(y))?);
    }
    Ok(Background::default())
}

fn values_of(tag: &str, column: &[&str]) -> Result<Vec<f64>, CifError> {
    column
        .iter()
        .map(|raw| {
            parse_optional(tag, raw)?
                .map(|m| m.value)
                .ok_or_else(|| CifError::MissingItem(tag.to_string()))
        })
        .collect()
}

fn measured_values_of(tag: &str, column: &[&str]) -> Result<Vec<Measured>, CifError> {
    column
        .iter()
        .map(|raw| parse_optional(tag, raw)?.ok_or_else(|| CifError::MissingItem(tag.to_string())))
        .collect()
}

/// Which intensity columns a measured pattern was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensitySource {
    Total,
    /// Sum of the spin-up and spin-down channels.
    UpDown,
}

/// A measured powder pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredData {
    /// 2θ in degrees or time of flight in µs.
    pub x: Vec<f64>,
    pub intensity: Vec<f64>,
    /// Standard uncertainties, when the file provides them.
    pub sigma: Option<Vec<f64>>,
    pub source: IntensitySource,
}

const X_TAGS: &[&str] = &["_pd_meas_2theta_scan", "_pd_meas_time_of_flight"];

/// Reads a measured pattern.
///
/// The intensity columns are tried in a fixed order and the first complete match
/// wins: `intensity_total` (with `intensity_total_su`), then the polarized pair
/// `intensity_up`/`intensity_down` (with `_sigma` columns), summed.
pub fn measured_from_block(block: &CifBlock) -> Result<MeasuredData, CifError> {
    let (x_tag, raw_x) = X_TAGS
        .iter()
        .find_map(|tag| block.column(tag).map(|c| (*tag, c)))
        .ok_or_else(|| CifError::MissingItem(X_TAGS[0].to_string()))?;
    let x = values_of(x_tag, &raw_x)?;

    let check_len = |tag: &str, len: usize| {
        if len == x.len() {
            Ok(())
        } else {
            Err(CifError::LengthMismatch {
                first: x_tag.to_string(),
                second: tag.to_string(),
            })
        }
    };

    if let Some(raw) = block.column("_pd_meas_intensity_total") {
        let tag = "_pd_meas_intensity_total";
        check_len(tag, raw.len())?;
        let measured = measured_values_of(tag, &raw)?;
        let sigma = match block.column("_pd_meas_intensity_total_su") {
            Some(su) => {
                check_len("_pd_meas_intensity_total_su", su.len())?;
                Some(values_of("_pd_meas_intensity_total_su", &su)?)
            }
            None => embedded_errors(&measured),
        };
        return Ok(MeasuredData {
            x,
            intensity: measured.iter().map(|m| m.value).collect(),
            sigma,
            source: IntensitySource::Total,
        });
    }

    if let (Some(up), Some(down)) = (
        block.column("_pd_meas_intensity_up"),
        block.column("_pd_meas_intensity_down"),
    ) {
        check_len("_pd_meas_intensity_up", up.len())?;
        check_len("_pd_meas_intensity_down", down.len())?;
        let up = measured_values_of("_pd_meas_intensity_up", &up)?;
        let down = measured_values_of("_pd_meas_intensity_down", &down)?;

        let sigma_up = match block.column("_pd_meas_intensity_up_sigma") {
            Some(s) => Some(values_of("_pd_meas_intensity_up_sigma", &s)?),
            None => embedded_errors(&up),
        };
        let sigma_down = match block.column("_pd_meas_intensity_down_sigma") {
            Some(s) => Some(values_of("_pd_meas_intensity_down_sigma", &s)?),
            None => embedded_errors(&down),
        };
        let sigma = match (sigma_up, sigma_down) {
            (Some(su), Some(sd)) if su.len() == x.len() && sd.len() == x.len() => Some(
                su.iter()
                    .zip(&sd)
                    .map(|(a, b)| (a * a + b * b).sqrt())
                    .collect(),
            ),
            _ => None,
        };
        return Ok(MeasuredData {
            x,
            intensity: up.iter().zip(&down).map(|(u, d)| u.value + d.value).collect(),
            sigma,
            source: IntensitySource::UpDown,
        });
    }

    Err(CifError::MissingItem("_pd_meas_intensity_total".to_string()))
}

fn embedded_errors(values: &[Measured]) -> Option<Vec<f64>> {
    values.iter().map(|m| m.error).collect()
}
