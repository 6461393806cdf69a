use super::adapter::{EngineAdapter, ModelState, validate_grid};
use super::capability::EngineId;
use super::error::CalcError;
use super::native::{EngineFault, PdfEngine};
use super::progress::{Progress, ProgressReporter};
use crate::core::experiment::{ExperimentType, Radiation};
use crate::core::io::cif::phase_to_cif;
use crate::core::models::atom::AtomSite;
use crate::core::models::background::Background;
use crate::core::models::pattern::{Pattern, PdfSetup};
use crate::core::models::phase::{Phase, SpaceGroupSetting};
use crate::core::models::reflection::ReflectionList;
use crate::core::models::result::{CalcResult, PhaseContribution};
use crate::core::uncertainty::Measured;
use std::marker::PhantomData;
use tracing::{info, instrument, trace};

/// Adapter for pair-distribution-function engines.
///
/// A fresh engine is created for every phase of every calculation, so no engine state
/// outlives a call. The grid is the real-space distance r in Å and is never shifted.
pub struct PdfAdapter<E: PdfEngine + Default> {
    state: ModelState,
    engine: PhantomData<fn() -> E>,
}

impl<E: PdfEngine + Default> PdfAdapter<E> {
    pub fn new(ty: ExperimentType) -> Result<Self, CalcError> {
        Ok(Self {
            state: ModelState::for_engine(EngineId::Pdf, ty)?,
            engine: PhantomData,
        })
    }
}

fn pdf_variables(scale: f64, setup: &PdfSetup) -> [(&'static str, f64); 7] {
    [
        ("pscale", scale),
        ("delta1", setup.delta1.value),
        ("delta2", setup.delta2.value),
        ("spdiameter", setup.spdiameter.value),
        ("qbroad", setup.qbroad.value),
        ("qdamp", setup.qdamp.value),
        ("qmax", setup.qmax.value),
    ]
}

/// Runs one phase through a fresh engine and returns its fit array.
fn phase_pdf<E: PdfEngine + Default>(
    phase: &Phase,
    setup: &PdfSetup,
    r: &[f64],
    radiation: Radiation,
) -> Result<Vec<f64>, EngineFault> {
    let mut engine = E::default();
    engine.silence();
    engine.read_structure(&phase_to_cif(phase))?;
    for (name, value) in pdf_variables(phase.scale.value, setup) {
        engine.set_var(name, value)?;
    }
    for (index, atom) in phase.atoms.iter().enumerate() {
        if let Some(u) = atom.u_iso {
            engine.set_atom_adp(index, u.value, u.value, u.value)?;
        }
    }
    let noise = vec![0.0; r.len()];
    engine.read_data(r, &noise, radiation)?;
    let fit = engine.calc()?;
    if fit.len() != r.len() {
        return Err(EngineFault::LengthMismatch {
            expected: r.len(),
            found: fit.len(),
        });
    }
    Ok(fit)
}

impl<E: PdfEngine + Default> EngineAdapter for PdfAdapter<E> {
    fn engine_id(&self) -> EngineId {
        EngineId::Pdf
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn create_model(&mut self, ty: ExperimentType) -> Result<(), CalcError> {
        if ty != self.state.experiment_type() {
            self.state = ModelState::for_engine(EngineId::Pdf, ty)?;
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

    #[instrument(skip_all, name = "pdf_calculation")]
    fn calculate_with(
        &mut self,
        x: &[f64],
        reporter: &ProgressReporter<'_>,
    ) -> Result<&CalcResult, CalcError> {
        validate_grid(x)?;
        let setup = self.state.pattern().pdf;
        let radiation = self.state.experiment_type().radiation();
        let background = self.state.background().evaluate(x);

        info!(
            phases = self.state.phases().len(),
            points = x.len(),
            "Calculating pair distribution function."
        );
        reporter.report(Progress::CalculationStart {
            engine: EngineId::Pdf,
            phases: self.state.phases().len() as u64,
        });

        let mut contributions = Vec::with_capacity(self.state.phases().len());
        for phase in self.state.phases() {
            let profile = phase_pdf::<E>(phase, &setup, x, radiation)
                .map_err(|cause| CalcError::engine(&phase.label, cause))?;
            trace!(phase = %phase.label, "Phase PDF computed.");
            reporter.report(Progress::PhaseComputed {
                label: phase.label.clone(),
            });
            contributions.push(PhaseContribution {
                label: phase.label.clone(),
                scale: phase.scale.value,
                profile,
                reflections: ReflectionList::default(),
            });
        }

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
