use crate::core::experiment::ExperimentType;
use crate::core::models::atom::AtomSite;
use crate::core::models::background::Background;
use crate::core::models::pattern::Pattern;
use crate::core::models::phase::{Phase, SpaceGroupSetting};
use crate::core::models::reflection::ReflectionList;
use crate::core::models::result::CalcResult;
use crate::core::uncertainty::Measured;
use crate::engine::adapter::EngineAdapter;
use crate::engine::capability::{self, EngineId};
use crate::engine::config::CalculatorConfig;
use crate::engine::cw::CwAdapter;
use crate::engine::error::CalcError;
use crate::engine::fortran::FortranAdapter;
use crate::engine::native::{DebyePdf, KinematicEngine, ReferenceSimulator};
use crate::engine::pdf::PdfAdapter;
use crate::engine::pool::CancelToken;
use crate::engine::progress::ProgressReporter;
use tracing::{debug, info, instrument};

/// Creates the adapter for a selected engine.
pub trait AdapterProvider {
    fn create(
        &self,
        engine: EngineId,
        ty: ExperimentType,
        config: &CalculatorConfig,
    ) -> Result<Box<dyn EngineAdapter>, CalcError>;
}

/// Provides adapters backed by the bundled reference engines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEngines;

impl AdapterProvider for ReferenceEngines {
    fn create(
        &self,
        engine: EngineId,
        ty: ExperimentType,
        config: &CalculatorConfig,
    ) -> Result<Box<dyn EngineAdapter>, CalcError> {
        let adapter: Box<dyn EngineAdapter> = match engine {
            EngineId::Rietveld => Box::new(CwAdapter::new(
                KinematicEngine::new(),
                ty,
                config.clone(),
            )?),
            EngineId::Simulator => Box::new(FortranAdapter::new(
                ReferenceSimulator::new(),
                ty,
                config.clone(),
            )?),
            EngineId::Pdf => Box::new(PdfAdapter::<DebyePdf>::new(ty)?),
        };
        Ok(adapter)
    }
}

/// Every accepted model operation, folded into the state it produced.
#[derive(Debug, Clone, Default)]
struct RegistrationLog {
    phases: Vec<Phase>,
    background: Option<Background>,
    pattern: Option<Pattern>,
}

impl RegistrationLog {
    fn phase_mut(&mut self, label: &str) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.label == label)
    }

    /// Rebuilds the model on `adapter`: each phase with its space group, atoms and
    /// scale in insertion order, then the background, then the pattern.
    fn replay(&self, adapter: &mut dyn EngineAdapter) -> Result<(), CalcError> {
        for phase in &self.phases {
            let shell = Phase {
                atoms: Vec::new(),
                ..phase.clone()
            };
            adapter.add_phase(&shell)?;
            adapter.set_space_group(&phase.label, &phase.space_group)?;
            for atom in &phase.atoms {
                adapter.add_atom(&phase.label, atom)?;
            }
            adapter.set_phase_scale(&phase.label, phase.scale.value)?;
        }
        if let Some(background) = &self.background {
            adapter.set_background(background)?;
        }
        if let Some(pattern) = &self.pattern {
            adapter.set_pattern(pattern)?;
        }
        Ok(())
    }
}

/// The calculation job front end.
///
/// ## Overview
///
/// The dispatcher owns the active experiment type and the adapter of the engine chosen
/// for it. Every model operation is validated by the adapter first and recorded in a
/// registration log only when accepted. Changing the experiment type or the engine
/// preference builds a fresh adapter, replays the log onto it and swaps it in; if any
/// step fails the previous adapter stays active and the job is untouched.
pub struct Dispatcher<P: AdapterProvider = ReferenceEngines> {
    config: CalculatorConfig,
    provider: P,
    experiment: ExperimentType,
    adapter: Box<dyn EngineAdapter>,
    log: RegistrationLog,
}

impl Dispatcher<ReferenceEngines> {
    /// Creates a dispatcher for the default experiment type using the reference engines.
    pub fn new(config: CalculatorConfig) -> Result<Self, CalcError> {
        Self::with_provider(config, ReferenceEngines)
    }
}

impl<P: AdapterProvider> Dispatcher<P> {
    pub fn with_provider(config: CalculatorConfig, provider: P) -> Result<Self, CalcError> {
        let experiment = ExperimentType::default();
        let engine = capability::select(&config.preference, &experiment)?;
        let adapter = provider.create(engine, experiment, &config)?;
        info!(engine = %engine, experiment = %experiment, "Dispatcher ready.");
        Ok(Self {
            config,
            provider,
            experiment,
            adapter,
            log: RegistrationLog::default(),
        })
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    pub fn experiment_type(&self) -> ExperimentType {
        self.experiment
    }

    pub fn engine_id(&self) -> EngineId {
        self.adapter.engine_id()
    }

    pub fn is_tof(&self) -> bool {
        self.adapter.is_tof()
    }

    /// Token interrupting a running calculation, when the active engine supports it.
    pub fn cancel_token(&self) -> Option<CancelToken> {
        self.adapter.cancel_token()
    }

    /// Switches to `ty`, selecting the first preferred engine that supports it.
    pub fn set_experiment_type(&mut self, ty: ExperimentType) -> Result<(), CalcError> {
        if ty == self.experiment {
            return Ok(());
        }
        let engine = capability::select(&self.config.preference, &ty)?;
        self.rebuild(engine, ty)
    }

    /// Parses `text` as an experiment type and switches to it.
    pub fn set_experiment_type_str(&mut self, text: &str) -> Result<(), CalcError> {
        self.set_experiment_type(ExperimentType::parse(text)?)
    }

    /// Replaces the engine preference, moving to a different engine when the new order
    /// prefers one for the current experiment type.
    pub fn set_preference(&mut self, preference: Vec<EngineId>) -> Result<(), CalcError> {
        let engine = capability::select(&preference, &self.experiment)?;
        if engine != self.adapter.engine_id() {
            self.rebuild(engine, self.experiment)?;
        }
        self.config.preference = preference;
        Ok(())
    }

    #[instrument(skip_all, name = "adapter_switch", fields(engine = %engine, experiment = %ty))]
    fn rebuild(&mut self, engine: EngineId, ty: ExperimentType) -> Result<(), CalcError> {
        let mut adapter = self.provider.create(engine, ty, &self.config)?;
        self.log.replay(adapter.as_mut())?;
        self.adapter = adapter;
        self.experiment = ty;
        info!(phases = self.log.phases.len(), "Switched engine and replayed the model.");
        Ok(())
    }

    pub fn add_phase(&mut self, phase: &Phase) -> Result<(), CalcError> {
        self.adapter.add_phase(phase)?;
        self.log.phases.push(phase.clone());
        debug!(phase = %phase.label, "Phase added.");
        Ok(())
    }

    pub fn remove_phase(&mut self, label: &str) -> Result<(), CalcError> {
        self.adapter.remove_phase(label)?;
        self.log.phases.retain(|p| p.label != label);
        Ok(())
    }

    pub fn add_atom(&mut self, phase: &str, atom: &AtomSite) -> Result<(), CalcError> {
        self.adapter.add_atom(phase, atom)?;
        if let Some(entry) = self.log.phase_mut(phase) {
            entry.atoms.push(atom.clone());
        }
        Ok(())
    }

    pub fn remove_atom(&mut self, phase: &str, atom: &str) -> Result<(), CalcError> {
        self.adapter.remove_atom(phase, atom)?;
        if let Some(entry) = self.log.phase_mut(phase) {
            entry.atoms.retain(|a| a.label != atom);
        }
        Ok(())
    }

    pub fn set_space_group(
        &mut self,
        phase: &str,
        setting: &SpaceGroupSetting,
    ) -> Result<(), CalcError> {
        self.adapter.set_space_group(phase, setting)?;
        if let Some(entry) = self.log.phase_mut(phase) {
            entry.space_group = setting.clone();
        }
        Ok(())
    }

    pub fn set_pattern(&mut self, pattern: &Pattern) -> Result<(), CalcError> {
        self.adapter.set_pattern(pattern)?;
        self.log.pattern = Some(pattern.clone());
        Ok(())
    }

    pub fn update_resolution(&mut self, values: &[(String, Measured)]) -> Result<(), CalcError> {
        self.adapter.update_resolution(values)?;
        self.log.pattern = Some(self.adapter.pattern().clone());
        Ok(())
    }

    pub fn set_background(&mut self, background: &Background) -> Result<(), CalcError> {
        self.adapter.set_background(background)?;
        self.log.background = Some(background.clone());
        Ok(())
    }

    pub fn set_phase_scale(&mut self, phase: &str, scale: f64) -> Result<(), CalcError> {
        self.adapter.set_phase_scale(phase, scale)?;
        if let Some(entry) = self.log.phase_mut(phase) {
            entry.scale = Measured::new(scale);
        }
        Ok(())
    }

    pub fn phase_scale(&self, phase: &str) -> f64 {
        self.adapter.phase_scale(phase)
    }

    pub fn phase_labels(&self) -> Vec<String> {
        self.adapter.phase_labels()
    }

    /// The registered phase `label`, as the active adapter holds it.
    pub fn phase(&self, label: &str) -> Result<&Phase, CalcError> {
        self.adapter.state().phase(label)
    }

    pub fn pattern(&self) -> &Pattern {
        self.adapter.pattern()
    }

    pub fn background(&self) -> &Background {
        self.adapter.background()
    }

    pub fn calculate(&mut self, x: &[f64]) -> Result<&CalcResult, CalcError> {
        self.adapter.calculate(x)
    }

    pub fn calculate_with(
        &mut self,
        x: &[f64],
        reporter: &ProgressReporter<'_>,
    ) -> Result<&CalcResult, CalcError> {
        self.adapter.calculate_with(x, reporter)
    }

    pub fn reflections(
        &mut self,
        phase: Option<&str>,
        x: Option<&[f64]>,
    ) -> Result<Vec<(String, ReflectionList)>, CalcError> {
        self.adapter.reflections(phase, x)
    }

    pub fn last_result(&self) -> Option<&CalcResult> {
        self.adapter.last_result()
    }

    pub fn phase_profile(&self, label: &str) -> Option<&[f64]> {
        self.adapter.phase_profile(label)
    }

    pub fn total_profile(&self) -> Option<&[f64]> {
        self.adapter.total_profile()
    }
}
