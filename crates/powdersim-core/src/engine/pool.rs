use super::config::CalculatorConfig;
use super::error::CalcError;
use super::native::{PhaseProfile, PowderModel, RietveldEngine};
use super::progress::{Progress, ProgressReporter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// Shared flag used to abandon a running calculation from another thread.
///
/// The flag is cleared when the calculation it interrupted returns, so the next call
/// starts fresh.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One single-phase calculation.
#[derive(Debug, Clone)]
pub struct PhaseJob {
    pub label: String,
    pub model: PowderModel,
}

/// Computes every job's profile on `x`, returning profiles in job order.
///
/// With `config.parallel` set, jobs run on a dedicated pool sized by
/// [`CalculatorConfig::worker_count`], each worker owning its own engine clone. The
/// calling thread polls for results and for `cancel`. On failure or cancellation the
/// results of workers still running are discarded.
pub fn run_phases<E>(
    engine: &E,
    jobs: Vec<PhaseJob>,
    x: &[f64],
    config: &CalculatorConfig,
    cancel: &CancelToken,
    reporter: &ProgressReporter<'_>,
) -> Result<Vec<PhaseProfile>, CalcError>
where
    E: RietveldEngine + 'static,
{
    #[cfg(feature = "parallel")]
    let outcome = if config.parallel && !jobs.is_empty() {
        run_parallel(engine, jobs, x, config, cancel, reporter)
    } else {
        run_sequential(engine, jobs, x, cancel, reporter)
    };

    #[cfg(not(feature = "parallel"))]
    let outcome = {
        let _ = config;
        run_sequential(engine, jobs, x, cancel, reporter)
    };

    cancel.reset();
    outcome
}

fn run_sequential<E: RietveldEngine>(
    engine: &E,
    jobs: Vec<PhaseJob>,
    x: &[f64],
    cancel: &CancelToken,
    reporter: &ProgressReporter<'_>,
) -> Result<Vec<PhaseProfile>, CalcError> {
    let mut profiles = Vec::with_capacity(jobs.len());
    for job in jobs {
        if cancel.is_cancelled() {
            return Err(CalcError::Cancelled);
        }
        let profile = engine
            .calc_phase(&job.model, x)
            .map_err(|cause| CalcError::engine(&job.label, cause))?;
        reporter.report(Progress::PhaseComputed { label: job.label });
        profiles.push(profile);
    }
    Ok(profiles)
}

#[cfg(feature = "parallel")]
fn run_parallel<E>(
    engine: &E,
    jobs: Vec<PhaseJob>,
    x: &[f64],
    config: &CalculatorConfig,
    cancel: &CancelToken,
    reporter: &ProgressReporter<'_>,
) -> Result<Vec<PhaseProfile>, CalcError>
where
    E: RietveldEngine + 'static,
{
    use std::sync::mpsc::{self, RecvTimeoutError};

    let total = jobs.len();
    let workers = config.worker_count(total);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("powdersim-worker-{i}"))
        .build()
        .map_err(|e| CalcError::Internal(format!("failed to start worker pool: {e}")))?;
    debug!(workers, phases = total, "Dispatching phases to worker pool.");

    // Set when this call gives up, so queued jobs are skipped.
    let abandoned = Arc::new(AtomicBool::new(false));
    let grid: Arc<[f64]> = Arc::from(x);
    let (tx, rx) = mpsc::channel();

    for (index, job) in jobs.into_iter().enumerate() {
        let tx = tx.clone();
        let worker = engine.clone();
        let grid = Arc::clone(&grid);
        let abandoned = Arc::clone(&abandoned);
        let cancel = cancel.clone();
        pool.spawn(move || {
            if abandoned.load(Ordering::SeqCst) || cancel.is_cancelled() {
                return;
            }
            let outcome = worker.calc_phase(&job.model, &grid);
            // The receiver is gone once the call has been abandoned.
            let _ = tx.send((index, job.label, outcome));
        });
    }
    drop(tx);

    let abandon = |error: CalcError| {
        abandoned.store(true, Ordering::SeqCst);
        Err(error)
    };

    let mut slots: Vec<Option<PhaseProfile>> = vec![None; total];
    let mut remaining = total;
    while remaining > 0 {
        if cancel.is_cancelled() {
            return abandon(CalcError::Cancelled);
        }
        match rx.recv_timeout(config.poll_interval()) {
            Ok((index, label, Ok(profile))) => {
                trace!(phase = %label, "Phase profile received.");
                reporter.report(Progress::PhaseComputed { label });
                slots[index] = Some(profile);
                remaining -= 1;
            }
            Ok((_, label, Err(cause))) => return abandon(CalcError::engine(&label, cause)),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                if cancel.is_cancelled() {
                    return abandon(CalcError::Cancelled);
                }
                return abandon(CalcError::Internal(
                    "a worker stopped without reporting its phase".to_string(),
                ));
            }
        }
    }

    slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| CalcError::Internal("missing phase profile".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::experiment::Radiation;
    use crate::core::models::pattern::CwSetup;
    use crate::core::models::phase::{Cell, Phase, SpaceGroupSetting};
    use crate::engine::config::CalculatorConfigBuilder;
    use crate::engine::native::{BeamSetup, CrystalModel, EngineFault};
    use std::thread;
    use std::time::{Duration, Instant};

    /// Fills the grid with the phase's cell edge after sleeping for `delay_ms × a`.
    #[derive(Clone)]
    struct SleepyEngine {
        delay_ms: u64,
        fail_on: Option<String>,
    }

    impl RietveldEngine for SleepyEngine {
        fn silence(&mut self) {}

        fn calc_phase(&self, model: &PowderModel, x: &[f64]) -> Result<PhaseProfile, EngineFault> {
            let a = model.crystal.cell.a.value;
            thread::sleep(Duration::from_millis(self.delay_ms * a as u64));
            if self.fail_on.as_deref() == Some(model.crystal.label.as_str()) {
                return Err(EngineFault::NonFinite);
            }
            Ok(PhaseProfile {
                intensity: vec![a; x.len()],
                reflections: Default::default(),
            })
        }
    }

    fn job(label: &str, a: f64) -> PhaseJob {
        let phase = Phase::new(label, Cell::cubic(a), SpaceGroupSetting::new("P 1"));
        PhaseJob {
            label: label.to_string(),
            model: PowderModel {
                beam: BeamSetup::ConstantWavelength(CwSetup::default()),
                radiation: Radiation::Neutron,
                crystal: CrystalModel::from_phase(&phase).unwrap(),
            },
        }
    }

    fn config(parallel: bool) -> CalculatorConfig {
        CalculatorConfigBuilder::new()
            .parallel(parallel)
            .poll_interval(Duration::from_millis(5))
            .build()
            .unwrap()
    }

    #[test]
    fn results_come_back_in_job_order() {
        let engine = SleepyEngine {
            delay_ms: 10,
            fail_on: None,
        };
        for parallel in [true, false] {
            let jobs = vec![job("slow", 5.0), job("fast", 1.0), job("mid", 3.0)];
            let profiles = run_phases(
                &engine,
                jobs,
                &[1.0, 2.0],
                &config(parallel),
                &CancelToken::new(),
                &ProgressReporter::new(),
            )
            .unwrap();
            let firsts: Vec<f64> = profiles.iter().map(|p| p.intensity[0]).collect();
            assert_eq!(firsts, vec![5.0, 1.0, 3.0]);
        }
    }

    #[test]
    fn engine_failures_name_the_phase() {
        let engine = SleepyEngine {
            delay_ms: 1,
            fail_on: Some("bad".to_string()),
        };
        for parallel in [true, false] {
            let jobs = vec![job("good", 1.0), job("bad", 2.0)];
            let err = run_phases(
                &engine,
                jobs,
                &[1.0],
                &config(parallel),
                &CancelToken::new(),
                &ProgressReporter::new(),
            )
            .unwrap_err();
            assert!(
                matches!(&err, CalcError::EngineCalcFailed { phase, .. } if phase == "bad"),
                "unexpected error {err:?}"
            );
        }
    }

    #[test]
    fn cancellation_returns_without_waiting_for_workers() {
        let engine = SleepyEngine {
            delay_ms: 1000,
            fail_on: None,
        };
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            remote.cancel();
        });

        let started = Instant::now();
        let err = run_phases(
            &engine,
            vec![job("A", 2.0)],
            &[1.0],
            &config(true),
            &cancel,
            &ProgressReporter::new(),
        )
        .unwrap_err();
        canceller.join().unwrap();

        assert!(matches!(err, CalcError::Cancelled));
        assert!(started.elapsed() < Duration::from_millis(1500));
        assert!(!cancel.is_cancelled(), "token is cleared after the call");
    }

    #[test]
    fn every_phase_is_reported() {
        use std::sync::Mutex;
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseComputed { label } = event {
                seen.lock().unwrap().push(label);
            }
        }));
        let engine = SleepyEngine {
            delay_ms: 0,
            fail_on: None,
        };
        run_phases(
            &engine,
            vec![job("A", 1.0), job("B", 1.0)],
            &[],
            &config(true),
            &CancelToken::new(),
            &reporter,
        )
        .unwrap();
        drop(reporter);
        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, vec!["A", "B"]);
    }
}
