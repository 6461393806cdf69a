//! # powdersim Core Library
//!
//! A unifying façade for powder-diffraction pattern calculation. Given one or more
//! crystalline phases, a set of instrumental conditions and an experiment type, the
//! library selects a capable calculation engine, translates the common structural model
//! into the engine's native object graph, runs it and normalizes the output into a
//! uniform result.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Phase`, `Pattern`,
//!   `ExperimentType`), the `V(E)` uncertainty notation, space-group symmetry and CIF I/O.
//!
//! - **[`engine`]: The Logic Core.** The capability registry, the `EngineAdapter`
//!   contract and its three adapters (constant-wavelength/time-of-flight Rietveld,
//!   CIF-driven powder simulator, pair-distribution function), the declared operation
//!   sets of the native engines together with reference implementations, and the
//!   per-phase worker pool.
//!
//! - **[`workflows`]: The Public API.** The `Dispatcher`, which resolves an adapter for an
//!   experiment type, forwards the common operations and replays the registration log
//!   when the experiment type changes.

pub mod core;
pub mod engine;
pub mod workflows;
