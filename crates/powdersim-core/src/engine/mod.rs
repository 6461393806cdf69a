//! # Engine Module
//!
//! This module implements the calculation layer of powdersim: deciding which engine can
//! handle an experiment, translating the common structural model into that engine's
//! native objects and normalizing what comes back.
//!
//! ## Overview
//!
//! Each supported engine family sits behind an adapter implementing the
//! [`adapter::EngineAdapter`] contract. Adapters own their engine-side state exclusively
//! and are driven by the dispatcher in [`crate::workflows`]; nothing else talks to an
//! engine directly.
//!
//! ## Architecture
//!
//! - **Capability Registry** ([`capability`]) - Which engine supports which experiment type
//! - **Adapter Contract** ([`adapter`]) - The common operation set and shared model state
//! - **Adapters** ([`cw`], [`fortran`], [`pdf`]) - Rietveld CW/TOF, CIF-driven simulator
//!   and pair distribution function
//! - **Native Engines** ([`native`]) - Engine operation sets and reference implementations
//! - **Worker Pool** ([`pool`]) - Per-phase parallel evaluation with cancellation
//! - **Configuration** ([`config`]) - Engine preference and pool settings
//! - **Progress Monitoring** ([`progress`]) - Progress callbacks for front ends
//! - **Error Handling** ([`error`]) - The calculation error type

pub mod adapter;
pub mod capability;
pub mod config;
pub mod cw;
pub mod error;
pub mod fortran;
pub mod native;
pub mod pdf;
pub mod pool;
pub mod progress;
