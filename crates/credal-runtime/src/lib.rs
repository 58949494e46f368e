//! Execution and query framework for pluggable inference algorithms.
//!
//! This crate provides the generic machinery an inference algorithm plugs
//! into, in two execution disciplines:
//! * One-time: [`OneTimeSampling`] runs the whole computation
//!   synchronously on `start` and then answers queries from frozen state.
//! * Anytime: [`AnytimeRunner`] hosts a steppable algorithm on a dedicated
//!   background worker; queries travel as service messages answered between
//!   steps, so results improve the longer the algorithm runs.
//!
//! Both follow one lifecycle state machine (`start`/`stop`/`resume`/`kill`,
//! see [`LifecycleState`]) with composable initialize/cleanup hooks
//! ([`HookStack`]). Sampling-based algorithms share the
//! [`SampleAccumulator`] statistics engine and a pluggable
//! [`SampleSource`] strategy; [`EmOrchestrator`] layers an outer
//! expectation/maximization loop over any algorithm implementing
//! [`QueryAlgorithm`].

pub mod accumulator;
pub mod algorithm;
pub mod anytime;
pub mod config;
pub mod em;
pub mod error;
pub mod lifecycle;
pub mod mpe;
pub mod onetime;
pub mod sampling;
pub mod source;

pub use crate::accumulator::SampleAccumulator;
pub use crate::algorithm::{Algorithm, QueryAlgorithm};
pub use crate::anytime::{AnytimeAlgorithm, AnytimeRunner};
pub use crate::config::SamplerConfig;
pub use crate::em::{EmOrchestrator, Parameter, Termination};
pub use crate::error::{AlgorithmError, StepError};
pub use crate::lifecycle::{HookStack, LifecycleHooks, LifecycleState};
pub use crate::mpe::{AnytimeMpe, MpeResponse, MpeService};
pub use crate::onetime::OneTimeSampling;
pub use crate::sampling::{AnytimeSampling, SamplingCore, SamplingResponse, SamplingService};
pub use crate::source::{ForwardSource, Reweighted, SampleSource};
