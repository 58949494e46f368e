use credal_core::{Distribution, ElementId};

use crate::error::AlgorithmError;
use crate::lifecycle::LifecycleState;

/// Lifecycle surface common to every algorithm.
///
/// An algorithm is bound at construction to one universe and one fixed set
/// of target elements; only lifecycle state changes afterwards.
pub trait Algorithm {
    fn state(&self) -> LifecycleState;

    /// Created → Running. Runs the initialize hooks, then begins execution
    /// under the runner's discipline: a one-time algorithm completes its
    /// whole computation before returning, an anytime algorithm launches its
    /// background worker.
    fn start(&mut self) -> Result<(), AlgorithmError>;

    /// Running → Stopped. Suspends stepping after the in-flight step
    /// completes; queries stay servable. One-time algorithms reject this as
    /// a usage error.
    fn stop(&mut self) -> Result<(), AlgorithmError>;

    /// Stopped → Running, continuing from the suspended state without
    /// re-initialization.
    fn resume(&mut self) -> Result<(), AlgorithmError>;

    /// {Running, Stopped} → Killed. Terminates any worker, runs the cleanup
    /// hooks and releases result state. Killing an already-killed algorithm
    /// fails.
    fn kill(&mut self) -> Result<(), AlgorithmError>;
}

/// Query surface of algorithms that answer distribution-shaped questions
/// about their target elements.
///
/// Queries about elements outside the target set fail with
/// [`AlgorithmError::NotATarget`]; queries before `start` fail with
/// [`AlgorithmError::InvalidState`]; queries after `kill` fail with
/// [`AlgorithmError::Killed`].
pub trait QueryAlgorithm<V>: Algorithm {
    fn distribution(&self, element: ElementId) -> Result<Distribution<V>, AlgorithmError>;

    fn expectation<F>(&self, element: ElementId, value_to_number: F) -> Result<f64, AlgorithmError>
    where
        F: Fn(&V) -> f64 + Send + 'static;

    fn probability<F>(&self, element: ElementId, predicate: F) -> Result<f64, AlgorithmError>
    where
        F: Fn(&V) -> bool + Send + 'static;
}
