use credal_core::ElementId;
use thiserror::Error;

use crate::lifecycle::LifecycleState;

/// Errors surfaced synchronously by lifecycle and query operations.
#[derive(Debug, Error)]
pub enum AlgorithmError {
    #[error("'{op}' is not valid while the algorithm is {state}")]
    InvalidState {
        op: &'static str,
        state: LifecycleState,
    },
    #[error("element {0} is not a target of this algorithm")]
    NotATarget(ElementId),
    #[error("algorithm has been killed")]
    Killed,
    #[error("initialization failed: {0}")]
    InitFailed(anyhow::Error),
    #[error("step failed: {0}")]
    Step(#[from] StepError),
    #[error("worker thread panicked: {0}")]
    WorkerPanicked(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// A failure inside one unit of sampling work.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("element {0} is not active in the universe")]
    Inactive(ElementId),
    #[error("element {0} cannot generate values")]
    NotGenerative(ElementId),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
