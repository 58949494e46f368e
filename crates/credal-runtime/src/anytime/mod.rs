//! Anytime execution machinery.
//!
//! An anytime algorithm runs as a sequence of discrete steps on one
//! dedicated background thread and answers queries between steps over a
//! synchronous message protocol:
//! 1. Implement [`AnytimeAlgorithm`] for the stepping state, choosing the
//!    `Service`/`Response` enum pair of your algorithm category.
//! 2. Wrap it in an [`AnytimeRunner`] and `start` it to launch the worker.
//! 3. Issue queries with [`AnytimeRunner::call`]; the call blocks until the
//!    worker answers at a step boundary.
//! 4. `stop`/`resume` suspend and continue stepping; `kill` terminates the
//!    worker and fails any query still in flight.
//!
//! The transport is generic over the service mapping, so new algorithm
//! categories add their own enum pair without touching the worker loop.

mod runner;


pub use runner::{AnytimeAlgorithm, AnytimeRunner};
