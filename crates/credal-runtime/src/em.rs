use credal_core::{Distribution, ElementId};
use serde::Deserialize;

use crate::algorithm::QueryAlgorithm;
use crate::error::AlgorithmError;

/// Parameter collaborator for expectation maximization.
///
/// The orchestrator never owns parameter state: a parameter converts the
/// posterior over its element into sufficient statistics and updates itself
/// in place from them.
pub trait Parameter<V>: Send {
    type Statistics;

    /// The target element this parameter learns from.
    fn element(&self) -> ElementId;

    /// E-step conversion from a posterior distribution to sufficient
    /// statistics.
    fn distribution_to_statistics(&self, distribution: Distribution<V>) -> Self::Statistics;

    /// M-step in-place update.
    fn maximize(&mut self, statistics: Self::Statistics);

    /// Scalar readout used by the convergence criterion.
    fn current(&self) -> f64;
}

/// When the outer EM loop stops.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub enum Termination {
    /// A fixed number of iterations; zero runs nothing.
    Iterations(u32),
    /// Stop once no parameter moved by more than `threshold` in one
    /// iteration, with `max_iterations` as a cap.
    Convergence { threshold: f64, max_iterations: u32 },
}

/// Sequences the outer expectation/maximization loop.
///
/// Each iteration builds a fresh inference algorithm through the supplied
/// factory (so updates applied by the previous M-step are visible to the
/// next E-step), harvests one distribution per parameter, kills the
/// algorithm, and then lets every parameter maximize.
pub struct EmOrchestrator<P> {
    parameters: Vec<P>,
    termination: Termination,
}

impl<P> EmOrchestrator<P> {
    pub fn new(parameters: Vec<P>, termination: Termination) -> Self {
        Self {
            parameters,
            termination,
        }
    }

    pub fn parameters(&self) -> &[P] {
        &self.parameters
    }

    pub fn into_parameters(self) -> Vec<P> {
        self.parameters
    }

    /// Runs the loop to termination and returns the number of completed
    /// iterations.
    pub fn run<V, A, F>(&mut self, mut make_algorithm: F) -> Result<u32, AlgorithmError>
    where
        P: Parameter<V>,
        A: QueryAlgorithm<V>,
        F: FnMut(&[P]) -> A,
    {
        let max_iterations = match self.termination {
            Termination::Iterations(n) => n,
            Termination::Convergence { max_iterations, .. } => max_iterations,
        };

        let mut completed = 0;
        while completed < max_iterations {
            let before: Vec<f64> = self.parameters.iter().map(Parameter::current).collect();

            let mut algorithm = make_algorithm(&self.parameters);
            algorithm.start()?;
            let statistics = self.harvest(&algorithm);
            let kill_result = algorithm.kill();
            let statistics = statistics?;
            kill_result?;

            for (parameter, stats) in self.parameters.iter_mut().zip(statistics) {
                parameter.maximize(stats);
            }
            completed += 1;
            log::debug!("EM iteration {completed} complete");

            if let Termination::Convergence { threshold, .. } = self.termination {
                let delta = self
                    .parameters
                    .iter()
                    .map(Parameter::current)
                    .zip(before)
                    .map(|(after, before)| (after - before).abs())
                    .fold(0.0f64, f64::max);
                if delta <= threshold {
                    log::debug!("EM converged after {completed} iterations (delta {delta})");
                    break;
                }
            }
        }
        Ok(completed)
    }

    fn harvest<V, A>(&self, algorithm: &A) -> Result<Vec<P::Statistics>, AlgorithmError>
    where
        P: Parameter<V>,
        A: QueryAlgorithm<V>,
    {
        self.parameters
            .iter()
            .map(|parameter| {
                let distribution = algorithm.distribution(parameter.element())?;
                Ok(parameter.distribution_to_statistics(distribution))
            })
            .collect()
    }
}
