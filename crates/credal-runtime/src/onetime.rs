use std::hash::Hash;

use credal_core::{Distribution, ElementId};

use crate::algorithm::{Algorithm, QueryAlgorithm};
use crate::config::SamplerConfig;
use crate::error::AlgorithmError;
use crate::lifecycle::{HookStack, LifecycleState};
use crate::sampling::SamplingCore;
use crate::source::SampleSource;

/// One-time sampling: `start` resets the statistics, draws the configured
/// number of samples synchronously on the calling thread, and freezes.
/// Queries afterwards are pure reads of the frozen state.
///
/// `stop` and `resume` are usage errors, since a one-time run is atomic. A
/// failed draw aborts the run: cleanup hooks fire, the algorithm
/// transitions to Killed and `start` returns the error.
pub struct OneTimeSampling<V, S> {
    core: SamplingCore<V, S>,
    num_samples: u64,
    state: LifecycleState,
}

impl<V, S> OneTimeSampling<V, S>
where
    V: Clone + Eq + Hash + Send + 'static,
    S: SampleSource<V>,
{
    pub fn new(
        targets: impl IntoIterator<Item = ElementId>,
        source: S,
        config: SamplerConfig,
    ) -> Self {
        Self {
            num_samples: config.num_samples,
            core: SamplingCore::new(targets, source, &config),
            state: LifecycleState::Created,
        }
    }

    pub fn with_hooks(mut self, hooks: HookStack) -> Self {
        self.core = self.core.with_hooks(hooks);
        self
    }

    /// Samples accumulated by the completed run.
    pub fn samples_seen(&self) -> Result<u64, AlgorithmError> {
        self.guard()?;
        Ok(self.core.accumulator().samples_seen())
    }

    fn run(&mut self) -> Result<(), AlgorithmError> {
        for _ in 0..self.num_samples {
            self.core.step()?;
        }
        Ok(())
    }

    fn guard(&self) -> Result<(), AlgorithmError> {
        match self.state {
            LifecycleState::Running => Ok(()),
            LifecycleState::Killed => Err(AlgorithmError::Killed),
            state => Err(AlgorithmError::InvalidState { op: "query", state }),
        }
    }
}

impl<V, S> Algorithm for OneTimeSampling<V, S>
where
    V: Clone + Eq + Hash + Send + 'static,
    S: SampleSource<V>,
{
    fn state(&self) -> LifecycleState {
        self.state
    }

    fn start(&mut self) -> Result<(), AlgorithmError> {
        self.state.ensure("start", &[LifecycleState::Created])?;
        self.core.begin().map_err(AlgorithmError::InitFailed)?;
        log::debug!("Starting one-time run of {} samples", self.num_samples);
        match self.run() {
            Ok(()) => {
                self.state = LifecycleState::Running;
                Ok(())
            }
            Err(error) => {
                log::error!("One-time run aborted: {error}");
                self.core.teardown();
                self.state = LifecycleState::Killed;
                Err(error)
            }
        }
    }

    fn stop(&mut self) -> Result<(), AlgorithmError> {
        Err(AlgorithmError::InvalidState {
            op: "stop",
            state: self.state,
        })
    }

    fn resume(&mut self) -> Result<(), AlgorithmError> {
        Err(AlgorithmError::InvalidState {
            op: "resume",
            state: self.state,
        })
    }

    fn kill(&mut self) -> Result<(), AlgorithmError> {
        self.state
            .ensure("kill", &[LifecycleState::Running, LifecycleState::Stopped])?;
        self.core.teardown();
        self.state = LifecycleState::Killed;
        Ok(())
    }
}

impl<V, S> QueryAlgorithm<V> for OneTimeSampling<V, S>
where
    V: Clone + Eq + Hash + Send + 'static,
    S: SampleSource<V>,
{
    fn distribution(&self, element: ElementId) -> Result<Distribution<V>, AlgorithmError> {
        self.guard()?;
        self.core.accumulator().distribution(element)
    }

    fn expectation<F>(&self, element: ElementId, value_to_number: F) -> Result<f64, AlgorithmError>
    where
        F: Fn(&V) -> f64 + Send + 'static,
    {
        self.guard()?;
        self.core.accumulator().expectation(element, value_to_number)
    }

    fn probability<F>(&self, element: ElementId, predicate: F) -> Result<f64, AlgorithmError>
    where
        F: Fn(&V) -> bool + Send + 'static,
    {
        self.guard()?;
        self.core.accumulator().probability(element, predicate)
    }
}
