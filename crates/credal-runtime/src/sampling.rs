use std::hash::Hash;

use credal_core::{Distribution, ElementId};
use rand::rngs::StdRng;

use crate::accumulator::SampleAccumulator;
use crate::algorithm::{Algorithm, QueryAlgorithm};
use crate::anytime::{AnytimeAlgorithm, AnytimeRunner};
use crate::config::SamplerConfig;
use crate::error::{AlgorithmError, StepError};
use crate::lifecycle::{HookStack, LifecycleState};
use crate::source::SampleSource;

/// Service requests understood by the sampling algorithm family.
pub enum SamplingService<V> {
    Distribution(ElementId),
    Expectation(ElementId, Box<dyn Fn(&V) -> f64 + Send>),
    Probability(ElementId, Box<dyn Fn(&V) -> bool + Send>),
    SampleCount,
}

/// Responses paired tag-for-tag with [`SamplingService`].
pub enum SamplingResponse<V> {
    Distribution(Distribution<V>),
    Expectation(f64),
    Probability(f64),
    SampleCount(u64),
}

/// The stepping state shared by every sampling-based algorithm: draw one
/// sample from the source, fold it into the accumulator.
pub struct SamplingCore<V, S> {
    source: S,
    accumulator: SampleAccumulator<V>,
    rng: StdRng,
    hooks: HookStack,
}

impl<V, S> SamplingCore<V, S>
where
    V: Clone + Eq + Hash + Send + 'static,
    S: SampleSource<V>,
{
    pub fn new(
        targets: impl IntoIterator<Item = ElementId>,
        source: S,
        config: &SamplerConfig,
    ) -> Self {
        Self {
            source,
            accumulator: SampleAccumulator::new(targets),
            rng: config.rng(),
            hooks: HookStack::new(),
        }
    }

    pub fn with_hooks(mut self, hooks: HookStack) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn accumulator(&self) -> &SampleAccumulator<V> {
        &self.accumulator
    }

    /// Initialize hooks outer→inner, then start from empty statistics.
    pub(crate) fn begin(&mut self) -> anyhow::Result<()> {
        self.hooks.initialize_all()?;
        self.accumulator.reset_counts();
        Ok(())
    }

    pub(crate) fn step(&mut self) -> Result<(), StepError> {
        let sample = self.source.draw(&mut self.rng)?;
        self.accumulator.accumulate(&sample);
        Ok(())
    }

    /// Cleanup hooks inner→outer, then release the accumulated state.
    pub(crate) fn teardown(&mut self) {
        self.hooks.cleanup_all();
        self.accumulator.reset_counts();
    }
}

impl<V, S> AnytimeAlgorithm for SamplingCore<V, S>
where
    V: Clone + Eq + Hash + Send + 'static,
    S: SampleSource<V> + 'static,
{
    type Service = SamplingService<V>;
    type Response = SamplingResponse<V>;

    fn initialize(&mut self) -> anyhow::Result<()> {
        self.begin()
    }

    fn run_step(&mut self) -> Result<(), StepError> {
        self.step()
    }

    fn handle(&mut self, service: Self::Service) -> Result<Self::Response, AlgorithmError> {
        match service {
            SamplingService::Distribution(element) => self
                .accumulator
                .distribution(element)
                .map(SamplingResponse::Distribution),
            SamplingService::Expectation(element, value_to_number) => self
                .accumulator
                .expectation(element, |value| value_to_number(value))
                .map(SamplingResponse::Expectation),
            SamplingService::Probability(element, predicate) => self
                .accumulator
                .probability(element, |value| predicate(value))
                .map(SamplingResponse::Probability),
            SamplingService::SampleCount => {
                Ok(SamplingResponse::SampleCount(self.accumulator.samples_seen()))
            }
        }
    }

    fn cleanup(&mut self) {
        self.teardown();
    }
}

/// Anytime sampling: one draw per step on a background worker, queryable
/// after any step.
pub struct AnytimeSampling<V, S>
where
    V: Clone + Eq + Hash + Send + 'static,
    S: SampleSource<V> + 'static,
{
    runner: AnytimeRunner<SamplingCore<V, S>>,
}

impl<V, S> AnytimeSampling<V, S>
where
    V: Clone + Eq + Hash + Send + 'static,
    S: SampleSource<V> + 'static,
{
    pub fn new(
        targets: impl IntoIterator<Item = ElementId>,
        source: S,
        config: SamplerConfig,
    ) -> Self {
        Self {
            runner: AnytimeRunner::new(SamplingCore::new(targets, source, &config)),
        }
    }

    /// Wraps an already-configured core, e.g. one carrying lifecycle hooks.
    pub fn from_core(core: SamplingCore<V, S>) -> Self {
        Self {
            runner: AnytimeRunner::new(core),
        }
    }

    /// Samples accumulated so far; monotone across a stop/resume cycle.
    pub fn samples_seen(&self) -> Result<u64, AlgorithmError> {
        match self.runner.call(SamplingService::SampleCount)? {
            SamplingResponse::SampleCount(count) => Ok(count),
            _ => Err(AlgorithmError::Unexpected(
                "mismatched response tag".to_string(),
            )),
        }
    }
}

impl<V, S> Algorithm for AnytimeSampling<V, S>
where
    V: Clone + Eq + Hash + Send + 'static,
    S: SampleSource<V> + 'static,
{
    fn state(&self) -> LifecycleState {
        self.runner.state()
    }

    fn start(&mut self) -> Result<(), AlgorithmError> {
        self.runner.start()
    }

    fn stop(&mut self) -> Result<(), AlgorithmError> {
        self.runner.stop()
    }

    fn resume(&mut self) -> Result<(), AlgorithmError> {
        self.runner.resume()
    }

    fn kill(&mut self) -> Result<(), AlgorithmError> {
        self.runner.kill()
    }
}

impl<V, S> QueryAlgorithm<V> for AnytimeSampling<V, S>
where
    V: Clone + Eq + Hash + Send + 'static,
    S: SampleSource<V> + 'static,
{
    fn distribution(&self, element: ElementId) -> Result<Distribution<V>, AlgorithmError> {
        match self.runner.call(SamplingService::Distribution(element))? {
            SamplingResponse::Distribution(distribution) => Ok(distribution),
            _ => Err(AlgorithmError::Unexpected(
                "mismatched response tag".to_string(),
            )),
        }
    }

    fn expectation<F>(&self, element: ElementId, value_to_number: F) -> Result<f64, AlgorithmError>
    where
        F: Fn(&V) -> f64 + Send + 'static,
    {
        match self
            .runner
            .call(SamplingService::Expectation(element, Box::new(value_to_number)))?
        {
            SamplingResponse::Expectation(value) => Ok(value),
            _ => Err(AlgorithmError::Unexpected(
                "mismatched response tag".to_string(),
            )),
        }
    }

    fn probability<F>(&self, element: ElementId, predicate: F) -> Result<f64, AlgorithmError>
    where
        F: Fn(&V) -> bool + Send + 'static,
    {
        match self
            .runner
            .call(SamplingService::Probability(element, Box::new(predicate)))?
        {
            SamplingResponse::Probability(value) => Ok(value),
            _ => Err(AlgorithmError::Unexpected(
                "mismatched response tag".to_string(),
            )),
        }
    }
}
