use std::hash::Hash;

use credal_core::ElementId;

use crate::algorithm::Algorithm;
use crate::anytime::{AnytimeAlgorithm, AnytimeRunner};
use crate::config::SamplerConfig;
use crate::error::{AlgorithmError, StepError};
use crate::lifecycle::LifecycleState;
use crate::sampling::SamplingCore;
use crate::source::SampleSource;

/// Service requests of the most-probable-explanation category.
///
/// A category owns its own service/response pair; the worker transport is
/// generic over the mapping, so this category required no change to
/// [`AnytimeRunner`].
pub enum MpeService {
    MostLikely(ElementId),
}

pub enum MpeResponse<V> {
    MostLikely(Option<V>),
}

struct MpeWorker<V, S> {
    core: SamplingCore<V, S>,
}

impl<V, S> AnytimeAlgorithm for MpeWorker<V, S>
where
    V: Clone + Eq + Hash + Send + 'static,
    S: SampleSource<V> + 'static,
{
    type Service = MpeService;
    type Response = MpeResponse<V>;

    fn initialize(&mut self) -> anyhow::Result<()> {
        self.core.begin()
    }

    fn run_step(&mut self) -> Result<(), StepError> {
        self.core.step()
    }

    fn handle(&mut self, service: Self::Service) -> Result<Self::Response, AlgorithmError> {
        match service {
            MpeService::MostLikely(element) => self
                .core
                .accumulator()
                .most_likely(element)
                .map(MpeResponse::MostLikely),
        }
    }

    fn cleanup(&mut self) {
        self.core.teardown();
    }
}

/// Anytime most-probable-explanation by sampling: tracks, per target
/// element, the value with the greatest accumulated mass.
pub struct AnytimeMpe<V, S>
where
    V: Clone + Eq + Hash + Send + 'static,
    S: SampleSource<V> + 'static,
{
    runner: AnytimeRunner<MpeWorker<V, S>>,
}

impl<V, S> AnytimeMpe<V, S>
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
            runner: AnytimeRunner::new(MpeWorker {
                core: SamplingCore::new(targets, source, &config),
            }),
        }
    }

    /// The most likely value of `element` under the samples drawn so far,
    /// or `None` before the first contributing sample.
    pub fn most_likely_value(&self, element: ElementId) -> Result<Option<V>, AlgorithmError> {
        let MpeResponse::MostLikely(value) = self.runner.call(MpeService::MostLikely(element))?;
        Ok(value)
    }
}

impl<V, S> Algorithm for AnytimeMpe<V, S>
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ForwardSource;
    use credal_core::InMemoryUniverse;
    use std::sync::Arc;

    #[test]
    fn most_likely_value_follows_the_heaviest_outcome() {
        let mut universe = InMemoryUniverse::new();
        let biased = universe.select(vec![(0.9, "left"), (0.1, "right")]);
        let source = ForwardSource::new(Arc::new(universe), [biased]);
        let mut mpe = AnytimeMpe::new([biased], source, SamplerConfig::new(0).with_seed(11));

        mpe.start().unwrap();
        // Let the worker take some steps before asking.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while mpe.most_likely_value(biased).unwrap().is_none() {
            assert!(std::time::Instant::now() < deadline, "worker never stepped");
            std::thread::yield_now();
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(mpe.most_likely_value(biased).unwrap(), Some("left"));
        mpe.kill().unwrap();
    }

    #[test]
    fn queries_after_kill_fail() {
        let mut universe = InMemoryUniverse::new();
        let flip = universe.flip(0.5);
        let source = ForwardSource::new(Arc::new(universe), [flip]);
        let mut mpe = AnytimeMpe::new([flip], source, SamplerConfig::default().with_seed(3));

        mpe.start().unwrap();
        mpe.kill().unwrap();
        assert!(matches!(
            mpe.most_likely_value(flip),
            Err(AlgorithmError::Killed)
        ));
    }
}
