use std::collections::HashMap;
use std::sync::Arc;

use credal_core::{ElementId, Sample, Universe};
use rand::rngs::StdRng;

use crate::error::StepError;

/// Strategy producing one sample per invocation.
///
/// Any `FnMut(&mut StdRng) -> Result<Sample<V>, StepError>` closure is a
/// source, so tests and custom proposal schemes plug in without a named
/// type.
pub trait SampleSource<V>: Send {
    fn draw(&mut self, rng: &mut StdRng) -> Result<Sample<V>, StepError>;
}

impl<V, F> SampleSource<V> for F
where
    F: FnMut(&mut StdRng) -> Result<Sample<V>, StepError> + Send,
{
    fn draw(&mut self, rng: &mut StdRng) -> Result<Sample<V>, StepError> {
        self(rng)
    }
}

/// Draws every target element through its sample-generating capability.
pub struct ForwardSource<U> {
    universe: Arc<U>,
    targets: Vec<ElementId>,
}

impl<U> ForwardSource<U> {
    pub fn new(universe: Arc<U>, targets: impl IntoIterator<Item = ElementId>) -> Self {
        Self {
            universe,
            targets: targets.into_iter().collect(),
        }
    }

    /// A source drawing every element currently active in the universe.
    pub fn over_active<V>(universe: Arc<U>) -> Self
    where
        U: Universe<V>,
    {
        let targets = universe.active_elements();
        Self { universe, targets }
    }
}

impl<V, U> SampleSource<V> for ForwardSource<U>
where
    U: Universe<V>,
{
    fn draw(&mut self, rng: &mut StdRng) -> Result<Sample<V>, StepError> {
        let mut values = HashMap::with_capacity(self.targets.len());
        for &target in &self.targets {
            let element = self
                .universe
                .element(target)
                .ok_or(StepError::Inactive(target))?;
            let generator = element
                .generator()
                .ok_or(StepError::NotGenerative(target))?;
            values.insert(target, generator.generate(rng));
        }
        Ok(Sample::new(values))
    }
}

/// Decorates a source with an importance weight computed per sample.
pub struct Reweighted<S, F> {
    inner: S,
    weight: F,
}

impl<S, F> Reweighted<S, F> {
    pub fn new(inner: S, weight: F) -> Self {
        Self { inner, weight }
    }
}

impl<V, S, F> SampleSource<V> for Reweighted<S, F>
where
    S: SampleSource<V>,
    F: Fn(&Sample<V>) -> f64 + Send,
{
    fn draw(&mut self, rng: &mut StdRng) -> Result<Sample<V>, StepError> {
        let sample = self.inner.draw(rng)?;
        let weight = (self.weight)(&sample);
        Ok(sample.reweighted(weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credal_core::InMemoryUniverse;
    use rand::SeedableRng;

    #[test]
    fn forward_source_draws_all_targets() {
        let mut universe = InMemoryUniverse::new();
        let a = universe.constant('a');
        let b = universe.constant('b');
        let mut source = ForwardSource::new(Arc::new(universe), [a, b]);

        let mut rng = StdRng::seed_from_u64(0);
        let sample = source.draw(&mut rng).unwrap();
        assert_eq!(sample.get(a), Some(&'a'));
        assert_eq!(sample.get(b), Some(&'b'));
        assert_eq!(sample.weight(), 1.0);
    }

    #[test]
    fn over_active_covers_the_whole_universe() {
        let mut universe = InMemoryUniverse::new();
        let a = universe.constant(0u8);
        let b = universe.constant(1u8);
        let mut source = ForwardSource::over_active(Arc::new(universe));

        let mut rng = StdRng::seed_from_u64(0);
        let sample = source.draw(&mut rng).unwrap();
        assert_eq!(sample.len(), 2);
        assert!(sample.get(a).is_some() && sample.get(b).is_some());
    }

    #[test]
    fn missing_element_is_a_step_error() {
        let universe = InMemoryUniverse::<char>::new();
        let mut source = ForwardSource::new(Arc::new(universe), [ElementId(5)]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            source.draw(&mut rng),
            Err(StepError::Inactive(ElementId(5)))
        ));
    }

    #[test]
    fn reweighted_source_attaches_weights() {
        let mut universe = InMemoryUniverse::new();
        let a = universe.constant(1u8);
        let inner = ForwardSource::new(Arc::new(universe), [a]);
        let mut source = Reweighted::new(inner, |_: &Sample<u8>| 0.5);

        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(source.draw(&mut rng).unwrap().weight(), 0.5);
    }

    #[test]
    fn closures_are_sources() {
        let mut source = |_rng: &mut StdRng| Ok(Sample::single(ElementId(0), 7u8));
        let mut rng = StdRng::seed_from_u64(0);
        let sample = SampleSource::draw(&mut source, &mut rng).unwrap();
        assert_eq!(sample.get(ElementId(0)), Some(&7));
    }
}
