use std::collections::HashMap;
use std::hash::Hash;

use credal_core::{Distribution, ElementId, Sample};

use crate::error::AlgorithmError;

/// Running per-element statistics over accumulated samples.
///
/// Weighted and unweighted samples flow through one code path: an
/// unweighted sample simply carries weight 1.0, so counts and weighted sums
/// are the same accumulation. Queries derive fresh snapshots and never
/// mutate the statistics.
pub struct SampleAccumulator<V> {
    targets: Vec<ElementId>,
    mass: HashMap<ElementId, HashMap<V, f64>>,
    totals: HashMap<ElementId, f64>,
    samples_seen: u64,
}

impl<V> SampleAccumulator<V>
where
    V: Clone + Eq + Hash + Send + 'static,
{
    pub fn new(targets: impl IntoIterator<Item = ElementId>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            mass: HashMap::new(),
            totals: HashMap::new(),
            samples_seen: 0,
        }
    }

    pub fn targets(&self) -> &[ElementId] {
        &self.targets
    }

    pub fn is_target(&self, element: ElementId) -> bool {
        self.targets.contains(&element)
    }

    /// Number of `accumulate` calls since the last reset. Monotone across a
    /// stop/resume cycle.
    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    /// Discards all accumulated statistics.
    pub fn reset_counts(&mut self) {
        self.mass.clear();
        self.totals.clear();
        self.samples_seen = 0;
    }

    /// Folds one sample's contribution into the per-element statistics.
    /// Values for elements outside the target set are ignored.
    pub fn accumulate(&mut self, sample: &Sample<V>) {
        let weight = sample.weight();
        for &target in &self.targets {
            if let Some(value) = sample.get(target) {
                *self
                    .mass
                    .entry(target)
                    .or_default()
                    .entry(value.clone())
                    .or_insert(0.0) += weight;
                *self.totals.entry(target).or_insert(0.0) += weight;
            }
        }
        self.samples_seen += 1;
    }

    fn ensure_target(&self, element: ElementId) -> Result<(), AlgorithmError> {
        if self.is_target(element) {
            Ok(())
        } else {
            Err(AlgorithmError::NotATarget(element))
        }
    }

    /// A fresh distribution snapshot for `element`.
    pub fn distribution(&self, element: ElementId) -> Result<Distribution<V>, AlgorithmError> {
        self.ensure_target(element)?;
        let pairs = self
            .mass
            .get(&element)
            .map(|per_value| {
                per_value
                    .iter()
                    .map(|(value, weight)| (*weight, value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Distribution::from_weighted(pairs))
    }

    /// Weighted mean of `value_to_number` over the accumulated values.
    /// Zero accumulated mass yields 0.0.
    pub fn expectation(
        &self,
        element: ElementId,
        value_to_number: impl Fn(&V) -> f64,
    ) -> Result<f64, AlgorithmError> {
        self.ensure_target(element)?;
        let total = self.totals.get(&element).copied().unwrap_or(0.0);
        if total <= 0.0 {
            return Ok(0.0);
        }
        let sum: f64 = self
            .mass
            .get(&element)
            .map(|per_value| {
                per_value
                    .iter()
                    .map(|(value, weight)| value_to_number(value) * weight)
                    .sum()
            })
            .unwrap_or(0.0);
        Ok(sum / total)
    }

    /// Accumulated mass fraction of values satisfying `predicate`.
    pub fn probability(
        &self,
        element: ElementId,
        predicate: impl Fn(&V) -> bool,
    ) -> Result<f64, AlgorithmError> {
        self.expectation(element, |value| if predicate(value) { 1.0 } else { 0.0 })
    }

    /// The value with the greatest accumulated mass, if any mass exists.
    pub fn most_likely(&self, element: ElementId) -> Result<Option<V>, AlgorithmError> {
        self.ensure_target(element)?;
        Ok(self.mass.get(&element).and_then(|per_value| {
            per_value
                .iter()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(value, _)| value.clone())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulator() -> SampleAccumulator<bool> {
        SampleAccumulator::new([ElementId(0)])
    }

    #[test]
    fn counts_unweighted_samples() {
        let mut acc = accumulator();
        acc.accumulate(&Sample::single(ElementId(0), true));
        acc.accumulate(&Sample::single(ElementId(0), true));
        acc.accumulate(&Sample::single(ElementId(0), false));

        assert_eq!(acc.samples_seen(), 3);
        let dist: Vec<_> = acc.distribution(ElementId(0)).unwrap().collect();
        assert_eq!(dist[0], (2.0 / 3.0, true));
        assert_eq!(dist[1], (1.0 / 3.0, false));
    }

    #[test]
    fn weighted_samples_shift_the_distribution() {
        let mut acc = accumulator();
        acc.accumulate(&Sample::single(ElementId(0), true).reweighted(3.0));
        acc.accumulate(&Sample::single(ElementId(0), false));

        let p = acc.probability(ElementId(0), |v| *v).unwrap();
        assert!((p - 0.75).abs() < 1e-12);
    }

    #[test]
    fn reset_discards_everything() {
        let mut acc = accumulator();
        acc.accumulate(&Sample::single(ElementId(0), true));
        acc.reset_counts();
        assert_eq!(acc.samples_seen(), 0);
        assert_eq!(acc.distribution(ElementId(0)).unwrap().count(), 0);
    }

    #[test]
    fn non_target_queries_fail() {
        let acc = accumulator();
        assert!(matches!(
            acc.distribution(ElementId(9)),
            Err(AlgorithmError::NotATarget(ElementId(9)))
        ));
    }

    #[test]
    fn expectation_of_empty_statistics_is_zero() {
        let acc = accumulator();
        assert_eq!(acc.expectation(ElementId(0), |_| 1.0).unwrap(), 0.0);
        assert_eq!(acc.most_likely(ElementId(0)).unwrap(), None);
    }

    #[test]
    fn most_likely_tracks_the_heaviest_value() {
        let mut acc = accumulator();
        acc.accumulate(&Sample::single(ElementId(0), false));
        acc.accumulate(&Sample::single(ElementId(0), true).reweighted(2.5));
        assert_eq!(acc.most_likely(ElementId(0)).unwrap(), Some(true));
    }
}
