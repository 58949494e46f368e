use std::cmp::Ordering;

/// A lazily-produced, possibly unbounded sequence of (probability, value)
/// pairs for one element.
///
/// A distribution is a snapshot: it is derived on demand from the producing
/// algorithm's state and never mutated afterwards. Re-querying the algorithm
/// produces a fresh sequence reflecting its current state.
pub struct Distribution<V> {
    inner: Box<dyn Iterator<Item = (f64, V)> + Send>,
}

impl<V: Send + 'static> Distribution<V> {
    pub fn new(iter: impl Iterator<Item = (f64, V)> + Send + 'static) -> Self {
        Self {
            inner: Box::new(iter),
        }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Normalizes a finite collection of weighted values into a distribution
    /// ordered by decreasing probability.
    ///
    /// Non-positive total mass yields the empty distribution.
    pub fn from_weighted(pairs: Vec<(f64, V)>) -> Self {
        let total: f64 = pairs.iter().map(|(weight, _)| weight).sum();
        if total <= 0.0 {
            return Self::empty();
        }
        let mut normalized: Vec<(f64, V)> = pairs
            .into_iter()
            .map(|(weight, value)| (weight / total, value))
            .collect();
        normalized.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        Self::new(normalized.into_iter())
    }
}

impl<V> Iterator for Distribution<V> {
    type Item = (f64, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
