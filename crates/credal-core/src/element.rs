use std::any::Any;

use derive_more::{Display, From};
use rand::Rng;
use rand::rngs::StdRng;

use crate::values::{EnumBudget, ValueSet};

/// Opaque handle to one element of a model universe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
pub struct ElementId(pub u64);

/// One random quantity in a model, referenced opaquely by the runtime.
///
/// The runtime never inspects model structure directly. What an element kind
/// can do is exposed through the two capability accessors: [`value_source`]
/// for enumerating possible values and [`generator`] for drawing one. Kinds
/// defined outside this crate participate in existing algorithms simply by
/// overriding them.
///
/// [`value_source`]: Element::value_source
/// [`generator`]: Element::generator
pub trait Element<V>: Send + Sync {
    fn id(&self) -> ElementId;

    /// Downcasting hook used by the built-in kind handlers of
    /// [`ValueDispatcher`](crate::ValueDispatcher).
    fn as_any(&self) -> &dyn Any;

    /// The generic value-producing capability, if this kind supports it.
    fn value_source(&self) -> Option<&dyn ValueSource<V>> {
        None
    }

    /// The sample-generating capability, if this kind supports it.
    fn generator(&self) -> Option<&dyn Generative<V>> {
        None
    }
}

/// Capability of enumerating an element's possible values within a budget.
pub trait ValueSource<V> {
    fn enumerate(&self, budget: &EnumBudget) -> ValueSet<V>;
}

/// Capability of drawing one value of an element at random.
pub trait Generative<V> {
    fn generate(&self, rng: &mut StdRng) -> V;
}

/// An element whose value is a single known constant.
pub struct Constant<V> {
    id: ElementId,
    value: V,
}

impl<V> Constant<V> {
    pub fn new(id: ElementId, value: V) -> Self {
        Self { id, value }
    }

    pub fn value(&self) -> &V {
        &self.value
    }
}

impl<V: Clone + Send + Sync + 'static> Element<V> for Constant<V> {
    fn id(&self) -> ElementId {
        self.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn generator(&self) -> Option<&dyn Generative<V>> {
        Some(self)
    }
}

impl<V: Clone> Generative<V> for Constant<V> {
    fn generate(&self, _rng: &mut StdRng) -> V {
        self.value.clone()
    }
}

/// A finite weighted choice over explicitly listed outcomes.
pub struct Select<V> {
    id: ElementId,
    outcomes: Vec<(f64, V)>,
    total_weight: f64,
}

impl<V> Select<V> {
    pub fn new(id: ElementId, outcomes: Vec<(f64, V)>) -> Self {
        let total_weight = outcomes.iter().map(|(w, _)| w.max(0.0)).sum();
        Self {
            id,
            outcomes,
            total_weight,
        }
    }

    pub fn outcomes(&self) -> &[(f64, V)] {
        &self.outcomes
    }
}

impl<V: Clone + Send + Sync + 'static> Element<V> for Select<V> {
    fn id(&self) -> ElementId {
        self.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn generator(&self) -> Option<&dyn Generative<V>> {
        Some(self)
    }
}

impl<V: Clone> Generative<V> for Select<V> {
    fn generate(&self, rng: &mut StdRng) -> V {
        let target = rng.random::<f64>() * self.total_weight;
        let mut cumulative = 0.0;
        for (weight, value) in &self.outcomes {
            cumulative += weight.max(0.0);
            if target < cumulative {
                return value.clone();
            }
        }
        // Floating-point round-off can leave target == total_weight.
        self.outcomes
            .last()
            .map(|(_, value)| value.clone())
            .expect("Select must have at least one outcome")
    }
}

/// A Bernoulli element over `bool`.
///
/// `Flip` deliberately has no built-in dispatcher handler: it participates
/// through the generic capability interfaces, exercising the same path an
/// externally defined kind would take.
pub struct Flip {
    id: ElementId,
    probability: f64,
}

impl Flip {
    pub fn new(id: ElementId, probability: f64) -> Self {
        Self {
            id,
            probability: probability.clamp(0.0, 1.0),
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl Element<bool> for Flip {
    fn id(&self) -> ElementId {
        self.id
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value_source(&self) -> Option<&dyn ValueSource<bool>> {
        Some(self)
    }

    fn generator(&self) -> Option<&dyn Generative<bool>> {
        Some(self)
    }
}

impl ValueSource<bool> for Flip {
    fn enumerate(&self, _budget: &EnumBudget) -> ValueSet<bool> {
        ValueSet::Complete(vec![true, false])
    }
}

impl Generative<bool> for Flip {
    fn generate(&self, rng: &mut StdRng) -> bool {
        rng.random_bool(self.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn constant_generates_its_value() {
        let mut rng = StdRng::seed_from_u64(0);
        let c = Constant::new(ElementId(0), "on");
        assert_eq!(c.generate(&mut rng), "on");
    }

    #[test]
    fn select_respects_weights() {
        let mut rng = StdRng::seed_from_u64(7);
        let s = Select::new(ElementId(1), vec![(0.0, 'a'), (1.0, 'b')]);
        for _ in 0..100 {
            assert_eq!(s.generate(&mut rng), 'b');
        }
    }

    #[test]
    fn flip_enumerates_both_outcomes() {
        let f = Flip::new(ElementId(2), 0.3);
        let set = f
            .value_source()
            .expect("flip exposes a value source")
            .enumerate(&EnumBudget::default());
        assert!(set.is_complete());
        assert_eq!(set.values(), &[true, false]);
    }
}
