use crate::element::{Constant, Element, Select};
use crate::values::{EnumBudget, ValueSet};

type KindHandler<V> = Box<dyn Fn(&dyn Element<V>, &EnumBudget) -> Option<ValueSet<V>> + Send + Sync>;

struct NamedHandler<V> {
    name: String,
    handler: KindHandler<V>,
}

/// Resolves the possible values of an element by ordered fallback.
///
/// Resolution checks, in priority order: the registered kind handlers
/// (recognizing concrete element types by downcast), then the element's own
/// [`ValueSource`](crate::ValueSource) capability, and finally falls back to
/// [`ValueSet::unknown`]. The fallback is a value, never an error, so
/// algorithms proceed best-effort over elements they cannot enumerate.
///
/// New element kinds defined outside this crate need no change here: they
/// implement the capability interface, or register a handler of their own to
/// join the fast path.
pub struct ValueDispatcher<V> {
    handlers: Vec<NamedHandler<V>>,
}

impl<V: Clone + Send + Sync + 'static> ValueDispatcher<V> {
    /// An empty dispatcher with no kind handlers.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// A dispatcher recognizing the built-in element kinds.
    pub fn with_builtins() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register("constant", |element, _budget| {
            element
                .as_any()
                .downcast_ref::<Constant<V>>()
                .map(|constant| ValueSet::Complete(vec![constant.value().clone()]))
        });
        dispatcher.register("select", |element, _budget| {
            element.as_any().downcast_ref::<Select<V>>().map(|select| {
                ValueSet::Complete(
                    select
                        .outcomes()
                        .iter()
                        .map(|(_, value)| value.clone())
                        .collect(),
                )
            })
        });
        dispatcher
    }

    /// Appends a kind handler at the end of the priority order.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&dyn Element<V>, &EnumBudget) -> Option<ValueSet<V>> + Send + Sync + 'static,
    ) -> &mut Self {
        let name = name.into();
        log::debug!("Registering kind handler '{name}'");
        self.handlers.push(NamedHandler {
            name,
            handler: Box::new(handler),
        });
        self
    }

    /// The possible values of `element`, within `budget`.
    pub fn concrete_values(&self, element: &dyn Element<V>, budget: &EnumBudget) -> ValueSet<V> {
        for entry in &self.handlers {
            if let Some(set) = (entry.handler)(element, budget) {
                log::debug!(
                    "Element {} resolved by kind handler '{}'",
                    element.id(),
                    entry.name
                );
                return set;
            }
        }
        if let Some(source) = element.value_source() {
            log::debug!("Element {} resolved by its value source", element.id());
            return source.enumerate(budget);
        }
        log::debug!(
            "Element {} matched no kind handler or capability; proceeding with unknown values",
            element.id()
        );
        ValueSet::unknown()
    }
}

impl<V: Clone + Send + Sync + 'static> Default for ValueDispatcher<V> {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementId, Flip, ValueSource};
    use std::any::Any;

    struct Opaque(ElementId);

    impl Element<bool> for Opaque {
        fn id(&self) -> ElementId {
            self.0
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn builtin_kind_resolves_to_complete_singleton() {
        let dispatcher = ValueDispatcher::with_builtins();
        let element = Constant::new(ElementId(0), 42u32);
        let set = dispatcher.concrete_values(&element, &EnumBudget::default());
        assert_eq!(set, ValueSet::Complete(vec![42]));
    }

    #[test]
    fn select_resolves_to_all_outcomes() {
        let dispatcher = ValueDispatcher::with_builtins();
        let element = Select::new(ElementId(1), vec![(0.2, 'x'), (0.8, 'y')]);
        let set = dispatcher.concrete_values(&element, &EnumBudget::default());
        assert_eq!(set, ValueSet::Complete(vec!['x', 'y']));
    }

    #[test]
    fn capability_implementor_is_deferred_to() {
        let dispatcher = ValueDispatcher::with_builtins();
        let element = Flip::new(ElementId(2), 0.5);
        let set = dispatcher.concrete_values(&element, &EnumBudget::default());
        assert_eq!(set, ValueSet::Complete(vec![true, false]));
    }

    #[test]
    fn unmatched_element_yields_unknown_without_error() {
        let dispatcher = ValueDispatcher::with_builtins();
        let element = Opaque(ElementId(3));
        let set = dispatcher.concrete_values(&element, &EnumBudget::default());
        assert!(set.is_unknown());
    }

    #[test]
    fn registered_handler_takes_priority_over_capability() {
        let mut dispatcher = ValueDispatcher::<bool>::with_builtins();
        dispatcher.register("flip_pinned", |element, _| {
            element
                .as_any()
                .downcast_ref::<Flip>()
                .map(|_| ValueSet::Complete(vec![true]))
        });
        let element = Flip::new(ElementId(4), 0.5);
        let set = dispatcher.concrete_values(&element, &EnumBudget::default());
        assert_eq!(set, ValueSet::Complete(vec![true]));
    }

    #[test]
    fn budget_is_threaded_through_to_capabilities() {
        struct Counting(ElementId);

        impl ValueSource<bool> for Counting {
            fn enumerate(&self, budget: &EnumBudget) -> ValueSet<bool> {
                if budget.samples == 0 {
                    ValueSet::unknown()
                } else {
                    ValueSet::Complete(vec![true, false])
                }
            }
        }

        impl Element<bool> for Counting {
            fn id(&self) -> ElementId {
                self.0
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn value_source(&self) -> Option<&dyn ValueSource<bool>> {
                Some(self)
            }
        }

        let dispatcher = ValueDispatcher::with_builtins();
        let element = Counting(ElementId(5));
        assert!(
            dispatcher
                .concrete_values(&element, &EnumBudget::new(1, 0))
                .is_unknown()
        );
        assert!(
            dispatcher
                .concrete_values(&element, &EnumBudget::default())
                .is_complete()
        );
    }
}
