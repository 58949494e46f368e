pub mod dispatch;
pub mod element;
pub mod sample;
pub mod universe;
pub mod values;

mod distribution;

pub use crate::dispatch::ValueDispatcher;
pub use crate::distribution::Distribution;
pub use crate::element::{Constant, Element, ElementId, Flip, Generative, Select, ValueSource};
pub use crate::sample::Sample;
pub use crate::universe::{InMemoryUniverse, Universe};
pub use crate::values::{EnumBudget, ValueSet};
