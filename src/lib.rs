pub mod bits;
pub mod circuit_builder;
pub mod components;
pub mod definition;
pub mod diagnostics;
pub mod error;
pub mod loader;
pub mod parser;
pub mod truth_table;

mod circuit;
pub use circuit::{evaluate_output, Circuit, Context, EvalOptions, SubcircuitMode};
pub use definition::CircuitDefinition;
pub use error::EvalError;
