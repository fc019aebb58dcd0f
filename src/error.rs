//! Error types for parsing, loading and evaluating circuit definitions.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while assembling a definition from records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// The definition never declared which pin it outputs.
    #[error("circuit has no `Out` record")]
    MissingOutput,
}

/// Errors raised while parsing the line-oriented circuit text format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required `key=value` field was absent from a record.
    #[error("line {line}: `{record}` record is missing field `{field}`")]
    MissingField {
        line: usize,
        record: &'static str,
        field: &'static str,
    },

    /// An index or width field was not a non-negative integer no larger than
    /// [`MAX_BIT_INDEX`](crate::parser::MAX_BIT_INDEX).
    #[error("line {line}: invalid number `{value}` for field `{field}`")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// A bit value was not one of `0`, `1`, `true`, `false`.
    #[error("line {line}: invalid bit value `{value}`")]
    InvalidBit { line: usize, value: String },

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Errors raised by a [`DefinitionLoader`](crate::loader::DefinitionLoader).
#[derive(Debug, Error)]
pub enum LoadError {
    /// No definition exists for the type name.
    #[error("no definition for subcircuit type `{0}`")]
    NotFound(String),

    /// The type name cannot name a definition (e.g. it contains a path separator).
    #[error("`{0}` is not a valid subcircuit type name")]
    InvalidName(String),

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse definition of `{type_name}`")]
    Parse {
        type_name: String,
        #[source]
        source: ParseError,
    },
}

/// Errors that abort an evaluation.
///
/// Unresolved pin references are not errors: they degrade to a single `false`
/// bit and are reported through the
/// [`DiagnosticSink`](crate::diagnostics::DiagnosticSink).
#[derive(Debug, Error)]
pub enum EvalError {
    /// A component's type has no loadable definition.
    #[error("component `{component}` uses subcircuit type `{type_name}` which has no definition")]
    MissingSubcircuitDefinition {
        component: String,
        type_name: String,
    },

    /// The definition exists but could not be read or parsed.
    #[error("component `{component}` failed to load subcircuit type `{type_name}`")]
    DefinitionLoad {
        component: String,
        type_name: String,
        #[source]
        source: LoadError,
    },

    /// A pin depends on itself. `path` ends with the repeated pin.
    #[error("cyclic dependency: {}", .path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    /// A subcircuit type is instantiated inside its own expansion.
    #[error("recursive subcircuit: {}", .chain.join(" -> "))]
    RecursiveSubcircuit { chain: Vec<String> },

    /// A truth table sweep was requested over too many input bits.
    #[error("truth table over {bits} input bits exceeds the limit of {max}")]
    SweepTooLarge { bits: usize, max: usize },
}

impl EvalError {
    /// Whether this error stems from a subcircuit type that has no definition at all.
    pub fn is_missing_definition(&self) -> bool {
        matches!(self, EvalError::MissingSubcircuitDefinition { .. })
    }
}
