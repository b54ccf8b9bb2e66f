//! Error types for the bitonic network generator.
//!
//! Configuration problems are detected before anything is emitted, type
//! problems are reported to the caller that asked for the type, and I/O
//! failures from a sink are scoped to the unit being written.

use thiserror::Error;

use crate::isa::{ElementType, VectorIsa};

/// Main error type for plan generation and emission.
#[derive(Error, Debug)]
pub enum GenError {
    #[error("Invalid generator configuration: {reason}")]
    Configuration { reason: String },

    #[error("{isa} does not generate routines for {element}")]
    UnsupportedType {
        isa: VectorIsa,
        element: ElementType,
    },

    #[error("Failed to emit {unit}: {source}")]
    Emission {
        unit: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Plan holds {expected} lanes, simulator was given {found}")]
    TypeMismatch {
        expected: ElementType,
        found: ElementType,
    },

    #[error("Routine not found in plan: {name}")]
    UnknownRoutine { name: String },

    #[error("Malformed plan: {reason}")]
    MalformedPlan { reason: String },
}

impl GenError {
    /// Shorthand for a [`GenError::Configuration`] error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        GenError::Configuration {
            reason: reason.into(),
        }
    }

    /// Whether this error was raised before any output could be produced.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GenError::Configuration { .. } | GenError::UnsupportedType { .. }
        )
    }
}

/// Result type alias for generator operations.
pub type GenResult<T> = Result<T, GenError>;
