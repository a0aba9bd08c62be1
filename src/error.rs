// ========================================
// Error types
// ========================================

use thiserror::Error;

/// Sentinel returned by `def_text` when a chain holds no resolved step.
pub const NO_VALID_STEP: &str = "no valid step chained";

/// Errors surfaced by the chaining engine.
///
/// Unknown member names are deliberately absent from this taxonomy:
/// they are skipped during chain building and dropped during
/// deserialization, never reported as errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChainError {
    /// No library was supplied at construction.
    #[error("please provide a valid function library")]
    InvalidLibrary,

    /// A registration name could not be determined or is not a valid identifier.
    #[error("cannot register under name {0:?}")]
    InvalidRegistration(String),

    /// Serialized chain text did not match the grammar.
    #[error("failed to parse chain text: {0}")]
    Parse(String),

    /// A step function failed during evaluation. The evaluator
    /// propagates this unmodified; it never translates step failures.
    #[error("step '{name}' failed: {message}")]
    Step { name: String, message: String },
}

impl ChainError {
    /// Convenience constructor for step functions reporting a failure.
    pub fn step(name: impl Into<String>, message: impl Into<String>) -> Self {
        ChainError::Step {
            name: name.into(),
            message: message.into(),
        }
    }
}
