//! Error types for numerical integration operations.

use thiserror::Error;

/// Result type for integration operations.
pub type IntegrateResult<T> = Result<T, IntegrateError>;

/// Errors that can occur during numerical integration.
///
/// Non-convergence is not an error: integrators report it through the
/// `converged` flag of their result and still return the best estimate.
#[derive(Debug, Clone, Error)]
pub enum IntegrateError {
    /// Invalid interval provided (inverted or non-finite bounds).
    #[error("Invalid interval [{a}, {b}] in {context}: bounds must be finite and satisfy a <= b")]
    InvalidInterval { a: f64, b: f64, context: String },

    /// Invalid parameter value.
    #[error("Invalid parameter '{parameter}': {message}")]
    InvalidParameter { parameter: String, message: String },

    /// The integrand reported a fault while being evaluated.
    #[error("Integrand failed at x = {x}: {message}")]
    FunctionEvaluation { x: f64, message: String },

    /// Numerical computation failed (e.g. a NaN or infinite node estimate).
    #[error("Numerical error: {message}")]
    NumericalError { message: String },

    /// Invalid configuration document.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Error from the numr tensor backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl IntegrateError {
    pub(crate) fn invalid_parameter(parameter: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }
}

impl From<numr::error::Error> for IntegrateError {
    fn from(err: numr::error::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for IntegrateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
