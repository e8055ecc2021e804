use thiserror::Error;

/// Errors raised by the numerical core.
///
/// Every variant is deterministic: the same inputs fail the same way, so the
/// only useful recovery is to change the inputs (or loosen the quadrature
/// tolerance / raise the evaluation budget for `IntegrationFailure`).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttenuationError {
    #[error("Invalid distribution parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid category scheme: {0}")]
    InvalidScheme(String),

    #[error(
        "Quadrature did not converge after {evaluations} evaluations \
         (estimate {estimate:.6e}, error estimate {error_estimate:.3e})"
    )]
    IntegrationFailure {
        evaluations: usize,
        estimate: f64,
        error_estimate: f64,
    },

    #[error("Discretized variable has zero variance (variance = {0:e}); all mass falls in one category")]
    DegenerateVariance(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AttenuationError {
    /// Exit code used by the `attenuate` binary for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            AttenuationError::InvalidParameters(_)
            | AttenuationError::InvalidScheme(_)
            | AttenuationError::InvalidConfig(_) => 2,
            AttenuationError::IntegrationFailure { .. } | AttenuationError::DegenerateVariance(_) => 3,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<AttenuationError> for AppError {
    fn from(err: AttenuationError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
