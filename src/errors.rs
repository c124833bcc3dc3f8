use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Arithmetic domain error: {0}")]
    ArithmeticDomainError(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Rejects NaN and infinities before they reach simulated or persisted state.
pub fn ensure_finite(value: f64, what: &str) -> Result<f64, SimulationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimulationError::ArithmeticDomainError(format!(
            "{what} evaluated to {value}"
        )))
    }
}
