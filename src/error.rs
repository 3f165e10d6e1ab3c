//! Error types and handling for the layover planner

use thiserror::Error;

/// Main error type for the layover planner
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Malformed request fields
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Well-formed input that cannot be resolved (unknown airport, failed geocode)
    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    /// Upstream service failures (maps, generation)
    #[error("Upstream error from {service}: {message}")]
    Upstream { service: String, message: String },

    /// Generated text that does not satisfy the plan schema
    #[error("Generation contract violated: {message}")]
    Generation { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl PlannerError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new invalid value error
    pub fn invalid_value<S: Into<String>>(message: S) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    /// Create a new upstream error for the named service
    pub fn upstream<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new generation contract error
    pub fn generation<S: Into<String>>(message: S) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// HTTP status code used when the error crosses the inbound boundary
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            PlannerError::Validation { .. } => 422,
            PlannerError::InvalidValue { .. } => 400,
            _ => 500,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::Validation { message } | PlannerError::InvalidValue { message } => {
                message.clone()
            }
            PlannerError::Upstream { service, .. } => {
                format!("Planner error: {service} is unavailable, please try again later")
            }
            PlannerError::Generation { message } => {
                format!("Planner error: the generated plan was rejected ({message})")
            }
            PlannerError::Config { .. } => {
                "Planner error: service is misconfigured".to_string()
            }
            PlannerError::General { message } => format!("Planner error: {message}"),
        }
    }
}
