//! # Error Types
//!
//! Structured error handling for the rideflow core using thiserror
//! instead of `Box<dyn Error>` patterns. Workflow control-flow outcomes
//! (a step setting `stop`) are *not* errors; only hard failures surface here.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum RideflowError {
    #[error("Database error during {operation}: {message}")]
    Database { operation: String, message: String },

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Messaging error: {message}")]
    Messaging { message: String },

    #[error("Geo index error: {message}")]
    Geo { message: String },
}

impl RideflowError {
    /// Wrap a sqlx error with the operation that produced it.
    pub fn database(operation: impl Into<String>, source: sqlx::Error) -> Self {
        RideflowError::Database {
            operation: operation.into(),
            message: source.to_string(),
        }
    }
}

impl From<serde_json::Error> for RideflowError {
    fn from(err: serde_json::Error) -> Self {
        RideflowError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Failures raised by the workflow engine itself.
///
/// A step that wants to end a run normally returns a context with
/// `stop = true`; these variants cover the hard-fail path only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Jump target '{target}' is not registered in this workflow")]
    UnknownJumpTarget { target: String },

    #[error("Step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    #[error("Step '{step}' produced no result")]
    EmptyStepResult { step: String },

    #[error("Step name '{name}' is already registered")]
    DuplicateStepName { name: String },
}

pub type Result<T> = std::result::Result<T, RideflowError>;
