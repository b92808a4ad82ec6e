//! Error types for the interview simulator.

use crate::interview::model::InterviewMode;
use crate::interview::state::InterviewStep;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Interview error: {0}")]
    Interview(#[from] InterviewError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised by interview flow operations.
///
/// None of these change session state: the operation is rejected and the
/// caller may retry with corrected input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterviewError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Field id {id} already exists")]
    Duplicate { id: String },

    #[error("Cannot {operation} while in step {step}")]
    InvalidTransition {
        operation: String,
        step: InterviewStep,
    },
}

impl InterviewError {
    pub(crate) fn validation(field: &str, reason: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_transition(operation: &str, step: InterviewStep) -> Self {
        Self::InvalidTransition {
            operation: operation.to_string(),
            step,
        }
    }
}

/// Capture device failures. Always recovered by the controller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureError {
    #[error("Capture unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Permission denied for {mode} capture")]
    PermissionDenied { mode: InterviewMode },

    #[error("Speech synthesis failed: {reason}")]
    Synthesis { reason: String },

    #[error("Capture device error: {reason}")]
    Device { reason: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interview_errors_render_context() {
        let err = InterviewError::validation("name", "must not be empty");
        assert_eq!(err.to_string(), "Invalid name: must not be empty");

        let err = InterviewError::invalid_transition("submit answer", InterviewStep::Idle);
        assert_eq!(err.to_string(), "Cannot submit answer while in step idle");
    }

    #[test]
    fn wraps_into_top_level() {
        let err: Error = InterviewError::Duplicate { id: "sales".into() }.into();
        assert!(matches!(err, Error::Interview(InterviewError::Duplicate { .. })));
        assert!(err.to_string().contains("sales"));

        let err: Error = CaptureError::PermissionDenied {
            mode: InterviewMode::Video,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Capture error: Permission denied for video capture"
        );
    }
}
