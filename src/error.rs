// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Body text used when a non-2xx response carries no usable `{detail}` envelope.
pub const FALLBACK_SERVER_DETAIL: &str = "Internal server Error";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local, pre-network rejection. Never reaches the gateway.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error ({status}): {detail}")]
    Server { status: u16, detail: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Text shown to the user when this error ends a stage.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Server { detail, .. } => detail.clone(),
            PipelineError::Transport(msg)
            | PipelineError::Validation(msg)
            | PipelineError::MalformedResponse(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PipelineError::Transport(format!("request timed out: {}", err))
        } else if err.is_decode() {
            PipelineError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            PipelineError::Server {
                status: status.as_u16(),
                detail: FALLBACK_SERVER_DETAIL.to_string(),
            }
        } else {
            PipelineError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_user_message_is_detail() {
        let err = PipelineError::Server {
            status: 500,
            detail: "script failed".to_string(),
        };
        assert_eq!(err.user_message(), "script failed");
        assert_eq!(err.to_string(), "Server error (500): script failed");
    }

}
