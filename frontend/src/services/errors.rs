//! Error types for talking to the school API.

use thiserror::Error;

/// Shown when the request never reached the server
pub const CONNECTION_MESSAGE: &str = "Unable to reach the server. Please check your connection.";

/// Shown when the server failed without saying why
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Failure of a single API call
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// No response came back (DNS, refused connection, timeout)
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with `success: false` or a non-2xx status
    #[error("server rejected request (status {status:?}): {}", message.as_deref().unwrap_or("no message"))]
    Server {
        status: Option<u16>,
        message: Option<String>,
    },

    /// The body could not be understood
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn server(status: Option<u16>, message: Option<String>) -> Self {
        let message = message.filter(|m| !m.trim().is_empty());
        ApiError::Server { status, message }
    }

    /// Text to display inline next to the form that issued the request.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(_) => CONNECTION_MESSAGE.to_string(),
            ApiError::Server {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Server { message: None, .. } | ApiError::Decode(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::server(Some(status.as_u16()), None)
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_shown_verbatim() {
        let err = ApiError::server(Some(400), Some("Fee already exists for March".to_string()));
        assert_eq!(err.user_message(), "Fee already exists for March");
    }

    #[test]
    fn blank_server_message_falls_back() {
        let err = ApiError::server(Some(500), Some("   ".to_string()));
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn transport_failure_asks_to_check_connection() {
        let err = ApiError::Transport("connection refused".to_string());
        assert!(err.is_transport());
        assert_eq!(err.user_message(), CONNECTION_MESSAGE);
    }
}
