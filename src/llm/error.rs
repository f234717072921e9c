//! Completion backend errors
//!
//! Every failure shape a completion backend can produce (transport, auth,
//! rate-limit, malformed payload) is expressed as a [`BackendError`]. The
//! pipeline collapses all of them into a single upstream-failure outcome, but
//! keeps the variant around so callers can tell rate limiting apart from the rest.

use std::fmt;

/// Errors that can occur while talking to a completion backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// API request failed with the given message
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Authentication failed or credentials are invalid
    AuthenticationError { message: String },

    /// Request timed out after the specified duration (in seconds)
    TimeoutError { seconds: u64 },

    /// Rate limit exceeded, retry after the specified duration (in seconds)
    RateLimitError { retry_after: Option<u64> },

    /// Invalid or malformed response from the service
    InvalidResponse {
        message: String,
        raw_response: Option<String>,
    },

    /// Configuration error (missing API keys, invalid settings, etc.)
    ConfigurationError { message: String },

    /// Network-related error
    NetworkError { message: String },

    /// Generic error for other cases
    Other { message: String },
}

impl BackendError {
    /// Returns true if the service asked us to slow down
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            BackendError::RateLimitError { .. }
                | BackendError::ApiError {
                    status_code: Some(429),
                    ..
                }
        )
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ApiError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error ({}): {}", code, message)
                } else {
                    write!(f, "API error: {}", message)
                }
            }
            BackendError::AuthenticationError { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            BackendError::TimeoutError { seconds } => {
                write!(f, "Request timed out after {} seconds", seconds)
            }
            BackendError::RateLimitError { retry_after } => {
                if let Some(seconds) = retry_after {
                    write!(f, "Rate limit exceeded, retry after {} seconds", seconds)
                } else {
                    write!(f, "Rate limit exceeded")
                }
            }
            BackendError::InvalidResponse { message, .. } => {
                write!(f, "Invalid response from completion service: {}", message)
            }
            BackendError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            BackendError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            BackendError::Other { message } => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_api_error_with_status() {
        let err = BackendError::ApiError {
            message: "bad gateway".to_string(),
            status_code: Some(502),
        };
        assert_eq!(err.to_string(), "API error (502): bad gateway");
    }

    #[test]
    fn test_display_rate_limit() {
        let err = BackendError::RateLimitError {
            retry_after: Some(30),
        };
        assert_eq!(
            err.to_string(),
            "Rate limit exceeded, retry after 30 seconds"
        );
        assert_eq!(
            BackendError::RateLimitError { retry_after: None }.to_string(),
            "Rate limit exceeded"
        );
    }

    #[test]
    fn test_other_displays_bare_message() {
        let err = BackendError::Other {
            message: "connect ECONNREFUSED".to_string(),
        };
        assert_eq!(err.to_string(), "connect ECONNREFUSED");
    }

    #[test]
    fn test_is_rate_limit() {
        assert!(BackendError::RateLimitError { retry_after: None }.is_rate_limit());
        assert!(BackendError::ApiError {
            message: "slow down".to_string(),
            status_code: Some(429),
        }
        .is_rate_limit());
        assert!(!BackendError::NetworkError {
            message: "refused".to_string(),
        }
        .is_rate_limit());
        assert!(!BackendError::TimeoutError { seconds: 5 }.is_rate_limit());
    }
}
