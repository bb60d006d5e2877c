// Verification error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Verification error code constants
///
/// Error code range: 2001-2003
pub struct VerifyErrorCodes {}

impl VerifyErrorCodes {
    /// HTTP request to the classification endpoint failed
    pub const REQUEST_FAILED: i32 = 2001;

    /// Response text did not contain a parseable verdict object
    pub const MALFORMED_RESPONSE: i32 = 2002;

    /// Request exceeded the configured timeout
    pub const TIMEOUT: i32 = 2003;
}

/// Log a verification error with structured context
///
/// Verification failures are diagnostic only: the pipeline degrades them to
/// a negative classification and never surfaces them to the user.
pub fn log_verify_error(err: &VerifyError, context: &str) {
    error!(
        "Verification error in {}: code={}, component=Verifier, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Remote verification errors
///
/// Any of these degrades to "not suspicious" at the call site — a failed
/// verification produces no alert and is never retried for that candidate.
///
/// Error code range: 2001-2003
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyError {
    /// HTTP request to the classification endpoint failed
    RequestFailed { reason: String },

    /// Response text did not contain a parseable verdict object
    MalformedResponse { reason: String },

    /// Request exceeded the configured timeout
    Timeout,
}

impl ErrorCode for VerifyError {
    fn code(&self) -> i32 {
        match self {
            VerifyError::RequestFailed { .. } => VerifyErrorCodes::REQUEST_FAILED,
            VerifyError::MalformedResponse { .. } => VerifyErrorCodes::MALFORMED_RESPONSE,
            VerifyError::Timeout => VerifyErrorCodes::TIMEOUT,
        }
    }

    fn message(&self) -> String {
        match self {
            VerifyError::RequestFailed { reason } => {
                format!("Classification request failed: {}", reason)
            }
            VerifyError::MalformedResponse { reason } => {
                format!("Classification response malformed: {}", reason)
            }
            VerifyError::Timeout => "Classification request timed out".to_string(),
        }
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VerifyError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for VerifyError {}

impl From<reqwest::Error> for VerifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VerifyError::Timeout
        } else {
            VerifyError::RequestFailed {
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_error_codes() {
        assert_eq!(
            VerifyError::RequestFailed {
                reason: "test".to_string()
            }
            .code(),
            VerifyErrorCodes::REQUEST_FAILED
        );
        assert_eq!(
            VerifyError::MalformedResponse {
                reason: "test".to_string()
            }
            .code(),
            VerifyErrorCodes::MALFORMED_RESPONSE
        );
        assert_eq!(VerifyError::Timeout.code(), VerifyErrorCodes::TIMEOUT);
    }

    #[test]
    fn test_verify_error_messages() {
        let err = VerifyError::RequestFailed {
            reason: "connection refused".to_string(),
        };
        assert!(err.message().contains("connection refused"));

        let err = VerifyError::MalformedResponse {
            reason: "no braces".to_string(),
        };
        assert!(err.message().contains("malformed"));

        let err = VerifyError::Timeout;
        assert!(err.message().contains("timed out"));
    }

    #[test]
    fn test_verify_error_display() {
        let err = VerifyError::Timeout;
        let display = format!("{}", err);
        assert!(display.contains("VerifyError"));
        assert!(display.contains("2003"));
    }
}
