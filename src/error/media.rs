// Media error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Media error code constants
///
/// These constants provide a single source of truth for error codes shared
/// with diagnostics tooling and the presentation layer.
///
/// Error code range: 1001-1006
pub struct MediaErrorCodes {}

impl MediaErrorCodes {
    /// Camera or microphone permission denied
    pub const PERMISSION_DENIED: i32 = 1001;

    /// Capture device unavailable or failed to open
    pub const DEVICE_UNAVAILABLE: i32 = 1002;

    /// A monitoring session is already running
    pub const ALREADY_RUNNING: i32 = 1003;

    /// No monitoring session is running
    pub const NOT_RUNNING: i32 = 1004;

    /// Capture stream failed mid-session
    pub const STREAM_FAILURE: i32 = 1005;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 1006;
}

/// Log a media error with structured context
///
/// Logs include the numeric error code, the component, and the
/// human-readable message. Logging is non-blocking and never panics.
pub fn log_media_error(err: &MediaError, context: &str) {
    error!(
        "Media error in {}: code={}, component=MediaSource, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Media acquisition and capture errors
///
/// These errors cover session lifecycle and camera/microphone access. An
/// acquisition failure surfaces from session start and leaves the engine in
/// a well-defined stopped state.
///
/// Error code range: 1001-1006
#[derive(Debug, Clone, PartialEq)]
pub enum MediaError {
    /// Camera or microphone permission denied
    PermissionDenied,

    /// Capture device unavailable or failed to open
    DeviceUnavailable { details: String },

    /// A monitoring session is already running
    AlreadyRunning,

    /// No monitoring session is running
    NotRunning,

    /// Capture stream failed mid-session
    StreamFailure { reason: String },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },
}

impl ErrorCode for MediaError {
    fn code(&self) -> i32 {
        match self {
            MediaError::PermissionDenied => MediaErrorCodes::PERMISSION_DENIED,
            MediaError::DeviceUnavailable { .. } => MediaErrorCodes::DEVICE_UNAVAILABLE,
            MediaError::AlreadyRunning => MediaErrorCodes::ALREADY_RUNNING,
            MediaError::NotRunning => MediaErrorCodes::NOT_RUNNING,
            MediaError::StreamFailure { .. } => MediaErrorCodes::STREAM_FAILURE,
            MediaError::LockPoisoned { .. } => MediaErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            MediaError::PermissionDenied => {
                "Camera/microphone permission denied. Please grant media access.".to_string()
            }
            MediaError::DeviceUnavailable { details } => {
                format!("Capture device unavailable: {}", details)
            }
            MediaError::AlreadyRunning => {
                "Monitoring session already running. Call stop_session() first.".to_string()
            }
            MediaError::NotRunning => {
                "Monitoring session not running. Call start_session() first.".to_string()
            }
            MediaError::StreamFailure { reason } => {
                format!("Capture stream failed: {}", reason)
            }
            MediaError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
        }
    }
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MediaError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for MediaError {}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        MediaError::DeviceUnavailable {
            details: err.to_string(),
        }
    }
}

impl From<image::ImageError> for MediaError {
    fn from(err: image::ImageError) -> Self {
        MediaError::StreamFailure {
            reason: format!("snapshot encoding failed: {}", err),
        }
    }
}
