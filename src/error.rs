//! Error types for the reminder engine.

/// Top-level error type for reminder scheduling.
#[derive(Debug, thiserror::Error)]
pub enum CadenceError {
    /// The host declined notification permission.
    #[error("notification permission not granted")]
    PermissionDenied,

    /// Notification scheduler adapter error (schedule, cancel, list).
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Key-value persistence error (read, write, decode).
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Settings provider error.
    #[error("settings error: {0}")]
    Settings(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, CadenceError>;
