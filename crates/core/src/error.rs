//! Error types for cosmic-mouse-core.

use thiserror::Error;

/// Failure of a single USB transfer or interface operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The transfer did not complete within its timeout.
    #[error("transfer timed out")]
    Timeout,

    /// The device went away (unplugged mid-sequence).
    #[error("device disconnected")]
    Disconnected,

    /// The OS refused access to the device or interface.
    #[error("permission denied")]
    PermissionDenied,

    /// The interface is held by another driver or process.
    #[error("resource busy")]
    Busy,

    /// Fewer bytes were accepted than sent.
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    /// Any other USB stack error.
    #[error("USB error: {0}")]
    Usb(String),
}

/// Which selector table a lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    Effect,
    DpiLevel,
}

impl std::fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Effect => write!(f, "effect"),
            Self::DpiLevel => write!(f, "DPI level"),
        }
    }
}

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Profile record violates an invariant. Raised before any device I/O.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A payload could not be encoded into its fixed device layout.
    #[error("cannot encode {field}: expected {expected}, got {actual}")]
    Encoding {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Effect name or DPI level has no known device code.
    #[error("unknown {kind} selector: {key}")]
    UnknownSelector { kind: SelectorKind, key: String },

    /// No device matching the requested identifiers.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// The configuration interface could not be claimed. Nothing was sent.
    #[error("cannot claim interface {interface}: {cause}")]
    InterfaceClaim {
        interface: u8,
        #[source]
        cause: TransferError,
    },

    /// A transfer failed; the remaining steps were not issued.
    #[error("transfer failed at step {step}: {cause}")]
    TransferFailed {
        step: usize,
        #[source]
        cause: TransferError,
    },

    /// Execution was cancelled before `step` was issued.
    #[error("cancelled before step {step}")]
    Cancelled { step: usize },

    /// Persisted profile could not be read or written.
    #[error("profile error: {0}")]
    Profile(String),

    /// Selector table could not be read or parsed.
    #[error("selector table error: {0}")]
    Selectors(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
