//! Applying a profile to the device, with whole-script retry.
//!
//! The device's state after a partial script is undefined, so a failed run is
//! never resumed. Transient failures restart the entire script from the
//! preamble; everything else is returned to the caller.

use crate::error::{Error, Result, TransferError};
use crate::executor::Executor;
use crate::profile::Profile;
use crate::safety::validate_profile;
use crate::script::{build_script, TransferScript};
use crate::selectors::SelectorTable;
use crate::transport::UsbTransport;
use std::sync::atomic::AtomicBool;
use tracing::{debug, warn};

/// Classification of configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// May succeed if the whole script is sent again (timeout, busy).
    Transient,
    /// Device is gone; stop and tell the user.
    Disconnected,
    /// OS refused access to the device.
    PermissionDenied,
    /// Any other USB-level failure.
    Protocol,
    /// The input was rejected before any I/O.
    InvalidInput,
}

impl ErrorClass {
    /// Classify an error for retry decisions.
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::TransferFailed { cause, .. } | Error::InterfaceClaim { cause, .. } => {
                match cause {
                    TransferError::Timeout | TransferError::Busy => Self::Transient,
                    TransferError::Disconnected => Self::Disconnected,
                    TransferError::PermissionDenied => Self::PermissionDenied,
                    TransferError::ShortWrite { .. } | TransferError::Usb(_) => Self::Protocol,
                }
            }
            Error::DeviceNotFound(_) => Self::Disconnected,
            Error::Cancelled { .. } => Self::Protocol,
            Error::Validation { .. }
            | Error::Encoding { .. }
            | Error::UnknownSelector { .. }
            | Error::Profile(_)
            | Error::Selectors(_) => Self::InvalidInput,
        }
    }

    /// Whether re-sending the whole script is worth trying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// Validate a profile and build its transfer script. Performs no I/O.
pub fn prepare(profile: &Profile, selectors: &SelectorTable) -> Result<TransferScript> {
    validate_profile(profile)?;
    build_script(profile, selectors)
}

/// Apply `profile` to the device: validate, encode, then send the full script.
pub fn send_config<T: UsbTransport + ?Sized>(
    transport: &mut T,
    profile: &Profile,
    selectors: &SelectorTable,
) -> Result<()> {
    send_config_with(&Executor::new(), transport, profile, selectors, 0)
}

/// Like [`send_config`], re-sending the whole script up to `max_retries` more
/// times on transient failures.
pub fn send_config_with_retry<T: UsbTransport + ?Sized>(
    transport: &mut T,
    profile: &Profile,
    selectors: &SelectorTable,
    max_retries: u32,
) -> Result<()> {
    send_config_with(&Executor::new(), transport, profile, selectors, max_retries)
}

/// Apply `profile`, stopping at the next step boundary once `cancel` is set.
pub fn send_config_cancellable<T: UsbTransport + ?Sized>(
    transport: &mut T,
    profile: &Profile,
    selectors: &SelectorTable,
    cancel: &AtomicBool,
) -> Result<()> {
    let script = prepare(profile, selectors)?;
    Executor::new().execute_cancellable(transport, &script, cancel)
}

/// Apply `profile` using a specific executor.
pub fn send_config_with<T: UsbTransport + ?Sized>(
    executor: &Executor,
    transport: &mut T,
    profile: &Profile,
    selectors: &SelectorTable,
    max_retries: u32,
) -> Result<()> {
    let script = prepare(profile, selectors)?;

    let mut attempt = 0;
    loop {
        match executor.execute(transport, &script) {
            Ok(()) => {
                if attempt > 0 {
                    debug!("Configuration succeeded on attempt {}", attempt + 1);
                }
                return Ok(());
            }
            Err(e) => {
                let class = ErrorClass::classify(&e);
                if !class.is_retryable() || attempt >= max_retries {
                    warn!(
                        "Configuration failed (class={:?}, attempt={}/{}): {}",
                        class,
                        attempt + 1,
                        max_retries + 1,
                        e
                    );
                    return Err(e);
                }
                debug!(
                    "Transient failure (attempt {}/{}): {}, restarting script",
                    attempt + 1,
                    max_retries + 1,
                    e
                );
                attempt += 1;
            }
        }
    }
}
