//! Protocol executor: sends a transfer script to the device, in order.
//!
//! Each step is one blocking transfer (500 ms timeout) followed by its settle
//! delay. The first failure aborts the run; nothing after it is sent and no
//! step is retried. The configuration interface is claimed for the duration
//! and released on every exit path.

use crate::error::{Error, Result, TransferError};
use crate::script::{Transfer, TransferScript};
use crate::transport::UsbTransport;
use crate::wire::{ENDPOINT_OUT, INTERFACE, REQUEST, REQUEST_TYPE, TRANSFER_TIMEOUT, VALUE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Holds the interface claim and releases it on drop.
struct InterfaceClaim<'a, T: UsbTransport + ?Sized> {
    transport: &'a mut T,
    interface: u8,
}

impl<'a, T: UsbTransport + ?Sized> InterfaceClaim<'a, T> {
    fn acquire(transport: &'a mut T, interface: u8) -> Result<Self> {
        transport
            .claim_interface(interface)
            .map_err(|cause| Error::InterfaceClaim { interface, cause })?;
        debug!(interface, "Interface claimed");
        Ok(Self {
            transport,
            interface,
        })
    }
}

impl<T: UsbTransport + ?Sized> Drop for InterfaceClaim<'_, T> {
    fn drop(&mut self) {
        match self.transport.release_interface(self.interface) {
            Ok(()) => debug!(interface = self.interface, "Interface released"),
            Err(e) => warn!(interface = self.interface, error = %e, "Interface release failed"),
        }
    }
}

/// Walks a [`TransferScript`] against a device.
pub struct Executor {
    settle: fn(Duration),
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Executor that blocks the calling thread for each settle delay.
    pub fn new() -> Self {
        Self {
            settle: std::thread::sleep,
        }
    }

    /// Executor with a custom settle function.
    pub fn with_settle(settle: fn(Duration)) -> Self {
        Self { settle }
    }

    /// Send every step of `script`.
    pub fn execute<T: UsbTransport + ?Sized>(
        &self,
        transport: &mut T,
        script: &TransferScript,
    ) -> Result<()> {
        self.run(transport, script, None)
    }

    /// Send every step of `script`, checking `cancel` before each step.
    ///
    /// A cancelled run leaves the device in an unspecified intermediate
    /// state; re-send the whole script to recover.
    pub fn execute_cancellable<T: UsbTransport + ?Sized>(
        &self,
        transport: &mut T,
        script: &TransferScript,
        cancel: &AtomicBool,
    ) -> Result<()> {
        self.run(transport, script, Some(cancel))
    }

    fn run<T: UsbTransport + ?Sized>(
        &self,
        transport: &mut T,
        script: &TransferScript,
        cancel: Option<&AtomicBool>,
    ) -> Result<()> {
        let mut claim = InterfaceClaim::acquire(transport, INTERFACE)?;

        for (step, s) in script.steps().iter().enumerate() {
            if cancel.is_some_and(|c| c.load(Ordering::Acquire)) {
                warn!(step, "Configuration cancelled");
                return Err(Error::Cancelled { step });
            }

            debug!(
                step,
                phase = ?s.phase,
                kind = s.transfer.kind(),
                len = s.transfer.payload().len(),
                "TX"
            );

            send(&mut *claim.transport, &s.transfer).map_err(|cause| {
                warn!(step, kind = s.transfer.kind(), error = %cause, "Transfer failed");
                Error::TransferFailed { step, cause }
            })?;

            (self.settle)(s.settle);
        }

        info!(steps = script.len(), "Configuration sent");
        Ok(())
    }
}

fn send<T: UsbTransport + ?Sized>(
    transport: &mut T,
    transfer: &Transfer,
) -> std::result::Result<(), TransferError> {
    let data = transfer.payload();
    let written = match transfer {
        Transfer::Control(_) => transport.write_control(
            REQUEST_TYPE,
            REQUEST,
            VALUE,
            u16::from(INTERFACE),
            data,
            TRANSFER_TIMEOUT,
        )?,
        Transfer::Interrupt(_) => transport.write_interrupt(ENDPOINT_OUT, data, TRANSFER_TIMEOUT)?,
    };
    if written != data.len() {
        return Err(TransferError::ShortWrite {
            expected: data.len(),
            written,
        });
    }
    Ok(())
}

/// Send `script` with a default [`Executor`].
pub fn execute<T: UsbTransport + ?Sized>(transport: &mut T, script: &TransferScript) -> Result<()> {
    Executor::new().execute(transport, script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Profile;
    use crate::script::build_script;
    use crate::script::tests::test_selectors;
    use crate::transport::mock::{Call, Fault, MockDevice};
    use crate::wire::{COMMIT_SETTLE, SETTLE};
    use std::cell::{Cell, RefCell};
    use std::time::Instant;

    thread_local! {
        static SETTLES: RefCell<Vec<Duration>> = const { RefCell::new(Vec::new()) };
        static SETTLED: Cell<usize> = const { Cell::new(0) };
        static CANCEL: AtomicBool = const { AtomicBool::new(false) };
    }

    const CANCEL_AFTER: usize = 7;

    fn cancel_after_seventh(_: Duration) {
        SETTLED.with(|n| {
            n.set(n.get() + 1);
            if n.get() == CANCEL_AFTER {
                CANCEL.with(|c| c.store(true, Ordering::Release));
            }
        });
    }

    fn record_settle(d: Duration) {
        SETTLES.with(|s| s.borrow_mut().push(d));
    }

    fn take_settles() -> Vec<Duration> {
        SETTLES.with(|s| std::mem::take(&mut *s.borrow_mut()))
    }

    fn no_wait() -> Executor {
        Executor::with_settle(|_| {})
    }

    fn script() -> TransferScript {
        build_script(&Profile::default(), &test_selectors()).unwrap()
    }

    #[test]
    fn sends_every_step_in_order() {
        let script = script();
        let mut dev = MockDevice::new();
        no_wait().execute(&mut dev, &script).unwrap();

        let sent = dev.transfers();
        assert_eq!(sent.len(), script.len());
        for (call, step) in sent.iter().zip(script.steps()) {
            match (call, &step.transfer) {
                (
                    Call::Control {
                        request_type,
                        request,
                        value,
                        index,
                        data,
                        timeout,
                    },
                    Transfer::Control(p),
                ) => {
                    assert_eq!(
                        (*request_type, *request, *value, *index),
                        (0x21, 0x09, 0x0300, 2)
                    );
                    assert_eq!(data.as_slice(), p.as_slice());
                    assert_eq!(*timeout, Duration::from_millis(500));
                }
                (
                    Call::Interrupt {
                        endpoint,
                        data,
                        timeout,
                    },
                    Transfer::Interrupt(p),
                ) => {
                    assert_eq!(*endpoint, 0x03);
                    assert_eq!(data.as_slice(), p.as_slice());
                    assert_eq!(*timeout, Duration::from_millis(500));
                }
                (call, step) => panic!("transfer type mismatch: {call:?} vs {step:?}"),
            }
        }
    }

    #[test]
    fn claims_before_and_releases_after() {
        let mut dev = MockDevice::new();
        no_wait().execute(&mut dev, &script()).unwrap();
        assert_eq!(dev.calls.first(), Some(&Call::Claim(2)));
        assert_eq!(dev.calls.last(), Some(&Call::Release(2)));
        assert_eq!((dev.claims(), dev.releases()), (1, 1));
    }

    #[test]
    fn settles_after_each_step() {
        let script = script();
        let mut dev = MockDevice::new();
        take_settles();
        Executor::with_settle(record_settle)
            .execute(&mut dev, &script)
            .unwrap();

        let settles = take_settles();
        assert_eq!(settles.len(), script.len());
        let (last, rest) = settles.split_last().unwrap();
        assert_eq!(*last, COMMIT_SETTLE);
        assert!(rest.iter().all(|d| *d == SETTLE));
    }

    #[test]
    fn failure_aborts_remaining_steps() {
        let mut dev = MockDevice::new().fault_at(9, Fault::Fail(TransferError::Timeout));
        let err = no_wait().execute(&mut dev, &script()).unwrap_err();

        assert!(matches!(
            err,
            Error::TransferFailed {
                step: 9,
                cause: TransferError::Timeout
            }
        ));
        assert_eq!(dev.transfers().len(), 10);
        assert_eq!(dev.releases(), 1);
        assert_eq!(dev.calls.last(), Some(&Call::Release(2)));
    }

    #[test]
    fn failure_on_first_step() {
        let mut dev = MockDevice::new().fault_at(0, Fault::Fail(TransferError::Disconnected));
        let err = no_wait().execute(&mut dev, &script()).unwrap_err();
        assert!(matches!(err, Error::TransferFailed { step: 0, .. }));
        assert_eq!(dev.transfers().len(), 1);
        assert_eq!(dev.releases(), 1);
    }

    #[test]
    fn short_write_is_a_failure() {
        let mut dev = MockDevice::new().fault_at(8, Fault::ShortWrite(16));
        let err = no_wait().execute(&mut dev, &script()).unwrap_err();
        assert!(matches!(
            err,
            Error::TransferFailed {
                step: 8,
                cause: TransferError::ShortWrite {
                    expected: 32,
                    written: 16
                }
            }
        ));
        assert_eq!(dev.transfers().len(), 9);
        assert_eq!(dev.releases(), 1);
    }

    #[test]
    fn claim_failure_sends_nothing() {
        let mut dev = MockDevice::new().refuse_claim(TransferError::Busy);
        let err = no_wait().execute(&mut dev, &script()).unwrap_err();
        assert!(matches!(
            err,
            Error::InterfaceClaim {
                interface: 2,
                cause: TransferError::Busy
            }
        ));
        assert!(dev.calls.is_empty());
    }

    #[test]
    fn cancelled_before_start() {
        let cancel = AtomicBool::new(true);
        let mut dev = MockDevice::new();
        let err = no_wait()
            .execute_cancellable(&mut dev, &script(), &cancel)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled { step: 0 }));
        assert!(dev.transfers().is_empty());
        assert_eq!(dev.releases(), 1);
    }

    #[test]
    fn not_cancelled_runs_to_completion() {
        let cancel = AtomicBool::new(false);
        let mut dev = MockDevice::new();
        no_wait()
            .execute_cancellable(&mut dev, &script(), &cancel)
            .unwrap();
        assert_eq!(dev.transfers().len(), 23);
    }

    #[test]
    fn cancelled_mid_sequence_stops_at_next_boundary() {
        SETTLED.with(|n| n.set(0));
        let mut dev = MockDevice::new();
        let err = CANCEL.with(|cancel| {
            cancel.store(false, Ordering::Release);
            Executor::with_settle(cancel_after_seventh)
                .execute_cancellable(&mut dev, &script(), cancel)
                .unwrap_err()
        });

        assert!(matches!(err, Error::Cancelled { step: CANCEL_AFTER }));
        assert_eq!(dev.transfers().len(), CANCEL_AFTER);
        assert_eq!(dev.releases(), 1);
        assert_eq!(dev.calls.last(), Some(&Call::Release(2)));
    }

    #[test]
    fn default_executor_really_settles() {
        let script = script();
        let mut dev = MockDevice::new();
        let start = Instant::now();
        execute(&mut dev, &script).unwrap();

        let minimum = SETTLE * (script.len() as u32 - 1) + COMMIT_SETTLE;
        assert!(start.elapsed() >= minimum);
        assert_eq!(dev.transfers().len(), script.len());
        assert_eq!((dev.claims(), dev.releases()), (1, 1));
    }
}
