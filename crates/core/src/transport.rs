//! USB transport abstraction for device communication.
//!
//! Provides a trait-based transport layer so that the real USB device and
//! mock devices share the same interface.

use crate::error::TransferError;
use std::time::Duration;

/// Raw USB operations the configuration protocol needs.
///
/// The handle is borrowed mutably for the whole of one script run; callers
/// must not interleave other transfers on it.
pub trait UsbTransport {
    /// Claim an interface for exclusive use.
    fn claim_interface(&mut self, interface: u8) -> Result<(), TransferError>;

    /// Release a previously claimed interface.
    fn release_interface(&mut self, interface: u8) -> Result<(), TransferError>;

    /// Host-to-device control transfer. Returns the number of bytes written.
    fn write_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, TransferError>;

    /// Interrupt OUT transfer. Returns the number of bytes written.
    fn write_interrupt(
        &mut self,
        endpoint: u8,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, TransferError>;
}

/// A mock USB transport for testing.
///
/// Records every call in order and can be told to fail a given transfer.
#[cfg(test)]
pub mod mock {
    use super::*;

    /// A call observed by the mock.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Claim(u8),
        Release(u8),
        Control {
            request_type: u8,
            request: u8,
            value: u16,
            index: u16,
            data: Vec<u8>,
            timeout: Duration,
        },
        Interrupt {
            endpoint: u8,
            data: Vec<u8>,
            timeout: Duration,
        },
    }

    /// How the mock should misbehave on a given transfer.
    #[derive(Debug, Clone)]
    pub enum Fault {
        Fail(TransferError),
        /// Accept only this many bytes.
        ShortWrite(usize),
    }

    /// Mock transport recording calls.
    #[derive(Default)]
    pub struct MockDevice {
        pub calls: Vec<Call>,
        transfers: usize,
        fault: Option<(usize, Fault)>,
        claim_error: Option<TransferError>,
    }

    impl MockDevice {
        pub fn new() -> Self {
            Self::default()
        }

        /// Misbehave on the transfer with this 0-based index.
        pub fn fault_at(mut self, transfer: usize, fault: Fault) -> Self {
            self.fault = Some((transfer, fault));
            self
        }

        /// Refuse interface claims.
        pub fn refuse_claim(mut self, err: TransferError) -> Self {
            self.claim_error = Some(err);
            self
        }

        /// Recorded control and interrupt transfers, without claim/release.
        pub fn transfers(&self) -> Vec<&Call> {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Control { .. } | Call::Interrupt { .. }))
                .collect()
        }

        pub fn claims(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Claim(_)))
                .count()
        }

        pub fn releases(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Release(_)))
                .count()
        }

        fn transfer(&mut self, call: Call, len: usize) -> Result<usize, TransferError> {
            let index = self.transfers;
            self.transfers += 1;
            self.calls.push(call);
            match &self.fault {
                Some((at, Fault::Fail(err))) if *at == index => Err(err.clone()),
                Some((at, Fault::ShortWrite(n))) if *at == index => Ok(*n),
                _ => Ok(len),
            }
        }
    }

    impl UsbTransport for MockDevice {
        fn claim_interface(&mut self, interface: u8) -> Result<(), TransferError> {
            if let Some(err) = &self.claim_error {
                return Err(err.clone());
            }
            self.calls.push(Call::Claim(interface));
            Ok(())
        }

        fn release_interface(&mut self, interface: u8) -> Result<(), TransferError> {
            self.calls.push(Call::Release(interface));
            Ok(())
        }

        fn write_control(
            &mut self,
            request_type: u8,
            request: u8,
            value: u16,
            index: u16,
            data: &[u8],
            timeout: Duration,
        ) -> Result<usize, TransferError> {
            let call = Call::Control {
                request_type,
                request,
                value,
                index,
                data: data.to_vec(),
                timeout,
            };
            self.transfer(call, data.len())
        }

        fn write_interrupt(
            &mut self,
            endpoint: u8,
            data: &[u8],
            timeout: Duration,
        ) -> Result<usize, TransferError> {
            let call = Call::Interrupt {
                endpoint,
                data: data.to_vec(),
                timeout,
            };
            self.transfer(call, data.len())
        }
    }
}
