//! Our error types for the PTU2.

use thiserror::Error;

use crate::types::InvalidValue;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Error returned by every [`PanTilt`](crate::ptu::PanTilt) accessor.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("write_register(address={address}, value={value}, slave={slave}) failed: {fault}")]
    WriteRegister {
        address: u16,
        value: u16,
        slave: u8,
        fault: Fault<I>,
    },
    #[error("read_register(address={address}, count=1, slave={slave}) failed: {fault}")]
    ReadRegister {
        address: u16,
        slave: u8,
        fault: Fault<I>,
    },
    /// Rejected before anything was sent to the device.
    #[error(transparent)]
    InvalidValue(#[from] InvalidValue),
}

impl<I: embedded_io::Error> Error<I> {
    /// `true` when the device or the link reported the failure.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::WriteRegister { .. } | Error::ReadRegister { .. }
        )
    }

    /// Register address of the failed request, if a request was issued.
    pub fn address(&self) -> Option<u16> {
        match self {
            Error::WriteRegister { address, .. } | Error::ReadRegister { address, .. } => {
                Some(*address)
            }
            Error::InvalidValue(_) => None,
        }
    }
}

/// What went wrong during a single request/response exchange.
#[derive(Error, Debug)]
pub enum Fault<I: embedded_io::Error> {
    #[error("Serial communication error: {0:?}")]
    Serial(I),
    #[error("Modbus protocol error: {0:?}")]
    Modbus(rmodbus::ErrorKind),
    #[error("Frame does not fit the buffer")]
    BufferError,
    #[error("Invalid response received")]
    InvalidResponse,
}

impl<I: embedded_io::Error> From<rmodbus::ErrorKind> for Fault<I> {
    fn from(err: rmodbus::ErrorKind) -> Self {
        Fault::Modbus(err)
    }
}
