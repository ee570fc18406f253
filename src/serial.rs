//! Serial port link to a PTU2, built on the `serialport` crate.
//!
//! The port is configured as 8 data bits, no parity, 1 stop bit. It stays open for as long as
//! the [`SerialPort`] (or the [`PanTilt`] owning it) lives and is closed when dropped.

use std::time::Duration;

use crate::ptu::PanTilt;

/// Default baud rate of the PTU2.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
/// Default Modbus slave ID of the PTU2.
pub const DEFAULT_SLAVE_ID: u8 = 0x01;
/// Default time to wait for a reply.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Where and how to open the serial link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSettings {
    /// E.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,
    pub baud_rate: u32,
    pub timeout: Duration,
}

impl PortSettings {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            path: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// An open serial port usable as a [`PanTilt`] interface.
pub struct SerialPort(Box<dyn serialport::SerialPort>);

impl SerialPort {
    pub fn open(settings: &PortSettings) -> Result<Self, serialport::Error> {
        log::debug!(
            "Opening {} at {} baud, timeout {:?}",
            settings.path,
            settings.baud_rate,
            settings.timeout
        );
        let port = serialport::new(&settings.path, settings.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(settings.timeout)
            .open()?;
        Ok(Self(port))
    }
}

impl PanTilt<SerialPort> {
    /// Open the serial port and address the unit with `slave_id`.
    pub fn open(settings: &PortSettings, slave_id: u8) -> Result<Self, serialport::Error> {
        Ok(Self::new(SerialPort::open(settings)?, slave_id))
    }
}

/// [`std::io::Error`] adapted to [`embedded_io::Error`].
#[derive(Debug)]
pub struct IoError(pub std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        io_error_kind(self.0.kind())
    }
}

fn io_error_kind(kind: std::io::ErrorKind) -> embedded_io::ErrorKind {
    use embedded_io::ErrorKind as E;
    use std::io::ErrorKind as S;
    match kind {
        S::NotFound => E::NotFound,
        S::PermissionDenied => E::PermissionDenied,
        S::BrokenPipe => E::BrokenPipe,
        S::InvalidInput => E::InvalidInput,
        S::InvalidData => E::InvalidData,
        S::TimedOut => E::TimedOut,
        S::Interrupted => E::Interrupted,
        S::Unsupported => E::Unsupported,
        S::OutOfMemory => E::OutOfMemory,
        _ => E::Other,
    }
}

impl embedded_io::ErrorType for SerialPort {
    type Error = IoError;
}

impl embedded_io::Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}
