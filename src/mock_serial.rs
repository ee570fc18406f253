//! We use this mocking module in unit tests to emulate the serial link to a PTU2.
//!
//! Responses are queued up front and handed out byte by byte in order. Every
//! byte written by the driver is kept so tests can decode the requests.

use std::{cell::Cell, rc::Rc};

/// Modbus function code for reading holding registers.
pub const READ_HOLDINGS: u8 = 0x03;
/// Modbus function code for writing a single holding register.
pub const WRITE_HOLDING: u8 = 0x06;

/// Our mock type used to emulate a serial port.
pub struct MockSerial {
    /// Buffer to store data written to the mock serial port
    write_buffer: heapless::Vec<u8, 256>,
    /// Buffer containing pre-configured response data to be read
    read_buffer: heapless::Vec<u8, 256>,
    /// Current position in the read buffer
    read_position: usize,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
    /// Set when the port is dropped.
    dropped: Option<Rc<Cell<bool>>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum MockSerialError {
    /// Simulated buffer overflow
    BufferOverflow,
    /// Generic simulated error for testing
    SimulatedError,
    /// No more queued response bytes, as a serial read timeout would report.
    Timeout,
}

impl core::fmt::Display for MockSerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl core::error::Error for MockSerialError {}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
            MockSerialError::Timeout => embedded_io::ErrorKind::TimedOut,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }
        if self.read_position >= self.read_buffer.len() {
            return Err(MockSerialError::Timeout);
        }

        let available_bytes = self.read_buffer.len() - self.read_position;
        let bytes_to_read = core::cmp::min(buf.len(), available_bytes);
        buf[..bytes_to_read].copy_from_slice(
            &self.read_buffer[self.read_position..self.read_position + bytes_to_read],
        );
        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl Drop for MockSerial {
    fn drop(&mut self) {
        if let Some(flag) = &self.dropped {
            flag.set(true);
        }
    }
}

/// A request frame as decoded from the bytes the driver wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub unit_id: u8,
    pub function: u8,
    pub address: u16,
    /// Register count for reads, register value for writes.
    pub value: u16,
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            should_error_on_write: false,
            should_error_on_read: false,
            dropped: None,
        }
    }

    /// Append raw bytes to the data returned by read().
    pub fn queue_read_data(&mut self, data: &[u8]) {
        self.read_buffer
            .extend_from_slice(data)
            .expect("mock read buffer full");
    }

    /// Queue the reply to a single holding register read.
    pub fn queue_holding(&mut self, unit_id: u8, value: u16) {
        let [high, low] = value.to_be_bytes();
        self.queue_frame(&[unit_id, READ_HOLDINGS, 0x02, high, low]);
    }

    /// Queue the echo a device sends back after a single register write.
    pub fn queue_write_echo(&mut self, unit_id: u8, address: u16, value: u16) {
        let [address_high, address_low] = address.to_be_bytes();
        let [value_high, value_low] = value.to_be_bytes();
        self.queue_frame(&[
            unit_id,
            WRITE_HOLDING,
            address_high,
            address_low,
            value_high,
            value_low,
        ]);
    }

    /// Queue a Modbus exception reply.
    pub fn queue_exception(&mut self, unit_id: u8, function: u8, code: u8) {
        self.queue_frame(&[unit_id, function | 0x80, code]);
    }

    /// Queue a frame, appending its CRC.
    pub fn queue_frame(&mut self, frame: &[u8]) {
        self.queue_read_data(frame);
        self.queue_read_data(&crc16(frame).to_le_bytes());
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Decode everything written so far into request frames.
    ///
    /// Both request types the driver sends are eight bytes long.
    pub fn requests(&self) -> Vec<Request> {
        self.write_buffer
            .chunks(8)
            .map(|frame| {
                assert_eq!(frame.len(), 8, "partial frame written");
                assert_eq!(crc16(&frame[..6]).to_le_bytes(), [frame[6], frame[7]]);
                Request {
                    unit_id: frame[0],
                    function: frame[1],
                    address: u16::from_be_bytes([frame[2], frame[3]]),
                    value: u16::from_be_bytes([frame[4], frame[5]]),
                }
            })
            .collect()
    }

    /// Number of queued response bytes not yet read.
    pub fn unread(&self) -> usize {
        self.read_buffer.len() - self.read_position
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    /// Returns a flag that becomes `true` once this port is dropped.
    pub fn track_drop(&mut self) -> Rc<Cell<bool>> {
        let flag = Rc::new(Cell::new(false));
        self.dropped = Some(flag.clone());
        flag
    }
}

/// Modbus RTU CRC-16.
pub fn crc16(frame: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in frame {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Read, Write};

    #[test]
    fn test_crc_matches_known_frames() {
        assert_eq!(
            crc16(&[0x01, 0x03, 0x00, 0x20, 0x00, 0x01]).to_le_bytes(),
            [0x85, 0xC0]
        );
        assert_eq!(
            crc16(&[0x01, 0x03, 0x02, 0x56, 0x78]).to_le_bytes(),
            [0x87, 0xC6]
        );
    }

    #[test]
    fn test_queued_frames_read_in_order() {
        let mut mock = MockSerial::new();
        mock.queue_holding(0x01, 0x5678);
        mock.queue_exception(0x01, WRITE_HOLDING, 0x02);

        let mut buffer = [0u8; 7];
        assert_eq!(mock.read(&mut buffer), Ok(7));
        assert_eq!(buffer, [0x01, 0x03, 0x02, 0x56, 0x78, 0x87, 0xC6]);

        let mut buffer = [0u8; 16];
        assert_eq!(mock.read(&mut buffer), Ok(5));
        assert_eq!(&buffer[..3], &[0x01, 0x86, 0x02]);
        assert_eq!(mock.read(&mut buffer), Err(MockSerialError::Timeout));
    }

    #[test]
    fn test_requests_are_decoded() {
        let mut mock = MockSerial::new();
        let frame = [0x01, 0x06, 0x00, 0x07, 0x17, 0x70];
        mock.write_all(&frame).unwrap();
        mock.write_all(&crc16(&frame).to_le_bytes()).unwrap();

        assert_eq!(
            mock.requests(),
            vec![Request {
                unit_id: 0x01,
                function: WRITE_HOLDING,
                address: 7,
                value: 6000,
            }]
        );
    }

    #[test]
    fn test_error_flags() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);
        assert_eq!(mock.write(b"test"), Err(MockSerialError::SimulatedError));
        assert!(mock.written_data().is_empty());

        mock.queue_read_data(b"data");
        mock.set_read_error(true);
        let mut buffer = [0u8; 4];
        assert_eq!(mock.read(&mut buffer), Err(MockSerialError::SimulatedError));
        assert_eq!(mock.unread(), 4);
    }

    #[test]
    fn test_drop_is_tracked() {
        let mut mock = MockSerial::new();
        let dropped = mock.track_drop();
        assert!(!dropped.get());
        drop(mock);
        assert!(dropped.get());
    }
}
