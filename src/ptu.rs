use crate::{
    delay::{Delay, StdDelay},
    error::{Error, Fault, Result},
    register::PtuRegister,
    scaling::{degrees_to_raw, raw_to_celsius, raw_to_degrees},
    types::{
        FirmwareVersion, JOINT_0_M, JOINT_1_M, JOINT_2_M, SerialCode, SerialNumber, VersionPair,
        check_speed,
    },
};
use fugit::MicrosDurationU64;
use log::{debug, info, warn};
use rmodbus::{ModbusProto, client::ModbusRequest};

/// Function codes with this bit set carry a Modbus exception.
const EXCEPTION_FLAG: u8 = 0x80;
/// unit_id + function + exception code + 2 CRC.
const EXCEPTION_RESPONSE_LEN: usize = 5;
/// unit_id + function + byte_count + 2 data bytes + 2 CRC.
const READ_SINGLE_RESPONSE_LEN: usize = 7;
/// Echo of the request: unit_id + function + address + value + 2 CRC.
const WRITE_SINGLE_RESPONSE_LEN: usize = 8;
/// Value written to the zero register to trigger re-zeroing.
const ZERO_COMMAND: u16 = 1;

/// Driver for a single PTU2 on a Modbus RTU link.
///
/// You can create a PanTilt using any interface which implements [embedded_io::Read] & [embedded_io::Write].
/// The interface is owned for the lifetime of the driver and dropped with it, which closes a serial port.
///
/// As with the register names, "set" writes a configuration or a target, "get" reads back a
/// configuration value and "read" returns a measured value.
///
/// Every call is exactly one request/response exchange (a few calls combine several) and nothing
/// is cached.
pub struct PanTilt<S: embedded_io::Read + embedded_io::Write, const L: usize = 32> {
    interface: S,
    /// Default for the PTU2 is 0x01.
    slave_id: u8,
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> PanTilt<S, L> {
    /// Create a new PanTilt instance with the given interface and slave ID
    pub fn new(interface: S, slave_id: u8) -> Self {
        Self {
            interface,
            slave_id,
        }
    }

    /// The slave ID requests are currently addressed to.
    pub fn slave_id(&self) -> u8 {
        self.slave_id
    }

    /// Read the Modbus slave ID stored on the unit.
    pub fn get_id(&mut self) -> Result<u16, S::Error> {
        self.read_register(PtuRegister::Id)
    }

    /// Change the Modbus slave ID of the unit.
    ///
    /// Later requests are addressed to the new ID.
    pub fn set_id(&mut self, id: u8) -> Result<(), S::Error> {
        self.write_register(PtuRegister::Id, id as u16)?;
        self.slave_id = id;
        Ok(())
    }

    /// Read the serial number, e.g. `PTU2102350042`.
    ///
    /// The printed form includes the hardware and software versions, so this reads three registers.
    pub fn get_serial_number(&mut self) -> Result<SerialNumber, S::Error> {
        let code = SerialCode::from_raw(self.read_register(PtuRegister::SerialNumber)?);
        let hardware = self.get_hardware_version()?;
        let software = self.get_software_version()?;
        Ok(SerialNumber {
            hardware,
            software,
            code,
        })
    }

    /// Store a serial number given as its five character suffix: one hex year digit then a
    /// four digit sequence number, e.g. `"50042"`.
    pub fn set_serial_number(&mut self, suffix: &str) -> Result<(), S::Error> {
        let code = SerialCode::parse(suffix)?;
        self.set_serial_code(code)
    }

    /// Store a serial number code.
    pub fn set_serial_code(&mut self, code: SerialCode) -> Result<(), S::Error> {
        self.write_register(PtuRegister::SerialNumber, code.to_raw())
    }

    pub fn get_hardware_version(&mut self) -> Result<VersionPair, S::Error> {
        let raw = self.read_register(PtuRegister::HardwareVersion)?;
        Ok(VersionPair::from_raw(raw))
    }

    pub fn set_hardware_version(
        &mut self,
        version: impl Into<VersionPair>,
    ) -> Result<(), S::Error> {
        self.write_register(PtuRegister::HardwareVersion, version.into().to_raw())
    }

    pub fn get_software_version(&mut self) -> Result<VersionPair, S::Error> {
        let raw = self.read_register(PtuRegister::SoftwareVersion)?;
        Ok(VersionPair::from_raw(raw))
    }

    pub fn set_software_version(
        &mut self,
        version: impl Into<VersionPair>,
    ) -> Result<(), S::Error> {
        self.write_register(PtuRegister::SoftwareVersion, version.into().to_raw())
    }

    /// Read the firmware version. This register is read-only.
    pub fn get_firmware_version(&mut self) -> Result<FirmwareVersion, S::Error> {
        let raw = self.read_register(PtuRegister::FirmwareVersion)?;
        Ok(FirmwareVersion::from_raw(raw))
    }

    /// Get the configured motion speed.
    pub fn get_speed(&mut self) -> Result<u16, S::Error> {
        self.read_register(PtuRegister::Speed)
    }

    /// Set the motion speed. Range = 0-30.
    pub fn set_speed(&mut self, speed: u16) -> Result<(), S::Error> {
        let speed = check_speed(speed)?;
        self.write_register(PtuRegister::Speed, speed)
    }

    /// Return the measured yaw in degrees.
    pub fn read_yaw(&mut self) -> Result<f64, S::Error> {
        let raw = self.read_register(PtuRegister::YawPosition)?;
        Ok(raw_to_degrees(raw))
    }

    /// Set the yaw target in degrees, which starts the motion. Range = -60.0 to 60.0.
    ///
    /// The target register can't be read back, [Self::read_yaw] reports the measured angle.
    pub fn set_yaw(&mut self, degrees: f64) -> Result<(), S::Error> {
        let raw = degrees_to_raw(degrees)?;
        self.write_register(PtuRegister::YawTarget, raw)
    }

    /// Return the measured pitch in degrees.
    pub fn read_pitch(&mut self) -> Result<f64, S::Error> {
        let raw = self.read_register(PtuRegister::PitchPosition)?;
        Ok(raw_to_degrees(raw))
    }

    /// Set the pitch target in degrees. Range = -60.0 to 60.0.
    pub fn set_pitch(&mut self, degrees: f64) -> Result<(), S::Error> {
        let raw = degrees_to_raw(degrees)?;
        self.write_register(PtuRegister::PitchTarget, raw)
    }

    /// Return the yaw motor temperature in degrees Celsius.
    pub fn read_yaw_temperature(&mut self) -> Result<f32, S::Error> {
        let raw = self.read_register(PtuRegister::YawTemperature)?;
        Ok(raw_to_celsius(raw))
    }

    /// Return the pitch motor temperature in degrees Celsius.
    pub fn read_pitch_temperature(&mut self) -> Result<f32, S::Error> {
        let raw = self.read_register(PtuRegister::PitchTemperature)?;
        Ok(raw_to_celsius(raw))
    }

    /// Return the control loop period, unscaled.
    pub fn read_loop_time(&mut self) -> Result<u16, S::Error> {
        self.read_register(PtuRegister::LoopTime)
    }

    /// Make the current position the new zero of both axes.
    ///
    /// Returns as soon as the device has accepted the command.
    pub fn set_zero(&mut self) -> Result<(), S::Error> {
        info!("Zeroing PTU on slave {}", self.slave_id);
        self.write_register(PtuRegister::Zero, ZERO_COMMAND)
    }

    /// Offset of joint 0 in metres.
    pub const fn joint_0(&self) -> f64 {
        JOINT_0_M
    }

    /// Offset of joint 1 in metres.
    pub const fn joint_1(&self) -> f64 {
        JOINT_1_M
    }

    /// Offset of joint 2 in metres.
    pub const fn joint_2(&self) -> f64 {
        JOINT_2_M
    }

    /// Move to the given angles, blocking the thread while the unit travels.
    ///
    /// See [Self::move_to_with].
    pub fn move_to(
        &mut self,
        yaw: f64,
        pitch: f64,
        speed: Option<u16>,
    ) -> Result<MicrosDurationU64, S::Error> {
        self.move_to_with(yaw, pitch, speed, &mut StdDelay)
    }

    /// Move to the given angles, optionally at a temporary speed.
    ///
    /// The configured speed is read first and written back once the wait is over. The wait is
    /// the largest difference between a target and the angle measured right after the targets
    /// were written, divided by the active speed. It is an estimate: the unit may still be
    /// moving when this returns.
    ///
    /// A speed of `Some(0)` leaves the configured speed in place. When the active speed is zero
    /// there is no wait. If the configured speed is above 30 nothing is written.
    ///
    /// Returns the time waited.
    pub fn move_to_with(
        &mut self,
        yaw: f64,
        pitch: f64,
        speed: Option<u16>,
        delay: &mut impl Delay,
    ) -> Result<MicrosDurationU64, S::Error> {
        // Validate everything up front so a bad argument can't leave a temporary speed behind.
        let yaw_raw = degrees_to_raw(yaw)?;
        let pitch_raw = degrees_to_raw(pitch)?;
        let speed = speed.map(check_speed).transpose()?.filter(|&s| s != 0);

        // The configured speed is written back later, so it must be one the setter accepts.
        let restore_speed = check_speed(self.get_speed()?)?;
        if let Some(speed) = speed {
            self.write_register(PtuRegister::Speed, speed)?;
        }
        self.write_register(PtuRegister::YawTarget, yaw_raw)?;
        self.write_register(PtuRegister::PitchTarget, pitch_raw)?;

        let yaw_remaining = (yaw - self.read_yaw()?).abs();
        let pitch_remaining = (pitch - self.read_pitch()?).abs();
        let active_speed = self.get_speed()?;
        let wait = travel_time(yaw_remaining.max(pitch_remaining), active_speed);

        info!(
            "Moving to yaw {yaw}, pitch {pitch} at speed {active_speed}, waiting {} ms",
            wait.to_millis()
        );
        delay.delay(wait);

        self.write_register(PtuRegister::Speed, restore_speed)?;
        Ok(wait)
    }

    /// Write to a single register of the PTU.
    pub fn write_register(&mut self, register: impl Into<u16>, value: u16) -> Result<(), S::Error> {
        let address = register.into();
        let slave = self.slave_id;
        debug!("Writing register {address} = {value:#06x} on slave {slave}");
        self.write_modbus_single(address, value).map_err(|fault| {
            warn!("Write of register {address} on slave {slave} failed: {fault}");
            Error::WriteRegister {
                address,
                value,
                slave,
                fault,
            }
        })
    }

    /// Read a single register from the PTU.
    pub fn read_register(&mut self, register: impl Into<u16>) -> Result<u16, S::Error> {
        let address = register.into();
        let slave = self.slave_id;
        let value = self.read_modbus_single(address).map_err(|fault| {
            warn!("Read of register {address} on slave {slave} failed: {fault}");
            Error::ReadRegister {
                address,
                slave,
                fault,
            }
        })?;
        debug!("Read register {address} = {value:#06x} from slave {slave}");
        Ok(value)
    }

    fn write_modbus_single(
        &mut self,
        address: u16,
        value: u16,
    ) -> core::result::Result<(), Fault<S::Error>> {
        let mut request: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut req = ModbusRequest::new(self.slave_id, ModbusProto::Rtu);
        req.generate_set_holding(address, value, &mut request)?;

        self.interface.write_all(&request).map_err(Fault::Serial)?;

        let response = self.receive_frame(WRITE_SINGLE_RESPONSE_LEN)?;
        req.parse_ok(&response)?;
        // A successful write is echoed back unchanged.
        if response.as_slice() != request.as_slice() {
            return Err(Fault::InvalidResponse);
        }
        Ok(())
    }

    fn read_modbus_single(&mut self, address: u16) -> core::result::Result<u16, Fault<S::Error>> {
        let mut request: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut req = ModbusRequest::new(self.slave_id, ModbusProto::Rtu);
        req.generate_get_holdings(address, 1, &mut request)?;

        self.interface.write_all(&request).map_err(Fault::Serial)?;

        let response = self.receive_frame(READ_SINGLE_RESPONSE_LEN)?;
        let mut parsed_data: heapless::Vec<u16, 4> = heapless::Vec::new();
        req.parse_u16(&response, &mut parsed_data)?;

        parsed_data.first().copied().ok_or(Fault::InvalidResponse)
    }

    /// Read one response frame without consuming anything past its end.
    ///
    /// The frame is `expected_len` bytes long, or shorter when the device answers with an
    /// exception.
    fn receive_frame(
        &mut self,
        expected_len: usize,
    ) -> core::result::Result<heapless::Vec<u8, L>, Fault<S::Error>> {
        let mut buff: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut frame_len = EXCEPTION_RESPONSE_LEN.min(expected_len);
        let mut temp_buf = [0u8; 8];

        while buff.len() < frame_len {
            let wanted = (frame_len - buff.len()).min(temp_buf.len());
            let bytes_read = self
                .interface
                .read(&mut temp_buf[..wanted])
                .map_err(Fault::Serial)?;
            if bytes_read == 0 {
                // End of stream part way through a frame.
                return Err(Fault::InvalidResponse);
            }
            buff.extend_from_slice(&temp_buf[..bytes_read])
                .map_err(|_| Fault::BufferError)?;

            if buff.len() >= 2 {
                frame_len = if buff[1] & EXCEPTION_FLAG != 0 {
                    EXCEPTION_RESPONSE_LEN
                } else {
                    expected_len
                };
            }
        }
        Ok(buff)
    }
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> Drop for PanTilt<S, L> {
    fn drop(&mut self) {
        debug!("Releasing link to slave {}", self.slave_id);
    }
}

/// Time needed to cover `degrees` at `speed` degrees per second.
fn travel_time(degrees: f64, speed: u16) -> MicrosDurationU64 {
    if speed == 0 {
        return MicrosDurationU64::from_ticks(0);
    }
    let micros = degrees / speed as f64 * 1_000_000.0;
    MicrosDurationU64::from_ticks(micros as u64)
}
