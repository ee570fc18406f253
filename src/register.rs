//! This module is used to define the holding registers on the PTU2.
//!
//! Every register holds a single `u16`. The target angle registers and the
//! measured angle registers are separate cells: writing a target never
//! changes what the feedback register reports until the motor has moved.

use strum_macros::EnumIter;

#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter)]
#[repr(u16)]
pub enum PtuRegister {
    /// __R/W__ - Modbus slave address of the unit.
    Id = 0,
    /// __R/W__ - Serial number code.
    ///
    /// Bits 12-15 hold the production year digit, bits 0-11 the sequence number.
    /// See [`SerialCode`](crate::types::SerialCode).
    SerialNumber = 1,
    /// __R/W__ - Hardware version. High byte is major, low byte is minor.
    HardwareVersion = 2,
    /// __R/W__ - Software version. High byte is major, low byte is minor.
    SoftwareVersion = 3,
    /// __R__ - Firmware version.
    ///
    /// See [`FirmwareVersion`](crate::types::FirmwareVersion) for the layout.
    FirmwareVersion = 4,
    /// __W__ - Writing `1` makes the current position the new zero.
    Zero = 5,
    /// __R/W__ - Motion speed. Range = 0-30.
    Speed = 6,
    /// __W__ - Yaw target in signed hundredths of a degree.
    ///
    /// Writing this register starts the motion.
    YawTarget = 7,
    /// __W__ - Pitch target in signed hundredths of a degree.
    PitchTarget = 8,
    /// __R__ - Measured yaw in signed hundredths of a degree.
    YawPosition = 12,
    /// __R__ - Measured pitch in signed hundredths of a degree.
    PitchPosition = 13,
    /// __R__ - Yaw motor temperature in tenths of a degree Celsius.
    YawTemperature = 14,
    /// __R__ - Pitch motor temperature in tenths of a degree Celsius.
    PitchTemperature = 15,
    /// __R__ - Control loop period as reported by the firmware.
    LoopTime = 19,
}

/// How a register may be accessed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    pub const fn readable(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite)
    }

    pub const fn writable(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }
}

impl PtuRegister {
    pub const fn access(self) -> Access {
        use PtuRegister as R;
        match self {
            R::Id | R::SerialNumber | R::HardwareVersion | R::SoftwareVersion | R::Speed => {
                Access::ReadWrite
            }
            R::Zero | R::YawTarget | R::PitchTarget => Access::Write,
            R::FirmwareVersion
            | R::YawPosition
            | R::PitchPosition
            | R::YawTemperature
            | R::PitchTemperature
            | R::LoopTime => Access::Read,
        }
    }

    pub const fn address(self) -> u16 {
        self as u16
    }
}

impl From<PtuRegister> for u16 {
    fn from(value: PtuRegister) -> Self {
        value as u16
    }
}
