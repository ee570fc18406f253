//! This module contains types relevant to the PTU2 register data types.

use core::fmt;

use modular_bitfield::prelude::*;
use thiserror::Error;

/// Highest speed accepted by the speed register.
pub const MAX_SPEED: u16 = 30;

/// Highest production year digit the serial code can carry.
pub const MAX_SERIAL_YEAR: u8 = 15;

/// Highest sequence number the serial code can carry.
pub const MAX_SERIAL_SEQUENCE: u16 = 4095;

/// Model prefix of every printed serial number.
pub const SERIAL_PREFIX: &str = "PTU2";

/// Kinematic offsets between the unit's joints, in metres.
pub const JOINT_0_M: f64 = 0.023;
pub const JOINT_1_M: f64 = 0.062;
pub const JOINT_2_M: f64 = 0.032;

/// A value refused by a setter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidValue {
    #[error("Angle {0} is outside -60..=60 degrees")]
    Angle(f64),
    #[error("Speed {0} is above 30")]
    Speed(u16),
    #[error("Serial year {0} is above 15")]
    SerialYear(u8),
    #[error("Serial sequence {0} is above 4095")]
    SerialSequence(u16),
    #[error("Serial number must be one hex year digit followed by four sequence digits")]
    SerialFormat,
}

/// Check a speed before it is written.
pub fn check_speed(speed: u16) -> Result<u16, InvalidValue> {
    if speed > MAX_SPEED {
        return Err(InvalidValue::Speed(speed));
    }
    Ok(speed)
}

/// Hardware or software version as stored in a single register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionPair {
    pub major: u8,
    pub minor: u8,
}

impl VersionPair {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub const fn from_raw(raw: u16) -> Self {
        let [major, minor] = raw.to_be_bytes();
        Self { major, minor }
    }

    pub const fn to_raw(self) -> u16 {
        u16::from_be_bytes([self.major, self.minor])
    }
}

impl From<(u8, u8)> for VersionPair {
    fn from((major, minor): (u8, u8)) -> Self {
        Self::new(major, minor)
    }
}

impl fmt::Display for VersionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Bit layout of the firmware version register.
#[bitfield(bits = 16)]
#[derive(Debug, Clone, Copy)]
struct FirmwareWord {
    patch: B8,
    major: B4,
    minor: B4,
}

/// Read-only firmware version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl FirmwareVersion {
    pub fn from_raw(raw: u16) -> Self {
        let word = FirmwareWord::from_bytes(raw.to_le_bytes());
        Self {
            major: word.major(),
            minor: word.minor(),
            patch: word.patch(),
        }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[bitfield(bits = 16)]
#[derive(Debug, Clone, Copy)]
struct SerialWord {
    sequence: B12,
    year: B4,
}

/// Contents of the serial number register: a year digit and a sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialCode {
    year: u8,
    sequence: u16,
}

impl SerialCode {
    pub fn new(year: u8, sequence: u16) -> Result<Self, InvalidValue> {
        if year > MAX_SERIAL_YEAR {
            return Err(InvalidValue::SerialYear(year));
        }
        if sequence > MAX_SERIAL_SEQUENCE {
            return Err(InvalidValue::SerialSequence(sequence));
        }
        Ok(Self { year, sequence })
    }

    pub fn year(&self) -> u8 {
        self.year
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    pub fn from_raw(raw: u16) -> Self {
        let word = SerialWord::from_bytes(raw.to_le_bytes());
        Self {
            year: word.year(),
            sequence: word.sequence(),
        }
    }

    pub fn to_raw(self) -> u16 {
        let word = SerialWord::new()
            .with_sequence(self.sequence)
            .with_year(self.year);
        u16::from_le_bytes(word.into_bytes())
    }

    /// Parse the five character suffix printed on the unit, e.g. `"50042"` is
    /// year `5`, sequence `42`.
    ///
    /// The year is a single hex digit so that years 10-15 fit, e.g. `"C0042"` is year `12`.
    pub fn parse(suffix: &str) -> Result<Self, InvalidValue> {
        let bytes = suffix.as_bytes();
        if bytes.len() != 5
            || !bytes[0].is_ascii_hexdigit()
            || !bytes[1..].iter().all(u8::is_ascii_digit)
        {
            return Err(InvalidValue::SerialFormat);
        }
        let year = char::from(bytes[0])
            .to_digit(16)
            .ok_or(InvalidValue::SerialFormat)? as u8;
        let sequence = bytes[1..]
            .iter()
            .fold(0u16, |acc, digit| acc * 10 + u16::from(digit - b'0'));
        Self::new(year, sequence)
    }
}

impl core::str::FromStr for SerialCode {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Full serial number, assembled from three registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialNumber {
    pub hardware: VersionPair,
    pub software: VersionPair,
    pub code: SerialCode,
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SERIAL_PREFIX}{}{}{}{}{:X}{:04}",
            self.hardware.major,
            self.hardware.minor,
            self.software.major,
            self.software.minor,
            self.code.year,
            self.code.sequence
        )
    }
}
