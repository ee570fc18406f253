//! This crate provides an interface for communicating with and controlling the IQR PTU2
//! pan-tilt unit.
//!
//! It uses Modbus RTU under the hood. Each accessor on [`PanTilt`](ptu::PanTilt) maps onto a
//! single holding register read or write; [`PanTilt::move_to`](ptu::PanTilt::move_to) combines
//! several of them into one blocking move.
//!
//! The serial port used for PTU comms should be configured like so:
//! * Default baud rate: 115200
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//!
//! With the `serial` feature (on by default) [`PanTilt::open`](ptu::PanTilt::open) does this
//! for you. Any other link implementing [embedded_io::Read] & [embedded_io::Write] can be
//! passed to [`PanTilt::new`](ptu::PanTilt::new).

pub mod delay;
pub mod error;
pub mod ptu;
pub mod register;
pub mod scaling;
#[cfg(feature = "serial")]
pub mod serial;
pub mod types;

#[cfg(test)]
mod mock_serial;

/// Version of this driver.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
