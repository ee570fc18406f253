//! Blocking wait used while the unit is moving.

use fugit::MicrosDurationU64;

/// Something that can block the caller for a given duration.
pub trait Delay {
    fn delay(&mut self, duration: MicrosDurationU64);
}

/// Blocks the calling thread with [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay(&mut self, duration: MicrosDurationU64) {
        std::thread::sleep(std::time::Duration::from_micros(duration.to_micros()));
    }
}
