//! Hardware seam for the sensing peripheral.
//!
//! The peripheral measures one channel at a time: software selects a channel
//! and triggers a scan, the hardware later raises an end-of-scan flag and
//! latches the accumulated count. Implementors map these steps onto registers,
//! the rest of the crate only talks to this trait.

use crate::electrode::Electrode;
use crate::error::Error;

pub trait TouchSensor {
    /// Select `electrode` and trigger a software scan.
    ///
    /// Callers never start a scan while another one is in flight.
    fn start_scan(&mut self, electrode: Electrode);

    /// True once the hardware has flagged end-of-scan.
    fn scan_complete(&mut self) -> bool;

    /// Clear the end-of-scan flag and return the latched raw count.
    fn take_count(&mut self) -> u16;
}

impl<T: TouchSensor + ?Sized> TouchSensor for &mut T {
    fn start_scan(&mut self, electrode: Electrode) {
        T::start_scan(self, electrode)
    }

    fn scan_complete(&mut self) -> bool {
        T::scan_complete(self)
    }

    fn take_count(&mut self) -> u16 {
        T::take_count(self)
    }
}

/// Spin until end-of-scan, then clear the flag and return the count.
///
/// This blocks the calling task without yielding: a scan completes in well
/// under a millisecond. `spin_limit` polls bound the wait so a dead peripheral
/// surfaces as [`Error::ScanTimeout`] instead of a stall.
pub fn await_and_read_count<S: TouchSensor + ?Sized>(
    sensor: &mut S,
    electrode: Electrode,
    spin_limit: u32,
) -> Result<u16, Error> {
    for _ in 0..spin_limit {
        if sensor.scan_complete() {
            return Ok(sensor.take_count());
        }
        core::hint::spin_loop();
    }
    Err(Error::ScanTimeout(electrode))
}
