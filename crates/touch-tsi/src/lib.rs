#![cfg_attr(not(test), no_std)]
//! Capacitive touch driver for single-channel TSI style peripherals.
//!
//! Two pads are calibrated against an untouched baseline and then scanned
//! alternately from a periodic task: each period processes the scan started
//! last period and starts the other pad. Whenever the resulting touch bitmask
//! changes it is handed to a single-slot [`TouchChannel`], where consumers
//! pend on it with a timeout.
//!
//! The peripheral itself sits behind [`TouchSensor`]; board crates implement
//! it on top of their registers.

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod channel;
mod config;
mod cycle;
mod driver;
mod electrode;
mod error;
mod levels;
mod sensor;
mod task;

pub use channel::{TouchBuffer, TouchChannel, MAX_WAITERS, RECALIBRATION_DEPTH};
pub use config::{
    PadConfig, TouchConfig, DEFAULT_PERIOD, DEFAULT_SPIN_LIMIT,
    DEFAULT_TOUCH_OFFSET, MAX_PERIOD, MIN_PERIOD,
};
pub use cycle::{CycleStep, PadPair, ScanCycle, ScanPhase};
pub use driver::{TouchDriver, TouchStats};
pub use electrode::{Electrode, TouchMask, MAX_ELECTRODES};
pub use error::{ConfigError, Error, PendError, RecalibrationError};
pub use levels::{TouchLevel, TouchLevels};
pub use sensor::{await_and_read_count, TouchSensor};
pub use task::run;
