use crate::electrode::Electrode;

/// Errors raised by the driver while scanning or calibrating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Channel number outside the peripheral's range.
    InvalidElectrode(u8),
    /// End-of-scan never came within the spin limit. Treated as a hardware fault.
    ScanTimeout(Electrode),
    Config(ConfigError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidElectrode(ch) => {
                write!(f, "Invalid electrode channel: {}", ch)
            }
            Error::ScanTimeout(e) => {
                write!(f, "Scan of {} did not complete", e)
            }
            Error::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Scan period in milliseconds outside the supported window.
    PeriodOutOfRange(u64),
    /// Both pads are mapped to the same channel.
    DuplicatePad(Electrode),
    ZeroSpinLimit,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::PeriodOutOfRange(ms) => {
                write!(f, "Scan period of {}ms is out of range", ms)
            }
            ConfigError::DuplicatePad(e) => {
                write!(f, "Pad channel {} used twice", e)
            }
            ConfigError::ZeroSpinLimit => {
                write!(f, "Scan spin limit must be non-zero")
            }
        }
    }
}

/// Outcome of a pend that saw no new bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PendError {
    Timeout,
}

impl core::fmt::Display for PendError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PendError::Timeout => write!(f, "Timed out waiting for touch"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecalibrationError {
    /// Too many requests outstanding; the scanning task has not caught up.
    QueueFull(Electrode),
}

impl core::fmt::Display for RecalibrationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RecalibrationError::QueueFull(e) => {
                write!(f, "Recalibration queue full, dropped {}", e)
            }
        }
    }
}
