use embassy_time::Duration;

use crate::cycle::PadPair;
use crate::electrode::Electrode;
use crate::error::ConfigError;

/// Touch offset above baseline, determined experimentally on the tower board.
pub const DEFAULT_TOUCH_OFFSET: u16 = 0x0400;
/// Scan period of the touch task.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(10);
/// Shorter periods make the task block on scans that have not finished.
pub const MIN_PERIOD: Duration = Duration::from_millis(5);
/// Longer periods start missing short presses.
pub const MAX_PERIOD: Duration = Duration::from_millis(25);
/// Polls of the end-of-scan flag before a scan is declared dead. A 16 x
/// prescaled scan finishes in a few thousand polls at full core clock.
pub const DEFAULT_SPIN_LIMIT: u32 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadConfig {
    pub electrode: Electrode,
    /// Counts above baseline required to register a touch.
    pub offset: u16,
}

impl PadConfig {
    pub const fn new(electrode: Electrode) -> Self {
        Self { electrode, offset: DEFAULT_TOUCH_OFFSET }
    }

    pub const fn with_offset(mut self, offset: u16) -> Self {
        self.offset = offset;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchConfig {
    /// The wired pads, in scan order.
    pub pads: [PadConfig; 2],
    pub period: Duration,
    pub spin_limit: u32,
}

impl TouchConfig {
    pub const fn new(first: PadConfig, second: PadConfig) -> Self {
        Self {
            pads: [first, second],
            period: DEFAULT_PERIOD,
            spin_limit: DEFAULT_SPIN_LIMIT,
        }
    }

    pub const fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub const fn with_spin_limit(mut self, spin_limit: u32) -> Self {
        self.spin_limit = spin_limit;
        self
    }

    pub const fn pad_pair(&self) -> PadPair {
        PadPair {
            first: self.pads[0].electrode,
            second: self.pads[1].electrode,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period < MIN_PERIOD || self.period > MAX_PERIOD {
            return Err(ConfigError::PeriodOutOfRange(self.period.as_millis()));
        }
        if self.pads[0].electrode == self.pads[1].electrode {
            return Err(ConfigError::DuplicatePad(self.pads[0].electrode));
        }
        if self.spin_limit == 0 {
            return Err(ConfigError::ZeroSpinLimit);
        }
        Ok(())
    }
}
