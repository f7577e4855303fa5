//! Per-electrode calibration levels.

use crate::electrode::{Electrode, MAX_ELECTRODES};

/// Baseline and detection threshold of one electrode.
///
/// `threshold` is only ever written together with `baseline`, so it is always
/// `baseline + offset` of the most recent calibration. The sum saturates at
/// `u16::MAX` rather than wrapping to a tiny threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchLevel {
    baseline: u16,
    offset: u16,
    threshold: u16,
}

impl TouchLevel {
    /// Level for a pad that has not been calibrated yet (baseline of zero).
    pub const fn uncalibrated(offset: u16) -> Self {
        Self::with_baseline(0, offset)
    }

    pub const fn with_baseline(baseline: u16, offset: u16) -> Self {
        Self {
            baseline,
            offset,
            threshold: baseline.saturating_add(offset),
        }
    }

    pub const fn baseline(&self) -> u16 {
        self.baseline
    }

    pub const fn offset(&self) -> u16 {
        self.offset
    }

    pub const fn threshold(&self) -> u16 {
        self.threshold
    }

    /// A count strictly above the threshold reads as a touch.
    pub const fn is_touch(&self, count: u16) -> bool {
        count > self.threshold
    }
}

/// Fixed table of levels indexed by electrode id.
#[derive(Debug, Clone)]
pub struct TouchLevels {
    levels: [TouchLevel; MAX_ELECTRODES],
}

impl Default for TouchLevels {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchLevels {
    pub const fn new() -> Self {
        Self {
            levels: [TouchLevel::uncalibrated(0); MAX_ELECTRODES],
        }
    }

    /// Sets the sensitivity margin of an electrode. The baseline is kept and
    /// the threshold follows.
    pub fn set_offset(&mut self, electrode: Electrode, offset: u16) {
        let level = &mut self.levels[electrode.index()];
        *level = TouchLevel::with_baseline(level.baseline, offset);
    }

    /// Records an untouched count as the new baseline, discarding the old one.
    pub fn calibrate(&mut self, electrode: Electrode, count: u16) -> TouchLevel {
        let level = &mut self.levels[electrode.index()];
        *level = TouchLevel::with_baseline(count, level.offset);
        *level
    }

    pub fn get(&self, electrode: Electrode) -> &TouchLevel {
        &self.levels[electrode.index()]
    }
}
