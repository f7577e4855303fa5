//! Two-phase scan cycle.
//!
//! Every period one pad's finished scan is processed and the other pad's scan
//! is started, so the hardware is always measuring something while software
//! works on the previous result, and only one scan is ever in flight.

use crate::electrode::Electrode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanPhase {
    #[default]
    ProcessFirstStartSecond,
    ProcessSecondStartFirst,
}

impl ScanPhase {
    pub const fn next(self) -> Self {
        match self {
            Self::ProcessFirstStartSecond => Self::ProcessSecondStartFirst,
            Self::ProcessSecondStartFirst => Self::ProcessFirstStartSecond,
        }
    }
}

/// The two wired pads, in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PadPair {
    pub first: Electrode,
    pub second: Electrode,
}

/// What the current period has to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleStep {
    pub process: Electrode,
    pub start: Electrode,
}

/// Phase plus the scan the peripheral is currently working on.
#[derive(Debug, Clone)]
pub struct ScanCycle {
    pads: PadPair,
    phase: ScanPhase,
    in_flight: Option<Electrode>,
}

impl ScanCycle {
    pub const fn new(pads: PadPair) -> Self {
        Self {
            pads,
            phase: ScanPhase::ProcessFirstStartSecond,
            in_flight: None,
        }
    }

    pub const fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub const fn pads(&self) -> PadPair {
        self.pads
    }

    pub const fn in_flight(&self) -> Option<Electrode> {
        self.in_flight
    }

    /// The leading start: pad one, but only when nothing is being measured.
    pub fn leading_start(&self) -> Option<Electrode> {
        match self.in_flight {
            None => Some(self.pads.first),
            Some(_) => None,
        }
    }

    pub const fn step(&self) -> CycleStep {
        match self.phase {
            ScanPhase::ProcessFirstStartSecond => CycleStep {
                process: self.pads.first,
                start: self.pads.second,
            },
            ScanPhase::ProcessSecondStartFirst => CycleStep {
                process: self.pads.second,
                start: self.pads.first,
            },
        }
    }

    /// True when the scan in flight is the one this phase is about to process.
    pub fn in_sync(&self) -> bool {
        self.in_flight == Some(self.step().process)
    }

    pub fn mark_started(&mut self, electrode: Electrode) {
        self.in_flight = Some(electrode);
    }

    pub fn mark_processed(&mut self, electrode: Electrode) {
        if self.in_flight == Some(electrode) {
            self.in_flight = None;
        }
    }

    pub fn advance(&mut self) {
        self.phase = self.phase.next();
    }

    /// Back to the first phase, keeping track of any scan still running so
    /// the next period drains it before starting another.
    pub fn restart(&mut self) {
        self.phase = ScanPhase::ProcessFirstStartSecond;
    }

    /// Recovery transition: back to the first phase with the peripheral
    /// considered idle, so the next leading start reseeds the cycle.
    pub fn resync(&mut self) {
        self.phase = ScanPhase::ProcessFirstStartSecond;
        self.in_flight = None;
    }
}
