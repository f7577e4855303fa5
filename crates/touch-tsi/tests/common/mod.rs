#![allow(dead_code)]

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use touch_tsi::{Electrode, PadConfig, TouchConfig, TouchSensor, MAX_ELECTRODES};

pub type TestChannel = touch_tsi::TouchChannel<CriticalSectionRawMutex>;
pub type TestDriver<'a> = touch_tsi::TouchDriver<'a, MockSensor, CriticalSectionRawMutex>;

pub const PAD1: Electrode = Electrode::from_channel(0);
pub const PAD2: Electrode = Electrode::from_channel(1);

/// Peripheral operations, in the order the driver issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Start(Electrode),
    Take(Electrode),
}

/// Scripted stand-in for the sensing peripheral.
///
/// Each pad reports whatever count the test last set for it. A scan latches
/// the count when started and completes after `scan_polls` polls of the
/// end-of-scan flag, or never while `dead` is set.
pub struct MockSensor {
    counts: [u16; MAX_ELECTRODES],
    scanning: Option<Electrode>,
    latched: u16,
    polls_left: u32,
    pub scan_polls: u32,
    pub dead: bool,
    /// Starts issued while an earlier scan was still unread.
    pub overlaps: usize,
    pub ops: Vec<Op>,
}

impl MockSensor {
    pub fn new(count: u16) -> Self {
        Self {
            counts: [count; MAX_ELECTRODES],
            scanning: None,
            latched: 0,
            polls_left: 0,
            scan_polls: 2,
            dead: false,
            overlaps: 0,
            ops: Vec::new(),
        }
    }

    pub fn set_count(&mut self, electrode: Electrode, count: u16) {
        self.counts[electrode.index()] = count;
    }

    /// Pads whose scans were read, in order.
    pub fn processed(&self) -> Vec<Electrode> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Take(e) => Some(*e),
                Op::Start(_) => None,
            })
            .collect()
    }
}

impl TouchSensor for MockSensor {
    fn start_scan(&mut self, electrode: Electrode) {
        if self.scanning.is_some() {
            self.overlaps += 1;
        }
        self.scanning = Some(electrode);
        self.latched = self.counts[electrode.index()];
        self.polls_left = self.scan_polls;
        self.ops.push(Op::Start(electrode));
    }

    fn scan_complete(&mut self) -> bool {
        if self.dead || self.scanning.is_none() {
            return false;
        }
        if self.polls_left == 0 {
            true
        } else {
            self.polls_left -= 1;
            false
        }
    }

    fn take_count(&mut self) -> u16 {
        if let Some(e) = self.scanning.take() {
            self.ops.push(Op::Take(e));
        }
        self.latched
    }
}

pub fn config() -> TouchConfig {
    TouchConfig::new(PadConfig::new(PAD1), PadConfig::new(PAD2)).with_spin_limit(100)
}
