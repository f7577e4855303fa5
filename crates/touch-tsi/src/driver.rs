use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::channel::TouchChannel;
use crate::config::TouchConfig;
use crate::cycle::{ScanCycle, ScanPhase};
use crate::electrode::{Electrode, TouchMask};
use crate::error::Error;
use crate::levels::{TouchLevel, TouchLevels};
use crate::sensor::{await_and_read_count, TouchSensor};

/// Counters kept by the driver since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchStats {
    /// Completed scan periods.
    pub periods: u32,
    /// Bitmask changes handed to the buffer.
    pub publishes: u32,
    /// Scans that missed their completion deadline.
    pub scan_faults: u32,
    /// Periods skipped because the in-flight scan did not match the phase.
    pub resyncs: u32,
}

/// Owns the sensor, the calibration table, the working bitmask and the scan
/// phase. Only the scanning task holds one, which makes it the single writer
/// of everything the consumers see through the [`TouchChannel`].
pub struct TouchDriver<'a, S: TouchSensor, M: RawMutex> {
    sensor: S,
    channel: &'a TouchChannel<M>,
    config: TouchConfig,
    levels: TouchLevels,
    flags: TouchMask,
    cycle: ScanCycle,
    stats: TouchStats,
}

impl<'a, S: TouchSensor, M: RawMutex> TouchDriver<'a, S, M> {
    /// Build a driver for an enabled peripheral. Nothing is scanned yet.
    pub fn new(
        sensor: S,
        channel: &'a TouchChannel<M>,
        config: TouchConfig,
    ) -> Result<Self, Error> {
        config.validate()?;

        let mut levels = TouchLevels::new();
        for pad in config.pads.iter() {
            levels.set_offset(pad.electrode, pad.offset);
        }

        Ok(Self {
            sensor,
            channel,
            config,
            levels,
            flags: TouchMask::NONE,
            cycle: ScanCycle::new(config.pad_pair()),
            stats: TouchStats::default(),
        })
    }

    /// Calibrate every wired pad. The pads must not be touched meanwhile.
    pub fn init(&mut self) -> Result<(), Error> {
        let pads = self.config.pad_pair();
        self.calibrate(pads.first)?;
        self.calibrate(pads.second)?;
        Ok(())
    }

    /// Scan `electrode` once and take the count as its untouched baseline.
    ///
    /// Any scan the cycle had in flight is drained first and the cycle
    /// restarts from its first phase on the next period. If that scan never
    /// finishes, nothing new is started and its timeout is returned.
    pub fn calibrate(&mut self, electrode: Electrode) -> Result<TouchLevel, Error> {
        self.abandon_in_flight()?;

        self.start(electrode);
        let count =
            await_and_read_count(&mut self.sensor, electrode, self.config.spin_limit)?;
        self.cycle.mark_processed(electrode);
        let level = self.levels.calibrate(electrode, count);
        info!(
            "Calibrated {:?}: baseline {:?}, threshold {:?}",
            electrode,
            level.baseline(),
            level.threshold()
        );
        Ok(level)
    }

    /// One scan period: make sure a scan is in flight, process the finished
    /// pad and start the other one. Returns the pad that was processed, or
    /// `None` when the period was spent resynchronising the cycle.
    ///
    /// On a scan fault the error is returned and the cycle goes back to its
    /// first phase. The timed-out scan stays in flight, so the next call
    /// drains it before anything new is started.
    pub fn step(&mut self) -> Result<Option<Electrode>, Error> {
        if let Some(lead) = self.cycle.leading_start() {
            self.start(lead);
        }

        if !self.cycle.in_sync() {
            warn!(
                "Scan {:?} in flight during {:?}, resyncing",
                self.cycle.in_flight(),
                self.cycle.phase()
            );
            self.stats.resyncs = self.stats.resyncs.wrapping_add(1);
            self.abandon_in_flight()?;
            return Ok(None);
        }

        let step = self.cycle.step();
        if let Err(e) = self.process(step.process) {
            warn!("Scan fault on {:?}, resyncing", step.process);
            self.stats.scan_faults = self.stats.scan_faults.wrapping_add(1);
            self.cycle.restart();
            return Err(e);
        }
        self.start(step.start);
        self.cycle.advance();
        self.stats.periods = self.stats.periods.wrapping_add(1);
        Ok(Some(step.process))
    }

    /// Await `electrode`'s scan, classify the count and publish on change.
    ///
    /// The scan must have been started beforehand. Returns whether a new
    /// bitmask was handed to consumers.
    pub fn process(&mut self, electrode: Electrode) -> Result<bool, Error> {
        let count =
            await_and_read_count(&mut self.sensor, electrode, self.config.spin_limit)?;
        self.cycle.mark_processed(electrode);
        Ok(self.evaluate(electrode, count))
    }

    /// Apply a raw count for `electrode` to the bitmask and publish on change.
    pub fn evaluate(&mut self, electrode: Electrode, count: u16) -> bool {
        let touched = self.levels.get(electrode).is_touch(count);
        trace!("{:?} count {:?} touched {:?}", electrode, count, touched);
        self.flags.set(electrode, touched);

        let published = self.channel.buffer().publish(self.flags);
        if published {
            self.stats.publishes = self.stats.publishes.wrapping_add(1);
            debug!("Touch mask now {:?}", self.flags.bits());
        }
        published
    }

    /// Serve every queued recalibration request.
    pub fn service_recalibrations(&mut self) -> Result<(), Error> {
        while let Some(electrode) = self.channel.try_next_recalibration() {
            info!("Recalibrating {:?}", electrode);
            self.calibrate(electrode)?;
        }
        Ok(())
    }

    pub fn level(&self, electrode: Electrode) -> &TouchLevel {
        self.levels.get(electrode)
    }

    pub fn flags(&self) -> TouchMask {
        self.flags
    }

    pub fn phase(&self) -> ScanPhase {
        self.cycle.phase()
    }

    pub fn stats(&self) -> TouchStats {
        self.stats
    }

    pub fn config(&self) -> &TouchConfig {
        &self.config
    }

    pub fn channel(&self) -> &'a TouchChannel<M> {
        self.channel
    }

    pub fn sensor(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Tear the driver down, handing the peripheral back.
    pub fn release(self) -> S {
        self.sensor
    }

    fn start(&mut self, electrode: Electrode) {
        self.sensor.start_scan(electrode);
        self.cycle.mark_started(electrode);
    }

    /// Let the running scan finish and drop its count, so its end-of-scan
    /// flag is not mistaken for the next one, then reset the cycle.
    ///
    /// A scan that still does not finish stays in flight and its timeout is
    /// returned; starting another one on top of it would overlap.
    fn abandon_in_flight(&mut self) -> Result<(), Error> {
        if let Some(electrode) = self.cycle.in_flight() {
            if let Err(e) =
                await_and_read_count(&mut self.sensor, electrode, self.config.spin_limit)
            {
                warn!("Abandoned scan on {:?} never finished", electrode);
                self.stats.scan_faults = self.stats.scan_faults.wrapping_add(1);
                self.cycle.restart();
                return Err(e);
            }
        }
        self.cycle.resync();
        Ok(())
    }
}
