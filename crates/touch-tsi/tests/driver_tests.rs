mod common;

use common::*;
use touch_tsi::{
    ConfigError, Error, RecalibrationError, ScanPhase, TouchDriver, TouchMask,
    RECALIBRATION_DEPTH, TouchSensor,
};

const BASELINE: u16 = 1024;
const TOUCHED: u16 = 2100;

fn calibrated(channel: &TestChannel) -> TestDriver<'_> {
    let mut driver = TouchDriver::new(MockSensor::new(BASELINE), channel, config()).unwrap();
    driver.init().unwrap();
    driver
}

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

#[test]
fn init_sets_threshold_to_baseline_plus_offset() {
    let channel = TestChannel::new();
    let mut sensor = MockSensor::new(0);
    sensor.set_count(PAD1, 1024);
    sensor.set_count(PAD2, 1300);

    let mut driver = TouchDriver::new(sensor, &channel, config()).unwrap();
    driver.init().unwrap();

    for (pad, baseline) in [(PAD1, 1024), (PAD2, 1300)] {
        let level = driver.level(pad);
        assert_eq!(level.baseline(), baseline);
        assert_eq!(level.offset(), 0x0400);
        assert_eq!(level.threshold(), level.baseline() + level.offset());
    }
}

#[test]
fn calibration_does_not_publish() {
    let channel = TestChannel::new();
    let driver = calibrated(&channel);
    assert_eq!(driver.stats().publishes, 0);
    assert_eq!(channel.try_take(), None);
}

#[test]
fn recalibration_overwrites_baseline() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);

    driver.sensor().set_count(PAD1, 1500);
    let level = driver.calibrate(PAD1).unwrap();
    assert_eq!(level.baseline(), 1500);
    assert_eq!(driver.level(PAD1).threshold(), 1500 + 0x0400);
    assert_eq!(driver.level(PAD2).baseline(), BASELINE);
}

#[test]
fn recalibration_mid_cycle_restarts_from_first_phase() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);

    driver.step().unwrap();
    assert_eq!(driver.phase(), ScanPhase::ProcessSecondStartFirst);

    driver.calibrate(PAD2).unwrap();
    assert_eq!(driver.phase(), ScanPhase::ProcessFirstStartSecond);
    assert_eq!(driver.step().unwrap(), Some(PAD1));
    assert_eq!(driver.sensor().overlaps, 0);
}

#[test]
fn queued_recalibrations_are_served_in_order() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);

    driver.sensor().set_count(PAD1, 900);
    driver.sensor().set_count(PAD2, 950);
    channel.request_recalibration(PAD2).unwrap();
    channel.request_recalibration(PAD1).unwrap();
    driver.service_recalibrations().unwrap();

    assert_eq!(driver.level(PAD1).baseline(), 900);
    assert_eq!(driver.level(PAD2).baseline(), 950);
}

#[test]
fn recalibration_queue_is_bounded() {
    let channel = TestChannel::new();
    for _ in 0..RECALIBRATION_DEPTH {
        channel.request_recalibration(PAD1).unwrap();
    }
    assert_eq!(
        channel.request_recalibration(PAD2),
        Err(RecalibrationError::QueueFull(PAD2))
    );
}

#[test]
fn init_fails_on_dead_peripheral() {
    let channel = TestChannel::new();
    let mut sensor = MockSensor::new(BASELINE);
    sensor.dead = true;

    let mut driver = TouchDriver::new(sensor, &channel, config()).unwrap();
    assert_eq!(driver.init(), Err(Error::ScanTimeout(PAD1)));

    driver.sensor().dead = false;
    driver.init().unwrap();
    assert_eq!(driver.sensor().overlaps, 0);
}

#[test]
fn recalibration_reports_a_scan_that_never_finishes() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);

    driver.step().unwrap();
    driver.sensor().dead = true;
    let starts = driver.sensor().ops.len();
    assert_eq!(driver.calibrate(PAD1), Err(Error::ScanTimeout(PAD2)));
    assert_eq!(driver.stats().scan_faults, 1);
    assert_eq!(driver.sensor().ops.len(), starts);

    driver.sensor().dead = false;
    driver.calibrate(PAD1).unwrap();
    assert_eq!(driver.sensor().overlaps, 0);
}

#[test]
fn invalid_config_is_rejected() {
    let channel = TestChannel::new();
    let result = TouchDriver::new(
        MockSensor::new(BASELINE),
        &channel,
        config().with_spin_limit(0),
    );
    assert!(matches!(result, Err(Error::Config(ConfigError::ZeroSpinLimit))));
}

// ---------------------------------------------------------------------------
// Scan cycle
// ---------------------------------------------------------------------------

#[test]
fn pads_alternate_starting_with_pad_one() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);
    driver.sensor().ops.clear();

    let mut phases = Vec::new();
    let mut processed = Vec::new();
    for _ in 0..7 {
        phases.push(driver.phase());
        processed.push(driver.step().unwrap().unwrap());
    }

    for (i, pad) in processed.iter().enumerate() {
        // 1-indexed period i + 1: odd periods process pad 1
        let expected = if (i + 1) % 2 == 1 { PAD1 } else { PAD2 };
        assert_eq!(*pad, expected, "period {}", i + 1);
    }
    for pair in phases.windows(2) {
        assert_eq!(pair[1], pair[0].next());
    }
    assert_eq!(driver.sensor().processed(), processed);
    assert_eq!(driver.stats().periods, 7);
}

#[test]
fn never_two_scans_in_flight() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);

    for i in 0..20u16 {
        driver.sensor().set_count(PAD1, if i % 3 == 0 { TOUCHED } else { BASELINE });
        driver.step().unwrap();
    }
    assert_eq!(driver.sensor().overlaps, 0);
}

#[test]
fn every_period_leaves_the_other_pad_scanning() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);
    driver.sensor().ops.clear();

    driver.step().unwrap();
    driver.step().unwrap();
    assert_eq!(
        driver.sensor().ops,
        vec![
            Op::Start(PAD1),
            Op::Take(PAD1),
            Op::Start(PAD2),
            Op::Take(PAD2),
            Op::Start(PAD1),
        ]
    );
}

#[test]
fn scan_fault_resyncs_to_first_phase() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);

    driver.step().unwrap();
    driver.sensor().dead = true;
    assert_eq!(driver.step(), Err(Error::ScanTimeout(PAD2)));
    assert_eq!(driver.phase(), ScanPhase::ProcessFirstStartSecond);
    assert_eq!(driver.stats().scan_faults, 1);

    // the timed-out scan of pad 2 is drained before pad 1 is started again
    driver.sensor().dead = false;
    assert_eq!(driver.step().unwrap(), None);
    assert_eq!(driver.step().unwrap(), Some(PAD1));
    assert_eq!(driver.step().unwrap(), Some(PAD2));
    assert_eq!(driver.sensor().overlaps, 0);
}

#[test]
fn stuck_scan_is_never_overlapped() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);

    driver.step().unwrap();
    driver.sensor().dead = true;
    let starts = driver.sensor().ops.len();
    for _ in 0..3 {
        assert_eq!(driver.step(), Err(Error::ScanTimeout(PAD2)));
    }
    assert_eq!(driver.sensor().ops.len(), starts);
    assert_eq!(driver.stats().scan_faults, 3);

    driver.sensor().dead = false;
    assert_eq!(driver.step().unwrap(), None);
    assert_eq!(driver.step().unwrap(), Some(PAD1));
    assert_eq!(driver.sensor().overlaps, 0);
    assert_eq!(driver.sensor().processed().last(), Some(&PAD1));
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

#[test]
fn count_above_threshold_sets_bit_zero() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);
    assert_eq!(driver.level(PAD1).threshold(), 2048);

    driver.sensor().set_count(PAD1, TOUCHED);
    assert_eq!(driver.step().unwrap(), Some(PAD1));

    assert_eq!(driver.flags(), TouchMask::from_bits(0b01));
    assert_eq!(channel.try_take(), Some(TouchMask::from_bits(0b01)));
}

#[test]
fn count_at_threshold_is_not_a_touch() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);

    driver.sensor().set_count(PAD1, 2048);
    driver.step().unwrap();
    assert!(driver.flags().is_empty());
    assert_eq!(driver.stats().publishes, 0);
}

#[test]
fn bit_follows_latest_count() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);
    let threshold = driver.level(PAD2).threshold();

    let script = [TOUCHED, BASELINE, TOUCHED, TOUCHED, 0, threshold + 1, threshold];
    for count in script {
        driver.sensor().set_count(PAD2, count);
        // one period to start pad 2 with the new count, one to process it
        driver.step().unwrap();
        driver.step().unwrap();
        assert_eq!(driver.flags().is_touched(PAD2), count > threshold, "count {}", count);
        assert!(!driver.flags().is_touched(PAD1));
    }
}

#[test]
fn release_clears_only_that_bit() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);

    driver.sensor().set_count(PAD1, TOUCHED);
    driver.sensor().set_count(PAD2, TOUCHED);
    driver.step().unwrap();
    // pad 1 is rescanned at the end of the next period and sees the release
    driver.sensor().set_count(PAD1, BASELINE);
    driver.step().unwrap();
    assert_eq!(driver.flags().bits(), 0b11);

    driver.step().unwrap();
    assert_eq!(driver.flags().bits(), 0b10);
    assert_eq!(channel.latest().bits(), 0b10);
}

#[test]
fn steady_state_posts_no_notifications() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);

    for _ in 0..5 {
        driver.step().unwrap();
    }
    assert_eq!(driver.stats().publishes, 0);
    assert_eq!(channel.try_take(), None);
}

#[test]
fn one_notification_per_transition() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);

    driver.sensor().set_count(PAD1, TOUCHED);
    for _ in 0..6 {
        driver.step().unwrap();
    }
    assert_eq!(driver.stats().publishes, 1);
    assert_eq!(channel.try_take(), Some(TouchMask::from_bits(0b01)));
    assert_eq!(channel.try_take(), None);

    driver.sensor().set_count(PAD1, BASELINE);
    for _ in 0..6 {
        driver.step().unwrap();
    }
    assert_eq!(driver.stats().publishes, 2);
    assert_eq!(channel.try_take(), Some(TouchMask::NONE));
    assert_eq!(channel.try_take(), None);
}

#[test]
fn processing_the_same_count_twice_posts_once() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);

    assert!(driver.evaluate(PAD1, TOUCHED));
    assert!(!driver.evaluate(PAD1, TOUCHED));

    driver.sensor().set_count(PAD2, TOUCHED);
    driver.sensor().start_scan(PAD2);
    assert!(driver.process(PAD2).unwrap());
    driver.sensor().start_scan(PAD2);
    assert!(!driver.process(PAD2).unwrap());

    assert_eq!(driver.stats().publishes, 2);
    assert_eq!(channel.try_take(), Some(TouchMask::from_bits(0b11)));
    assert_eq!(channel.try_take(), None);
}

#[test]
fn consumers_see_only_the_latest_value() {
    let channel = TestChannel::new();
    let mut driver = calibrated(&channel);

    assert!(driver.evaluate(PAD1, TOUCHED));
    assert!(driver.evaluate(PAD2, TOUCHED));
    assert!(driver.evaluate(PAD1, BASELINE));

    assert_eq!(channel.try_take(), Some(TouchMask::from_bits(0b10)));
    assert_eq!(channel.try_take(), None);
}
