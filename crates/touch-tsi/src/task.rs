use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Ticker;

use crate::driver::TouchDriver;
use crate::sensor::TouchSensor;

/// Body of the periodic scanning task.
///
/// Runs one scan period per tick and serves recalibration requests in between.
/// Scan faults are logged and the cycle reseeds itself on the next tick.
/// Wrap this in an executor task with concrete sensor and mutex types.
pub async fn run<S: TouchSensor, M: RawMutex>(
    driver: &mut TouchDriver<'_, S, M>,
) -> ! {
    let channel = driver.channel();
    let mut ticker = Ticker::every(driver.config().period);
    info!(
        "Touch scanning every {:?}ms",
        driver.config().period.as_millis()
    );

    loop {
        match select(ticker.next(), channel.next_recalibration()).await {
            Either::First(()) => {
                if let Err(e) = driver.step() {
                    warn!("Touch scan failed: {:?}", e);
                }
            }
            Either::Second(electrode) => {
                info!("Recalibrating {:?}", electrode);
                if let Err(e) = driver.calibrate(electrode) {
                    error!("Recalibration of {:?} failed: {:?}", electrode, e);
                }
            }
        }
    }
}
