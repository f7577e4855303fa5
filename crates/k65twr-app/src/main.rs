#![no_std]
#![no_main]

// This mod MUST go first, so that the others see its macros.
mod fmt;

mod time_driver;

use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Duration;
use static_cell::StaticCell;

#[cfg(feature = "defmt")]
use defmt_rtt as _;
#[cfg(feature = "defmt")]
use panic_probe as _;
#[cfg(not(feature = "defmt"))]
use panic_reset as _;

use k65twr_bsp::{board, touch_config, Tsi0, Tsi0Config, PAD1, PAD2};
use touch_tsi::{PendError, TouchChannel, TouchDriver};

const FW_VERSION: &str = env!("FW_VERSION");

/// How long the consumer waits for a touch before logging that it is idle.
const PEND_TIMEOUT: Duration = Duration::from_secs(1);
/// Idle timeouts in a row after which both pads are rebaselined.
const IDLE_TIMEOUTS_BEFORE_RECAL: u32 = 60;

type AppTouchChannel = TouchChannel<CriticalSectionRawMutex>;
type AppTouchDriver = TouchDriver<'static, Tsi0, CriticalSectionRawMutex>;

static TOUCH_CHANNEL: StaticCell<AppTouchChannel> = StaticCell::new();

/// Kinetis flash configuration field: no backdoor key, no protection,
/// unsecured, default boot options.
#[link_section = ".flash_config"]
#[used]
static FLASH_CONFIG: [u8; 16] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // backdoor key
    0xFF, 0xFF, 0xFF, 0xFF, // FPROT3..0
    0xFE, // FSEC
    0xFF, // FOPT
    0xFF, // FEPROT
    0xFF, // FDPROT
];

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    board::disable_watchdog();
    let core = unwrap!(cortex_m::Peripherals::take());
    time_driver::init(core.SYST, board::CORE_CLOCK_HZ);
    info!("K65 touch firmware {}", FW_VERSION);

    board::enable_tsi_clock();
    board::route_touch_pins();
    let mut tsi = unwrap!(Tsi0::take(&Tsi0Config::k65twr()));
    tsi.enable();

    let channel: &'static AppTouchChannel = TOUCH_CHANNEL.init(TouchChannel::new());

    // Pads must be untouched until calibration is done. Without a working
    // scan task every later pend would just time out, so failures are fatal.
    let mut driver = unwrap!(TouchDriver::new(tsi, channel, touch_config()));
    unwrap!(driver.init());

    spawner.must_spawn(touch_task(driver));
    spawner.must_spawn(touch_consumer(channel));
}

#[embassy_executor::task]
async fn touch_task(mut driver: AppTouchDriver) -> ! {
    touch_tsi::run(&mut driver).await
}

/// Logs pad transitions, and rebaselines the pads after a long quiet spell to
/// follow slow drift.
#[embassy_executor::task]
async fn touch_consumer(channel: &'static AppTouchChannel) -> ! {
    let mut idle = 0;
    loop {
        match channel.pend(PEND_TIMEOUT).await {
            Ok(mask) => {
                idle = 0;
                info!(
                    "Touch mask {:?}: pad1 {}, pad2 {}",
                    mask,
                    mask.is_touched(PAD1),
                    mask.is_touched(PAD2)
                );
            }
            Err(PendError::Timeout) => {
                idle += 1;
                if idle < IDLE_TIMEOUTS_BEFORE_RECAL || !channel.latest().is_empty() {
                    continue;
                }
                idle = 0;
                debug!("Pads idle, requesting recalibration");
                for pad in [PAD1, PAD2] {
                    if let Err(e) = channel.request_recalibration(pad) {
                        warn!("Recalibration request dropped: {:?}", e);
                    }
                }
            }
        }
    }
}
