//! embassy-time driver on the Cortex-M SysTick.
//!
//! SysTick fires once per embassy tick; each interrupt advances a 64-bit
//! tick counter and, once the earliest deadline has passed, wakes every
//! expired timer in the queue.

use core::cell::RefCell;
use core::task::Waker;

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use cortex_m_rt::exception;
use critical_section::Mutex;
use embassy_time_driver::{Driver, TICK_HZ};
use embassy_time_queue_utils::Queue;
use portable_atomic::{AtomicU64, Ordering};

const _: () = assert!(TICK_HZ == 1_000, "SysTick driver expects a 1 kHz tick");

struct TimerQueue {
    queue: Queue,
    next_wakeup: u64,
}

impl TimerQueue {
    const fn new() -> Self {
        Self {
            queue: Queue::new(),
            next_wakeup: u64::MAX,
        }
    }

    fn handle_tick(&mut self, now: u64) {
        if now < self.next_wakeup {
            return;
        }
        self.next_wakeup = self.queue.next_expiration(now);
    }

    fn schedule_wake(&mut self, at: u64, waker: &Waker) {
        if self.queue.schedule_wake(at, waker) {
            self.next_wakeup = self.next_wakeup.min(at);
        }
    }
}

struct SysTickDriver {
    ticks: AtomicU64,
    queue: Mutex<RefCell<TimerQueue>>,
}

embassy_time_driver::time_driver_impl!(static DRIVER: SysTickDriver = SysTickDriver {
    ticks: AtomicU64::new(0),
    queue: Mutex::new(RefCell::new(TimerQueue::new())),
});

impl SysTickDriver {
    fn on_tick(&self) {
        let now = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        critical_section::with(|cs| {
            self.queue.borrow_ref_mut(cs).handle_tick(now);
        });
    }
}

impl Driver for SysTickDriver {
    #[inline]
    fn now(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    fn schedule_wake(&self, at: u64, waker: &Waker) {
        critical_section::with(|cs| {
            self.queue.borrow_ref_mut(cs).schedule_wake(at, waker);
        });
    }
}

/// Start SysTick at the embassy tick rate from a `core_clock_hz` core clock.
pub fn init(mut syst: SYST, core_clock_hz: u32) {
    let reload = core_clock_hz / TICK_HZ as u32 - 1;
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(reload);
    syst.clear_current();
    syst.enable_interrupt();
    syst.enable_counter();
    debug!("SysTick reload {}", reload);
}

#[exception]
fn SysTick() {
    DRIVER.on_tick();
}
