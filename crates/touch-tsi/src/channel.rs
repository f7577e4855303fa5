//! Handoff between the scanning task and touch consumers.
//!
//! The buffer is a single slot: each publish overwrites the held bitmask and
//! raises a binary notification. Consumers wake on the notification and read
//! whatever is held at that moment, so a burst of changes between two pends
//! collapses into the last value. This is not a queue.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::{Context, Poll};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::waitqueue::MultiWakerRegistration;
use embassy_time::{with_timeout, Duration};

use crate::electrode::{Electrode, TouchMask};
use crate::error::{PendError, RecalibrationError};

/// Outstanding recalibration requests the scanning task will accept.
pub const RECALIBRATION_DEPTH: usize = 4;

/// Consumers that can pend at the same time without waking each other.
///
/// More still work, but once the registry is full every new registration
/// wakes all parked consumers so they re-register.
pub const MAX_WAITERS: usize = 4;

struct Slot {
    mask: TouchMask,
    pending: bool,
    waiters: MultiWakerRegistration<MAX_WAITERS>,
}

/// Last published bitmask plus its "new data" notification.
///
/// The notification saturates: any number of publishes between two pends
/// leave one pending change, taken by whichever consumer gets to it first.
pub struct TouchBuffer<M: RawMutex> {
    slot: Mutex<M, RefCell<Slot>>,
}

impl<M: RawMutex> Default for TouchBuffer<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> TouchBuffer<M> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(Slot {
                mask: TouchMask::NONE,
                pending: false,
                waiters: MultiWakerRegistration::new(),
            })),
        }
    }

    /// Store `mask` and notify, unless it equals the held value.
    ///
    /// Returns whether a notification was posted. Posting while one is already
    /// pending leaves a single pending notification.
    pub fn publish(&self, mask: TouchMask) -> bool {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.mask == mask {
                return false;
            }
            slot.mask = mask;
            slot.pending = true;
            slot.waiters.wake();
            true
        })
    }

    pub fn latest(&self) -> TouchMask {
        self.slot.lock(|slot| slot.borrow().mask)
    }

    pub async fn pend(&self, timeout: Duration) -> Result<TouchMask, PendError> {
        with_timeout(timeout, self.wait())
            .await
            .map_err(|_| PendError::Timeout)
    }

    pub async fn wait(&self) -> TouchMask {
        poll_fn(|cx| self.poll_take(cx)).await
    }

    pub fn try_take(&self) -> Option<TouchMask> {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            core::mem::take(&mut slot.pending).then_some(slot.mask)
        })
    }

    /// Mask and notification are read under one lock, so a taken change
    /// always comes with the value that raised it.
    fn poll_take(&self, cx: &mut Context<'_>) -> Poll<TouchMask> {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            if core::mem::take(&mut slot.pending) {
                Poll::Ready(slot.mask)
            } else {
                slot.waiters.register(cx.waker());
                Poll::Pending
            }
        })
    }
}

/// Everything the scanning task shares with the rest of the application.
///
/// Place it in a `static` (or a `StaticCell`) and hand `&'static` references to
/// the touch task and to consumers.
pub struct TouchChannel<M: RawMutex> {
    buffer: TouchBuffer<M>,
    recalibrate: Channel<M, Electrode, RECALIBRATION_DEPTH>,
}

impl<M: RawMutex> Default for TouchChannel<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> TouchChannel<M> {
    pub const fn new() -> Self {
        Self {
            buffer: TouchBuffer::new(),
            recalibrate: Channel::new(),
        }
    }

    /// Block until the touch bitmask changes or `timeout` elapses.
    ///
    /// On success the current bitmask is returned; intermediate values
    /// published since the last pend are not observable. A timeout consumes
    /// nothing, the held bitmask stays readable through [`Self::latest`].
    pub async fn pend(&self, timeout: Duration) -> Result<TouchMask, PendError> {
        self.buffer.pend(timeout).await
    }

    /// Block until the touch bitmask changes, however long that takes.
    pub async fn wait(&self) -> TouchMask {
        self.buffer.wait().await
    }

    /// Non-blocking pend: the bitmask if a change is pending, consuming it.
    pub fn try_take(&self) -> Option<TouchMask> {
        self.buffer.try_take()
    }

    /// Held bitmask, without touching the notification.
    pub fn latest(&self) -> TouchMask {
        self.buffer.latest()
    }

    /// Ask the scanning task to rebaseline `electrode` before its next period.
    ///
    /// The pad must be untouched when the request is served; a finger on it
    /// silently produces a wrong baseline.
    pub fn request_recalibration(
        &self,
        electrode: Electrode,
    ) -> Result<(), RecalibrationError> {
        self.recalibrate
            .try_send(electrode)
            .map_err(|_| RecalibrationError::QueueFull(electrode))
    }

    pub(crate) fn buffer(&self) -> &TouchBuffer<M> {
        &self.buffer
    }

    pub(crate) async fn next_recalibration(&self) -> Electrode {
        self.recalibrate.receive().await
    }

    pub(crate) fn try_next_recalibration(&self) -> Option<Electrode> {
        self.recalibrate.try_receive().ok()
    }
}
