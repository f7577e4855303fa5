//! Clock gating, pin muxing and watchdog control for the K65 tower board.
//!
//! These are the few system registers the touch firmware needs before TSI0
//! can run. All of them are one-shot startup writes.

use core::ptr::{read_volatile, write_volatile};

/// Core clock out of reset: FLL engaged on the 32 kHz internal reference,
/// 640 times multiplier.
pub const CORE_CLOCK_HZ: u32 = 20_971_520;

const SIM_SCGC5: *mut u32 = 0x4004_8038 as *mut u32;
const SIM_SCGC5_TSI: u32 = 1 << 5;
const SIM_SCGC5_PORTB: u32 = 1 << 10;

const PORTB_PCR: *mut u32 = 0x4004_A000 as *mut u32;
const PORT_PCR_MUX_SHIFT: u32 = 8;

const WDOG_STCTRLH: *mut u16 = 0x4005_2000 as *mut u16;
const WDOG_UNLOCK: *mut u16 = 0x4005_200E as *mut u16;
const WDOG_UNLOCK_KEYS: [u16; 2] = [0xC520, 0xD928];
/// STCTRLH reset value with WDOGEN cleared.
const WDOG_STCTRLH_DISABLED: u16 = 0x01D2;

/// Port B pin carrying PAD1 (TSI0 channel 12).
pub const PAD1_PIN: u8 = 19;
/// Port B pin carrying PAD2 (TSI0 channel 11).
pub const PAD2_PIN: u8 = 18;

/// Pin mux alternatives of a port control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMux {
    /// ALT0: pin disabled, analog functions such as TSI.
    Analog = 0,
    Gpio = 1,
}

/// `PCR` value selecting `mux` with every other option at reset state.
pub const fn pcr(mux: PinMux) -> u32 {
    (mux as u32) << PORT_PCR_MUX_SHIFT
}

/// Turn off the watchdog, which runs from reset.
///
/// The unlock sequence has to complete within a few bus cycles, so it runs
/// with interrupts masked.
pub fn disable_watchdog() {
    cortex_m::interrupt::free(|_| {
        // SAFETY: fixed WDOG addresses, writes follow the unlock protocol.
        unsafe {
            for key in WDOG_UNLOCK_KEYS {
                write_volatile(WDOG_UNLOCK, key);
            }
            write_volatile(WDOG_STCTRLH, WDOG_STCTRLH_DISABLED);
        }
    });
}

/// Open the clock gates of TSI0 and of port B, where the pads are wired.
pub fn enable_tsi_clock() {
    // SAFETY: fixed SIM address, read-modify-write of gate bits only.
    unsafe {
        let gates = read_volatile(SIM_SCGC5);
        write_volatile(SIM_SCGC5, gates | SIM_SCGC5_TSI | SIM_SCGC5_PORTB);
    }
    debug!("TSI0 and PORTB clocks enabled");
}

/// Hand both pad pins over to TSI0.
///
/// Port B's clock gate must be open.
pub fn route_touch_pins() {
    for pin in [PAD1_PIN, PAD2_PIN] {
        // SAFETY: PCR[n] for n < 32 lies inside the PORTB block.
        unsafe { write_volatile(PORTB_PCR.add(pin as usize), pcr(PinMux::Analog)) };
    }
    debug!("PTB{} and PTB{} routed to TSI0", PAD1_PIN, PAD2_PIN);
}
