//! Driver for the Kinetis TSI0 touch sensing input.
//!
//! The peripheral measures one channel at a time: software selects the
//! channel and triggers a scan through `DATA`, hardware raises `EOSF` in
//! `GENCS` when all consecutive sub-scans are accumulated, and the count is
//! read back from `DATA`.
//!
//! There is no Kinetis PAC in the tree, so the registers are reached through
//! raw volatile accesses on the fixed TSI0 address.

use core::ptr::{addr_of, addr_of_mut};
use core::sync::atomic::{AtomicBool, Ordering};

use touch_tsi::{Electrode, TouchSensor};

/// Base address of TSI0 on the K6x family.
pub const TSI0_BASE: usize = 0x4004_5000;

const GENCS_EOSF: u32 = 1 << 2;
const GENCS_TSIEN: u32 = 1 << 7;
const GENCS_OUTRGF: u32 = 1 << 31;
/// Write-one-to-clear flags, masked out of read-modify-write cycles.
const GENCS_W1C: u32 = GENCS_EOSF | GENCS_OUTRGF;

const GENCS_NSCN_SHIFT: u32 = 8;
const GENCS_PS_SHIFT: u32 = 13;
const GENCS_EXTCHRG_SHIFT: u32 = 16;
const GENCS_DVOLT_SHIFT: u32 = 19;
const GENCS_REFCHRG_SHIFT: u32 = 21;

const DATA_TSICH_SHIFT: u32 = 28;
const DATA_SWTS: u32 = 1 << 22;
const DATA_TSICNT_MASK: u32 = 0xFFFF;

static TAKEN: AtomicBool = AtomicBool::new(false);

#[repr(C)]
#[derive(Debug, Default)]
pub struct RegisterBlock {
    gencs: u32,
    data: u32,
    _tshd: u32,
}

/// Oscillator charge and discharge current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeCurrent {
    Ua0_5 = 0b000,
    Ua1 = 0b001,
    Ua2 = 0b010,
    Ua4 = 0b011,
    Ua8 = 0b100,
    Ua16 = 0b101,
    Ua32 = 0b110,
    Ua64 = 0b111,
}

/// Oscillator voltage rails delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeltaVoltage {
    /// 1.026 V
    V1_026 = 0b00,
    /// 0.592 V
    V0_592 = 0b01,
    /// 0.342 V
    V0_342 = 0b10,
    /// 0.192 V
    V0_192 = 0b11,
}

/// Electrode oscillator prescaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    Div1 = 0b000,
    Div2 = 0b001,
    Div4 = 0b010,
    Div8 = 0b011,
    Div16 = 0b100,
    Div32 = 0b101,
    Div64 = 0b110,
    Div128 = 0b111,
}

/// Electrical setup of the sensing oscillators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tsi0Config {
    pub external_charge: ChargeCurrent,
    pub reference_charge: ChargeCurrent,
    pub delta_voltage: DeltaVoltage,
    pub prescaler: Prescaler,
    /// Consecutive sub-scans accumulated into one count, 1..=32.
    pub scans: u8,
}

impl Tsi0Config {
    /// Values tuned for the K65 tower board pads: 16 µA on both
    /// oscillators, 0.592 V delta, divide by 32 and 16 scans per count.
    pub const fn k65twr() -> Self {
        Self {
            external_charge: ChargeCurrent::Ua16,
            reference_charge: ChargeCurrent::Ua16,
            delta_voltage: DeltaVoltage::V0_592,
            prescaler: Prescaler::Div32,
            scans: 16,
        }
    }

    /// `GENCS` value for this configuration, peripheral disabled, software
    /// trigger, capacitive sensing mode.
    pub const fn gencs(&self) -> u32 {
        let nscn = match self.scans {
            0 => 0,
            n if n > 32 => 31,
            n => n - 1,
        } as u32;
        ((self.reference_charge as u32) << GENCS_REFCHRG_SHIFT)
            | ((self.delta_voltage as u32) << GENCS_DVOLT_SHIFT)
            | ((self.external_charge as u32) << GENCS_EXTCHRG_SHIFT)
            | ((self.prescaler as u32) << GENCS_PS_SHIFT)
            | (nscn << GENCS_NSCN_SHIFT)
    }
}

impl Default for Tsi0Config {
    fn default() -> Self {
        Self::k65twr()
    }
}

/// Owned handle on TSI0.
pub struct Tsi0 {
    regs: *mut RegisterBlock,
}

// SAFETY: `take` hands out at most one `Tsi0`, so moving it to the scanning
// task cannot create a second accessor.
unsafe impl Send for Tsi0 {}

impl Tsi0 {
    /// Claim TSI0 and load `config`. Returns `None` once the peripheral has
    /// already been claimed.
    ///
    /// The TSI clock gate must be open, see
    /// [`enable_tsi_clock`](crate::board::enable_tsi_clock).
    pub fn take(config: &Tsi0Config) -> Option<Self> {
        if TAKEN.swap(true, Ordering::AcqRel) {
            return None;
        }
        // SAFETY: TSI0_BASE is the TSI0 register block and we are its only
        // owner from here on.
        Some(unsafe { Self::from_ptr(TSI0_BASE as *mut RegisterBlock, config) })
    }

    /// # Safety
    ///
    /// `regs` must point to a TSI register block (or memory laid out like
    /// one) that nothing else accesses for the lifetime of the handle.
    pub unsafe fn from_ptr(regs: *mut RegisterBlock, config: &Tsi0Config) -> Self {
        let mut tsi = Self { regs };
        tsi.write_gencs(config.gencs() | GENCS_W1C);
        debug!("TSI0 GENCS {:#x}", config.gencs());
        tsi
    }

    pub fn enable(&mut self) {
        let gencs = self.read_gencs() & !GENCS_W1C;
        self.write_gencs(gencs | GENCS_TSIEN);
    }

    pub fn disable(&mut self) {
        let gencs = self.read_gencs() & !GENCS_W1C;
        self.write_gencs(gencs & !GENCS_TSIEN);
    }

    pub fn is_enabled(&self) -> bool {
        self.read_gencs() & GENCS_TSIEN != 0
    }

    fn read_gencs(&self) -> u32 {
        // SAFETY: see `from_ptr`.
        unsafe { addr_of!((*self.regs).gencs).read_volatile() }
    }

    fn write_gencs(&mut self, value: u32) {
        // SAFETY: see `from_ptr`.
        unsafe { addr_of_mut!((*self.regs).gencs).write_volatile(value) }
    }

    fn read_data(&self) -> u32 {
        // SAFETY: see `from_ptr`.
        unsafe { addr_of!((*self.regs).data).read_volatile() }
    }

    fn write_data(&mut self, value: u32) {
        // SAFETY: see `from_ptr`.
        unsafe { addr_of_mut!((*self.regs).data).write_volatile(value) }
    }
}

impl TouchSensor for Tsi0 {
    fn start_scan(&mut self, electrode: Electrode) {
        // Channel select must land before the trigger.
        self.write_data((electrode.channel() as u32) << DATA_TSICH_SHIFT);
        let data = self.read_data();
        self.write_data(data | DATA_SWTS);
    }

    fn scan_complete(&mut self) -> bool {
        self.read_gencs() & GENCS_EOSF != 0
    }

    fn take_count(&mut self) -> u16 {
        let gencs = self.read_gencs() & !GENCS_W1C;
        self.write_gencs(gencs | GENCS_EOSF);
        (self.read_data() & DATA_TSICNT_MASK) as u16
    }
}
