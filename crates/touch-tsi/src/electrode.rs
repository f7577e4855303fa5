//! Electrode identifiers and the touch bitmask.

use crate::error::Error;

/// Number of channels the sensing peripheral can address.
pub const MAX_ELECTRODES: usize = 16;

/// A sensing channel, `0..MAX_ELECTRODES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Electrode(u8);

impl Electrode {
    /// Wraps a channel number, rejecting anything the peripheral cannot scan.
    pub const fn new(channel: u8) -> Result<Self, Error> {
        if (channel as usize) < MAX_ELECTRODES {
            Ok(Self(channel))
        } else {
            Err(Error::InvalidElectrode(channel))
        }
    }

    /// Const constructor for board tables; fails the build on a bad channel.
    pub const fn from_channel(channel: u8) -> Self {
        assert!((channel as usize) < MAX_ELECTRODES);
        Self(channel)
    }

    pub const fn channel(self) -> u8 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The bit this electrode occupies in a [`TouchMask`].
    pub const fn bit(self) -> u16 {
        1 << self.0
    }
}

impl core::fmt::Display for Electrode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// One bit per electrode, set while the electrode reads as touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchMask(u16);

impl TouchMask {
    pub const NONE: Self = Self(0);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_touched(self, electrode: Electrode) -> bool {
        self.0 & electrode.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Sets or clears the electrode's bit, leaving every other bit alone.
    pub fn set(&mut self, electrode: Electrode, touched: bool) {
        if touched {
            self.0 |= electrode.bit();
        } else {
            self.0 &= !electrode.bit();
        }
    }

    /// Electrodes whose bit is set, lowest channel first.
    pub fn touched(self) -> impl Iterator<Item = Electrode> {
        (0..MAX_ELECTRODES as u8)
            .filter(move |ch| self.0 & (1 << ch) != 0)
            .map(Electrode)
    }
}

impl From<TouchMask> for u16 {
    fn from(mask: TouchMask) -> Self {
        mask.0
    }
}

impl core::fmt::Display for TouchMask {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#06b}", self.0)
    }
}
