// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Board specific traits for pulse program generation.
//!
//! Values come from the controller datasheets. The flag word is 24 bits on
//! every supported board; boards with the short-pulse feature reserve the
//! top bits of the word as the fractional-period multiplier field instead of
//! driving output lines with them.

use timing_units::Ticks;

/// Width of the flag word in an instruction, in bits. Compiled programs
/// never set bits at or above this position.
pub const FLAG_WORD_BITS: u8 = 24;

pub struct BoardTraits {
    /// Instruction clock in MHz; one tick is `1000 / clock_mhz` ns.
    pub clock_mhz: f64,
    /// Number of physical output lines, occupying the low bits of the flag
    /// word.
    pub flag_bits: u8,
    /// Lowest bit of the fractional-period multiplier field, for boards
    /// with the short-pulse feature.
    pub short_pulse_bit: Option<u8>,
    /// Shortest pulse width, in ticks, the outputs assert reliably.
    pub min_reliable_ticks: Ticks,
}

pub const ESR_PRO_500_TRAITS: BoardTraits = BoardTraits {
    clock_mhz: 500.0,
    flag_bits: 21,
    short_pulse_bit: Some(21),
    min_reliable_ticks: 5,
};

pub const USB_100_TRAITS: BoardTraits = BoardTraits {
    clock_mhz: 100.0,
    flag_bits: 24,
    short_pulse_bit: None,
    min_reliable_ticks: 5,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardKind {
    EsrPro500,
    Usb100,
}

impl BoardKind {
    pub const fn traits(&self) -> &'static BoardTraits {
        match self {
            BoardKind::EsrPro500 => &ESR_PRO_500_TRAITS,
            BoardKind::Usb100 => &USB_100_TRAITS,
        }
    }
}
