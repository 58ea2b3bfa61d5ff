// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Channel model: which output lines a pulse train drives, and when.

use indexmap::IndexMap;
use timing_units::{Ticks, ns_to_ticks};

use crate::device_traits::FLAG_WORD_BITS;
use crate::{Error, Result};

/// A single output pulse in ticks. `duration` may be zero; a zero-length
/// pulse toggles on and off at the same instant and cancels out of the
/// compiled program entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pulse {
    pub start: Ticks,
    pub duration: Ticks,
}

impl Pulse {
    pub fn new(start: Ticks, duration: Ticks) -> Self {
        Pulse { start, duration }
    }

    /// Falling-edge time.
    pub fn end(&self) -> Ticks {
        self.start + self.duration
    }
}

/// Maps channel names to flag-bit positions.
///
/// Owned by the hardware configuration: the wiring from output connectors to
/// experiment roles is fixed per setup, and the compiler only ever sees the
/// resolved bits. Insertion order is preserved and used as presentation
/// order for pulse diagrams.
#[derive(Debug, Clone)]
pub struct ChannelTable {
    bits: IndexMap<String, u8>,
    flag_bits: u8,
}

impl ChannelTable {
    /// Creates an empty table for a board with `flag_bits` output lines.
    pub fn new(flag_bits: u8) -> Self {
        ChannelTable {
            bits: IndexMap::new(),
            flag_bits,
        }
    }

    /// Assigns `name` to flag bit `bit`. Names and bits must both be unique,
    /// and `bit` must address one of the board's output lines.
    pub fn assign(&mut self, name: impl Into<String>, bit: u8) -> Result<()> {
        let name = name.into();
        if bit >= self.flag_bits {
            return Err(anyhow::anyhow!(
                "flag bit {bit} for `{name}` is outside the board's {} output lines",
                self.flag_bits
            )
            .into());
        }
        if self.bits.contains_key(&name) {
            return Err(anyhow::anyhow!("channel `{name}` is assigned twice").into());
        }
        if let Some((taken, _)) = self.bits.iter().find(|&(_, &b)| b == bit) {
            return Err(anyhow::anyhow!(
                "flag bit {bit} for `{name}` is already assigned to `{taken}`"
            )
            .into());
        }
        self.bits.insert(name, bit);
        Ok(())
    }

    /// Flag bit position for `name`.
    pub fn bit(&self, name: &str) -> Result<u8> {
        self.bits
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownChannelName {
                name: name.to_string(),
            })
    }

    /// One-hot flag word for `name`.
    pub fn flags(&self, name: &str) -> Result<u32> {
        Ok(1u32 << self.bit(name)?)
    }

    /// Assigned names and bits, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.bits.iter().map(|(name, &bit)| (name.as_str(), bit))
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

/// A pulse train on one or more output lines, tick-quantized.
///
/// `flags` is one-hot for ordinary named channels. Synthetic channels carry
/// composite words: fractional-period channels hold their width multiplier
/// shifted into the reserved high bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub flags: u32,
    pub pulses: Vec<Pulse>,
}

impl Channel {
    /// Builds a channel from caller-supplied nanosecond times.
    ///
    /// Looks up the flag bit for `name`, quantizes every start and duration
    /// onto the tick grid and stores the result as whole ticks.
    ///
    /// # Arguments
    ///
    /// * `name` - Channel name to resolve through `table`.
    /// * `table` - Name to flag-bit table from the hardware configuration.
    /// * `starts_ns` - Pulse start times in nanoseconds.
    /// * `durations_ns` - Pulse durations in nanoseconds, paired with
    ///   `starts_ns` by index.
    /// * `tick_ns` - Tick period of the target board.
    ///
    /// # Returns
    ///
    /// The quantized channel, [`Error::UnknownChannelName`] if `name` is not
    /// in the table, [`Error::MismatchedLengths`] if the lists differ in
    /// length, or [`Error::Timing`] for negative time values.
    pub fn from_name(
        name: &str,
        table: &ChannelTable,
        starts_ns: &[f64],
        durations_ns: &[f64],
        tick_ns: f64,
    ) -> Result<Self> {
        check_lengths(name, starts_ns, durations_ns)?;
        let flags = table.flags(name)?;
        Ok(Channel {
            flags,
            pulses: quantize_pulses(starts_ns, durations_ns, tick_ns)?,
        })
    }

    /// Wraps an already quantized pulse train in a channel with the given
    /// flag word. Used for synthetic channels; ordinary callers go through
    /// [`Channel::from_name`].
    pub fn from_flags(flags: u32, pulses: Vec<Pulse>) -> Self {
        Channel { flags, pulses }
    }

    /// Builds a fractional-period channel that drives the reserved
    /// multiplier bits directly.
    ///
    /// The flag word is `multiplier << short_pulse_bit`. Experiment
    /// generators use this to request sub-reliable output widths explicitly;
    /// the automatic short-pulse pass produces the same channels for pulses
    /// it rewrites.
    pub fn fractional(
        multiplier: u32,
        starts_ns: &[f64],
        durations_ns: &[f64],
        tick_ns: f64,
        short_pulse_bit: u8,
    ) -> Result<Self> {
        if short_pulse_bit >= FLAG_WORD_BITS {
            return Err(anyhow::anyhow!(
                "short-pulse bit {short_pulse_bit} is outside the {FLAG_WORD_BITS}-bit flag word"
            )
            .into());
        }
        let field_bits = FLAG_WORD_BITS - short_pulse_bit;
        if multiplier == 0 || multiplier >= 1 << field_bits {
            return Err(anyhow::anyhow!(
                "fractional multiplier {multiplier} does not fit the {field_bits}-bit field at bit {short_pulse_bit}"
            )
            .into());
        }
        let name = format!("{multiplier}-period");
        check_lengths(&name, starts_ns, durations_ns)?;
        Ok(Channel {
            flags: multiplier << short_pulse_bit,
            pulses: quantize_pulses(starts_ns, durations_ns, tick_ns)?,
        })
    }

    /// Latest falling edge, or 0 for a pulse-free channel.
    pub fn last_edge(&self) -> Ticks {
        self.pulses.iter().map(Pulse::end).max().unwrap_or(0)
    }
}

fn check_lengths(name: &str, starts_ns: &[f64], durations_ns: &[f64]) -> Result<()> {
    if starts_ns.len() != durations_ns.len() {
        return Err(Error::MismatchedLengths {
            name: name.to_string(),
            starts: starts_ns.len(),
            durations: durations_ns.len(),
        });
    }
    Ok(())
}

fn quantize_pulses(starts_ns: &[f64], durations_ns: &[f64], tick_ns: f64) -> Result<Vec<Pulse>> {
    starts_ns
        .iter()
        .zip(durations_ns)
        .map(|(&start, &duration)| {
            Ok(Pulse::new(
                ns_to_ticks(start, tick_ns)?,
                ns_to_ticks(duration, tick_ns)?,
            ))
        })
        .collect()
}
