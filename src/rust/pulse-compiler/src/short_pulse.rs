// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Fractional-period encoding for pulses below the reliable output width.
//!
//! The controller cannot promise that an output asserts at all when an
//! instruction is shorter than [`BoardTraits::min_reliable_ticks`]. The
//! datasheet workaround reserves the top bits of the flag word as a width
//! multiplier: an instruction that spans the full reliable window with
//! multiplier `m` drives its flagged outputs high for `m` ticks, then low
//! for the remainder of the window. The multiplier field is shared by the
//! whole flag word, so any other channel high during an encoded window is
//! narrowed with it. A hardware quirk for sub-reliable pulses only, not a
//! general timing mechanism.

use std::collections::BTreeMap;

use log::warn;

use crate::channel::{Channel, Pulse};
use crate::device_traits::BoardTraits;

/// Rewrites sub-reliable pulses onto the fractional-period bits.
///
/// Each pulse with `0 < duration < min_reliable_ticks` is stretched to the
/// full reliable window on its own channel, and a pulse spanning the same
/// window is added on a synthetic channel whose flag word carries the
/// original width in ticks, shifted into the multiplier field. The synthetic
/// channels flow through the event catalog like any others; nothing
/// downstream special-cases them.
///
/// Zero-length pulses pass through untouched (they cancel in the catalog),
/// and boards without the feature leave the channel set as-is.
pub(crate) fn encode_short_pulses(channels: &mut Vec<Channel>, traits: &BoardTraits) {
    let Some(short_pulse_bit) = traits.short_pulse_bit else {
        return;
    };
    let window = traits.min_reliable_ticks;
    let mut windows_by_multiplier: BTreeMap<u32, Vec<Pulse>> = BTreeMap::new();
    let mut rewritten = 0usize;
    for channel in channels.iter_mut() {
        for pulse in &mut channel.pulses {
            if pulse.duration > 0 && pulse.duration < window {
                let multiplier = pulse.duration as u32;
                pulse.duration = window;
                windows_by_multiplier
                    .entry(multiplier)
                    .or_default()
                    .push(*pulse);
                rewritten += 1;
            }
        }
    }
    if windows_by_multiplier.is_empty() {
        return;
    }
    warn!(
        "{rewritten} pulse(s) below the reliable minimum of {window} ticks re-encoded onto the fractional-period bits"
    );

    let mut all_windows: Vec<(Pulse, u32)> = vec![];
    for (multiplier, windows) in &mut windows_by_multiplier {
        windows.sort();
        // Identical windows would cancel each other in the XOR catalog.
        windows.dedup();
        all_windows.extend(windows.iter().map(|&w| (w, *multiplier)));
    }
    all_windows.sort();
    for pair in all_windows.windows(2) {
        let ((first, first_m), (second, second_m)) = (pair[0], pair[1]);
        if second.start < first.end() {
            warn!(
                "fractional windows starting at {} and {} ticks overlap (multipliers {first_m} and {second_m}); the board cannot honor both",
                first.start, second.start
            );
        }
    }

    for (multiplier, windows) in windows_by_multiplier {
        channels.push(Channel::from_flags(multiplier << short_pulse_bit, windows));
    }
}
