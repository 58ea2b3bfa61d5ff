// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Optional periodic trigger channel for synchronizing external equipment.

use timing_units::{Ticks, ceil_to_grid, ns_to_ticks};

use crate::channel::{Channel, Pulse};
use crate::{Error, Result};

/// Name under which the sync-out trigger line must appear in the channel
/// table when a sync-out frequency is configured.
pub const SYNC_OUT_CHANNEL: &str = "sync_out";

/// Builds the sync-out channel and the extended program duration.
///
/// The period is `1e3 / sync_mhz` ns, quantized to ticks. The program
/// length grows to the smallest whole number of periods covering
/// `base_duration` (at least one), entirely by widening the final
/// wrap-around gap; user pulses never move. One half-duty pulse is emitted
/// at the start of each period. Periods shorter than two ticks are
/// rejected: they leave no whole tick for the high half.
///
/// Returns the sync channel and the new target duration in ticks.
pub(crate) fn augment(
    sync_mhz: f64,
    sync_flags: u32,
    base_duration: Ticks,
    tick_ns: f64,
) -> Result<(Channel, Ticks)> {
    if sync_mhz.is_nan() || sync_mhz <= 0.0 {
        return Err(Error::InvalidSyncFrequency { mhz: sync_mhz });
    }
    let period_ns = 1e3 / sync_mhz;
    let period = ns_to_ticks(period_ns, tick_ns)?;
    // Below two ticks the half-duty high time is zero-length and would
    // cancel straight out of the event catalog.
    if period < 2 {
        return Err(anyhow::anyhow!(
            "sync-out frequency {sync_mhz} MHz gives a {period}-tick period; a half-duty pulse needs at least 2 ticks"
        )
        .into());
    }
    let target = ceil_to_grid(base_duration, period).max(period);
    let count = target / period;
    let pulses = (0..count)
        .map(|index| Pulse::new(index * period, period / 2))
        .collect();
    Ok((Channel::from_flags(sync_flags, pulses), target))
}
