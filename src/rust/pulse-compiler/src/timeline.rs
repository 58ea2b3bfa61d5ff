// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Event catalog: merges per-channel edges into one ordered timeline.

use std::collections::BTreeMap;

use timing_units::Ticks;

use crate::channel::Channel;

/// One timeline entry: the flag state holding from `time` until the next
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEntry {
    pub time: Ticks,
    pub state: u32,
}

/// Ordered (time, cumulative state) pairs spanning one program period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    #[cfg(test)]
    pub(crate) fn from_entries(entries: Vec<TimelineEntry>) -> Self {
        Timeline { entries }
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time of the last event. The catalog always contains t = 0, so this is
    /// 0 for a toggle-free channel set.
    pub fn last_time(&self) -> Ticks {
        self.entries.last().map_or(0, |entry| entry.time)
    }
}

/// Merges all channels' rising and falling edges into one ordered timeline.
///
/// Each distinct edge time accumulates the toggling channels' flag words by
/// XOR; the cumulative walk over the sorted times then yields the state that
/// holds after each instant. XOR rather than OR is load-bearing: a
/// zero-length pulse contributes a rising and a falling edge at the same
/// instant, which cancel, leaving the channel low instead of latched high
/// until the next event. Time 0 is always present, even when no channel has
/// an edge there.
///
/// Simultaneous toggles merge into one entry; their order does not matter
/// because XOR is commutative.
pub fn catalog_events(channels: &[Channel]) -> Timeline {
    let mut toggles: BTreeMap<Ticks, u32> = BTreeMap::new();
    toggles.insert(0, 0);
    for channel in channels {
        for pulse in &channel.pulses {
            *toggles.entry(pulse.start).or_insert(0) ^= channel.flags;
            *toggles.entry(pulse.end()).or_insert(0) ^= channel.flags;
        }
    }
    let mut state = 0u32;
    let entries = toggles
        .into_iter()
        .map(|(time, toggle)| {
            state ^= toggle;
            TimelineEntry { time, state }
        })
        .collect();
    Timeline { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Pulse;

    fn entry(time: Ticks, state: u32) -> TimelineEntry {
        TimelineEntry { time, state }
    }

    #[test]
    fn test_no_channels() {
        let timeline = catalog_events(&[]);
        assert_eq!(timeline.entries(), [entry(0, 0)]);
        assert_eq!(timeline.last_time(), 0);
    }

    #[test]
    fn test_single_pulse() {
        let channels = [Channel::from_flags(0b01, vec![Pulse::new(0, 50)])];
        let timeline = catalog_events(&channels);
        assert_eq!(timeline.entries(), [entry(0, 0b01), entry(50, 0)]);
    }

    #[test]
    fn test_pulse_away_from_zero_keeps_implicit_start() {
        let channels = [Channel::from_flags(0b01, vec![Pulse::new(10, 5)])];
        let timeline = catalog_events(&channels);
        assert_eq!(
            timeline.entries(),
            [entry(0, 0), entry(10, 0b01), entry(15, 0)]
        );
    }

    #[test]
    fn test_overlapping_channels() {
        let channels = [
            Channel::from_flags(0b01, vec![Pulse::new(0, 10)]),
            Channel::from_flags(0b10, vec![Pulse::new(5, 10)]),
        ];
        let timeline = catalog_events(&channels);
        assert_eq!(
            timeline.entries(),
            [
                entry(0, 0b01),
                entry(5, 0b11),
                entry(10, 0b10),
                entry(15, 0b00),
            ]
        );
    }

    #[test]
    fn test_coincident_starts_merge() {
        let channels = [
            Channel::from_flags(0b01, vec![Pulse::new(0, 10)]),
            Channel::from_flags(0b10, vec![Pulse::new(0, 20)]),
        ];
        let timeline = catalog_events(&channels);
        assert_eq!(
            timeline.entries(),
            [entry(0, 0b11), entry(10, 0b10), entry(20, 0b00)]
        );
    }

    #[test]
    fn test_zero_length_pulse_cancels() {
        let channels = [Channel::from_flags(0b01, vec![Pulse::new(25, 0)])];
        let timeline = catalog_events(&channels);
        // The instant is cataloged but the flag never appears in any state.
        assert_eq!(timeline.entries(), [entry(0, 0), entry(25, 0)]);
    }

    #[test]
    fn test_zero_length_pulse_among_others() {
        let channels = [
            Channel::from_flags(0b01, vec![Pulse::new(0, 50)]),
            Channel::from_flags(0b10, vec![Pulse::new(25, 0)]),
        ];
        let timeline = catalog_events(&channels);
        assert_eq!(
            timeline.entries(),
            [entry(0, 0b01), entry(25, 0b01), entry(50, 0)]
        );
    }

    #[test]
    fn test_abutting_pulses_share_one_event() {
        let channels = [Channel::from_flags(0b01, vec![Pulse::new(0, 10), Pulse::new(10, 10)])];
        let timeline = catalog_events(&channels);
        // Falling and rising edge at t = 10 cancel; the output stays high.
        assert_eq!(timeline.entries(), [entry(0, 0b01), entry(10, 0b01), entry(20, 0)]);
    }
}
