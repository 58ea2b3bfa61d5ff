// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Per-channel step traces for pulse-diagram display.
//!
//! Rendering itself lives with the application; this module only turns a
//! compiled program back into drawable (time, level) step lines, one per
//! named channel the program drives.

use indexmap::IndexMap;

use timing_units::{Ticks, ticks_to_ns};

use crate::channel::ChannelTable;
use crate::device_traits::{BoardTraits, FLAG_WORD_BITS};
use crate::program::PulseProgram;

/// A step trace: paired times (ns) and logic levels for one channel. Each
/// level transition contributes two points at the same time, so the pairs
/// plot directly as a square wave.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trace {
    pub times_ns: Vec<f64>,
    pub levels: Vec<u8>,
}

/// Extracts drawable step traces from a compiled program.
///
/// Channels the program never drives are omitted; the map iterates in
/// channel-table order. An instruction with fractional-period multiplier
/// bits set draws its flagged channels high for the multiplier's tick count
/// and low for the rest of the instruction, which is the output the board
/// actually produces for an encoded short pulse.
pub fn trace_program(
    program: &PulseProgram,
    table: &ChannelTable,
    traits: &BoardTraits,
) -> IndexMap<String, Trace> {
    let used = program.flags_used();
    let tick_ns = program.tick_period_ns();
    let mut traces = IndexMap::new();
    for (name, bit) in table.iter() {
        if used & (1u32 << bit) == 0 {
            continue;
        }
        let mut trace = Trace {
            times_ns: vec![0.0],
            levels: vec![0],
        };
        let mut level = 0u8;
        let mut time: Ticks = 0;
        for inst in program.instructions() {
            let driven = (inst.flags >> bit) & 1 == 1;
            match fractional_multiplier(inst.flags, traits) {
                Some(multiplier) if driven && multiplier < inst.duration => {
                    push_step(&mut trace, ticks_to_ns(time, tick_ns), &mut level, 1);
                    time += multiplier;
                    push_step(&mut trace, ticks_to_ns(time, tick_ns), &mut level, 0);
                    time += inst.duration - multiplier;
                }
                _ => {
                    push_step(
                        &mut trace,
                        ticks_to_ns(time, tick_ns),
                        &mut level,
                        driven.into(),
                    );
                    time += inst.duration;
                }
            }
        }
        trace.times_ns.push(ticks_to_ns(time, tick_ns));
        trace.levels.push(level);
        traces.insert(name.to_string(), trace);
    }
    traces
}

fn fractional_multiplier(flags: u32, traits: &BoardTraits) -> Option<Ticks> {
    let bit = traits.short_pulse_bit?;
    let multiplier = (flags >> bit) & ((1u32 << (FLAG_WORD_BITS - bit)) - 1);
    (multiplier > 0).then_some(Ticks::from(multiplier))
}

fn push_step(trace: &mut Trace, time_ns: f64, level: &mut u8, next: u8) {
    if *level != next {
        trace.times_ns.push(time_ns);
        trace.levels.push(*level);
        trace.times_ns.push(time_ns);
        trace.levels.push(next);
        *level = next;
    }
}
