// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Instruction stream emitted for the sequencer's loop engine.

use timing_units::{Ticks, ticks_to_ns};

use crate::device_traits::FLAG_WORD_BITS;
use crate::timeline::Timeline;
use crate::{Error, Result};

/// Sequencer control opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Hold the flag state for the duration, then fall through.
    Continue,
    /// Hold the flag state for the duration, then jump to `branch_target`.
    Branch,
}

impl Opcode {
    /// Numeric code from the controller instruction set.
    pub const fn device_code(&self) -> u32 {
        match self {
            Opcode::Continue => 0,
            Opcode::Branch => 6,
        }
    }
}

/// One hardware step: drive `flags` for `duration` ticks, then continue or
/// branch. `branch_target` is meaningful for [`Opcode::Branch`] only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub flags: u32,
    pub opcode: Opcode,
    pub branch_target: usize,
    pub duration: Ticks,
}

/// A compiled pulse program.
///
/// The instruction list is always a closed loop: the final instruction is a
/// `Branch` back to index 0, so the board replays the program until the
/// driver halts it. There is no run-once mode.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseProgram {
    instructions: Vec<Instruction>,
    tick_period_ns: f64,
    flag_bits: u8,
}

impl PulseProgram {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Tick period the program was compiled against, in nanoseconds.
    pub fn tick_period_ns(&self) -> f64 {
        self.tick_period_ns
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Total loop duration in ticks: the sum of all instruction durations.
    pub fn total_duration(&self) -> Ticks {
        self.instructions.iter().map(|inst| inst.duration).sum()
    }

    pub fn total_duration_ns(&self) -> f64 {
        ticks_to_ns(self.total_duration(), self.tick_period_ns)
    }

    /// OR of every instruction's flag word, masked to the board's physical
    /// output lines: which lines the program drives at least once. The
    /// reserved fractional-period bits are a control field, not outputs, and
    /// never appear here.
    pub fn flags_used(&self) -> u32 {
        let mask = (1u32 << self.flag_bits) - 1;
        self.instructions.iter().fold(0, |acc, inst| acc | inst.flags) & mask
    }
}

/// Turns a timeline into the closed-loop instruction list.
///
/// Consecutive timeline entries become `Continue` instructions holding the
/// earlier entry's state. The gap between the last event and
/// `target_duration` becomes the final wrap-around instruction, and the last
/// instruction (whichever that is) is rewritten to `Branch` back to index 0.
///
/// A timeline whose only entry is t = 0 compiles to a single idle `Branch`
/// spanning `target_duration`, or to an empty program when the target is
/// zero.
///
/// `flag_bits` is the board's physical output-line count;
/// [`PulseProgram::flags_used`] masks to it.
pub fn emit_instructions(
    timeline: &Timeline,
    target_duration: Ticks,
    tick_period_ns: f64,
    flag_bits: u8,
) -> Result<PulseProgram> {
    let entries = timeline.entries();
    let mut instructions = Vec::with_capacity(entries.len());
    for (index, pair) in entries.windows(2).enumerate() {
        let duration = pair[1].time - pair[0].time;
        if duration <= 0 {
            return Err(Error::DegenerateInstruction {
                index,
                time: pair[0].time,
            });
        }
        instructions.push(Instruction {
            flags: pair[0].state,
            opcode: Opcode::Continue,
            branch_target: 0,
            duration,
        });
    }

    let (last_time, last_state) = entries.last().map_or((0, 0), |entry| (entry.time, entry.state));
    let wrap_gap = target_duration - last_time;
    if wrap_gap < 0 {
        return Err(anyhow::anyhow!(
            "program duration {target_duration} ticks ends before the last event at {last_time} ticks"
        )
        .into());
    }
    if wrap_gap > 0 {
        instructions.push(Instruction {
            flags: last_state,
            opcode: Opcode::Continue,
            branch_target: 0,
            duration: wrap_gap,
        });
    }

    if let Some(last) = instructions.last_mut() {
        last.opcode = Opcode::Branch;
        last.branch_target = 0;
    }
    Ok(PulseProgram {
        instructions,
        tick_period_ns,
        flag_bits: flag_bits.min(FLAG_WORD_BITS),
    })
}
