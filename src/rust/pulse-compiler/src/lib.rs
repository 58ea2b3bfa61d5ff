// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Compiler for looping digital pulse programs.
//!
//! Takes a set of named output channels, each a flag bitmask with a list of
//! (start, duration) pulses, and produces the gap-free instruction stream a
//! programmable timing controller executes in an infinite loop. Every
//! compiled program is a closed loop: the final instruction branches back to
//! index 0, and playback only stops when the driver halts the board.

pub mod channel;
pub mod compile;
pub mod device;
pub mod device_traits;
pub mod diagram;
pub mod program;
pub mod settings;
pub(crate) mod short_pulse;
pub(crate) mod sync_out;
pub mod timeline;

pub use channel::{Channel, ChannelTable, Pulse};
pub use compile::compile_program;
pub use device::{DeviceError, PulseSequencer};
pub use device_traits::{BoardKind, BoardTraits};
pub use program::{Instruction, Opcode, PulseProgram};
pub use settings::{CompilerSettings, SanitizationChange};
pub use sync_out::SYNC_OUT_CHANNEL;
pub use timeline::{Timeline, TimelineEntry};
pub use timing_units::Ticks;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unknown channel name `{name}`")]
    UnknownChannelName { name: String },
    #[error("channel `{name}` has {starts} start times but {durations} durations")]
    MismatchedLengths {
        name: String,
        starts: usize,
        durations: usize,
    },
    #[error("zero-duration instruction at index {index} (t = {time} ticks)")]
    DegenerateInstruction { index: usize, time: Ticks },
    #[error("sync-out frequency must be positive, got {mhz} MHz")]
    InvalidSyncFrequency { mhz: f64 },
    #[error(transparent)]
    Timing(#[from] timing_units::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn new(msg: &str) -> Self {
        Error::Anyhow(anyhow::anyhow!(msg.to_string()))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
