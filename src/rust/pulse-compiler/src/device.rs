// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Boundary to the physical sequencer.
//!
//! The compiler never talks to hardware itself; it hands a finished
//! [`PulseProgram`] to an implementation of [`PulseSequencer`]. Real
//! implementations wrap the vendor SDK and live with the application.

use crate::program::PulseProgram;

/// Errors surfaced by a sequencer driver. Deliberately outside the compiler
/// error type: a device fault is an operational problem, not a compilation
/// problem.
#[derive(thiserror::Error, Debug)]
pub enum DeviceError {
    #[error("no connection to the sequencer")]
    NotConnected,
    /// Vendor drivers report negative status codes with a message text.
    #[error("sequencer fault {code}: {message}")]
    Fault { code: i32, message: String },
}

/// Operations a compiled program needs from the device layer.
pub trait PulseSequencer {
    /// Streams the instruction list to the board, replacing any loaded
    /// program. Durations are handed over in nanoseconds, opcodes as their
    /// numeric device codes.
    fn upload(&mut self, program: &PulseProgram) -> Result<(), DeviceError>;

    /// Starts looping playback from instruction 0.
    fn start(&mut self) -> Result<(), DeviceError>;

    /// Halts playback and leaves all outputs low.
    fn stop(&mut self) -> Result<(), DeviceError>;
}
