// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Tick arithmetic for the pulse sequencer.
//!
//! The sequencer resolves time in ticks of its instruction clock
//! (`1000 / clock_MHz` nanoseconds per tick). Caller-supplied nanosecond
//! values are quantized onto the tick grid once, at the boundary; every
//! later stage works on whole [`Ticks`] so that equal times compare equal.

use thiserror::Error;

/// Time expressed as a whole number of sequencer clock ticks.
pub type Ticks = i64;

#[derive(Error, Copy, Clone, PartialEq, Debug)]
pub enum Error {
    #[error("time values must be non-negative, got {value_ns} ns")]
    InvalidTiming { value_ns: f64 },
}
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Duration of one tick in nanoseconds for a clock frequency in MHz.
pub fn tick_period_ns(clock_mhz: f64) -> f64 {
    1e3 / clock_mhz
}

/// Rounds a nanosecond value to the nearest multiple of the tick period.
///
/// # Arguments
///
/// * `value_ns` - Time value in nanoseconds. Must be non-negative.
/// * `tick_ns` - Tick period in nanoseconds.
///
/// # Returns
///
/// The quantized value, or [`Error::InvalidTiming`] for negative input.
pub fn quantize(value_ns: f64, tick_ns: f64) -> Result<f64> {
    if value_ns < 0.0 {
        return Err(Error::InvalidTiming { value_ns });
    }
    Ok(tick_ns * (value_ns / tick_ns).round())
}

/// Converts a nanosecond value to the nearest whole tick count.
pub fn ns_to_ticks(value_ns: f64, tick_ns: f64) -> Result<Ticks> {
    if value_ns < 0.0 {
        return Err(Error::InvalidTiming { value_ns });
    }
    Ok((value_ns / tick_ns).round() as Ticks)
}

/// Converts a tick count back to nanoseconds.
pub fn ticks_to_ns(ticks: Ticks, tick_ns: f64) -> f64 {
    ticks as f64 * tick_ns
}

pub fn floor_to_grid(value: Ticks, grid: Ticks) -> Ticks {
    value - value % grid
}

pub fn ceil_to_grid(value: Ticks, grid: Ticks) -> Ticks {
    value + (grid - (value % grid)) % grid
}
