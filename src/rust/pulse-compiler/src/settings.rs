// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Module for defining settings for the pulse compiler.
use std::vec;

use timing_units::{quantize, tick_period_ns};

use crate::Result;
use crate::device_traits::{BoardTraits, ESR_PRO_500_TRAITS};

#[derive(Debug, Clone)]
pub struct SanitizationChange {
    pub field: &'static str,
    pub original: String,
    pub sanitized: String,
    pub reason: String,
}

/// Caller-facing compiler configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerSettings {
    /// Controller clock in MHz; the tick period is `1000 / clock_mhz` ns.
    pub clock_mhz: f64,
    /// Trailing all-low time in ns, inserted between the last falling edge
    /// and the loop wrap so consecutive loop iterations stay separated.
    pub all_off_padding_ns: f64,
    /// Sync-out trigger frequency in MHz. `None` disables the sync channel.
    pub sync_out_mhz: Option<f64>,
}

impl CompilerSettings {
    pub fn for_board(traits: &BoardTraits) -> Self {
        CompilerSettings {
            clock_mhz: traits.clock_mhz,
            all_off_padding_ns: 0.0,
            sync_out_mhz: None,
        }
    }

    /// Tick period in nanoseconds. Only meaningful for a positive clock;
    /// [`CompilerSettings::sanitize`] rejects anything else.
    pub fn tick_period_ns(&self) -> f64 {
        tick_period_ns(self.clock_mhz)
    }

    pub(crate) fn checked_tick_period_ns(&self) -> Result<f64> {
        if !self.clock_mhz.is_finite() || self.clock_mhz <= 0.0 {
            return Err(anyhow::anyhow!(
                "clock frequency must be positive, got {} MHz",
                self.clock_mhz
            )
            .into());
        }
        Ok(self.tick_period_ns())
    }

    /// Clamps and grid-aligns fields that can be repaired, returning the
    /// list of adjustments made so callers can report them. Fails for a
    /// non-positive clock frequency, which has no sensible repair.
    pub fn sanitize(&mut self) -> Result<Vec<SanitizationChange>> {
        let tick_ns = self.checked_tick_period_ns()?;
        let mut changes = vec![];
        if self.all_off_padding_ns < 0.0 {
            changes.push(SanitizationChange {
                field: "all_off_padding_ns",
                original: self.all_off_padding_ns.to_string(),
                sanitized: "0".to_string(),
                reason: "Padding must be non-negative.".to_string(),
            });
            self.all_off_padding_ns = 0.0;
        }
        let quantized = quantize(self.all_off_padding_ns, tick_ns)?;
        if quantized != self.all_off_padding_ns {
            changes.push(SanitizationChange {
                field: "all_off_padding_ns",
                original: self.all_off_padding_ns.to_string(),
                sanitized: quantized.to_string(),
                reason: format!("Not a multiple of the {tick_ns} ns tick."),
            });
            self.all_off_padding_ns = quantized;
        }
        Ok(changes)
    }
}

impl Default for CompilerSettings {
    fn default() -> Self {
        CompilerSettings::for_board(&ESR_PRO_500_TRAITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_defaults() {
        let settings = CompilerSettings::default();
        assert_eq!(settings.clock_mhz, 500.0);
        assert_eq!(settings.tick_period_ns(), 2.0);
        assert_eq!(settings.all_off_padding_ns, 0.0);
        assert_eq!(settings.sync_out_mhz, None);
    }

    #[test]
    fn test_sanitize_accepts_clean_settings() {
        let mut settings = CompilerSettings {
            all_off_padding_ns: 100.0,
            ..CompilerSettings::default()
        };
        assert!(settings.sanitize().unwrap().is_empty());
        assert_eq!(settings.all_off_padding_ns, 100.0);
    }

    #[test]
    fn test_sanitize_clamps_negative_padding() {
        let mut settings = CompilerSettings {
            all_off_padding_ns: -50.0,
            ..CompilerSettings::default()
        };
        let changes = settings.sanitize().unwrap();
        assert_eq!(settings.all_off_padding_ns, 0.0);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "all_off_padding_ns");
        assert_eq!(changes[0].original, "-50");
        assert_eq!(changes[0].sanitized, "0");
    }

    #[test]
    fn test_sanitize_snaps_padding_to_tick_grid() {
        let mut settings = CompilerSettings {
            all_off_padding_ns: 101.0,
            ..CompilerSettings::default()
        };
        let changes = settings.sanitize().unwrap();
        assert_eq!(settings.all_off_padding_ns, 102.0);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].original, "101");
        assert_eq!(changes[0].sanitized, "102");
    }

    #[test]
    fn test_sanitize_rejects_bad_clock() {
        for clock_mhz in [0.0, -500.0, f64::NAN, f64::INFINITY] {
            let mut settings = CompilerSettings {
                clock_mhz,
                ..CompilerSettings::default()
            };
            assert!(settings.sanitize().is_err());
        }
    }
}
