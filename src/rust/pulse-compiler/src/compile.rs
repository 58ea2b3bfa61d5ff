// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Top-level compilation pipeline.

use log::{debug, warn};

use timing_units::ns_to_ticks;

use crate::Result;
use crate::channel::{Channel, ChannelTable};
use crate::device_traits::BoardTraits;
use crate::program::{PulseProgram, emit_instructions};
use crate::settings::CompilerSettings;
use crate::short_pulse::encode_short_pulses;
use crate::sync_out;
use crate::timeline::catalog_events;

/// Compiles a set of channels into a closed-loop pulse program.
///
/// Pipeline: sub-reliable pulses are re-encoded onto the fractional-period
/// bits, the optional sync-out channel is appended, every edge is cataloged
/// into one timeline, and the timeline is emitted as instructions with the
/// final instruction branching back to index 0.
///
/// # Arguments
///
/// * `channels` - The pulse trains to play.
/// * `table` - Channel table; only consulted for the sync-out line, and only
///   when a sync-out frequency is configured.
/// * `settings` - Clock, padding and sync-out configuration.
/// * `traits` - Traits of the target board.
///
/// # Returns
///
/// The compiled program, or the first error encountered. Compilation is a
/// pure function of its inputs; nothing is retried or cached.
pub fn compile_program(
    mut channels: Vec<Channel>,
    table: &ChannelTable,
    settings: &CompilerSettings,
    traits: &BoardTraits,
) -> Result<PulseProgram> {
    let tick_ns = settings.checked_tick_period_ns()?;
    let padding = ns_to_ticks(settings.all_off_padding_ns, tick_ns)?;

    encode_short_pulses(&mut channels, traits);

    let last_edge = channels.iter().map(Channel::last_edge).max().unwrap_or(0);
    let base_duration = last_edge + padding;
    let target_duration = match settings.sync_out_mhz {
        Some(sync_mhz) => {
            let sync_flags = table.flags(sync_out::SYNC_OUT_CHANNEL)?;
            let (sync_channel, target) =
                sync_out::augment(sync_mhz, sync_flags, base_duration, tick_ns)?;
            channels.push(sync_channel);
            target
        }
        None => base_duration,
    };

    let timeline = catalog_events(&channels);
    let program = emit_instructions(&timeline, target_duration, tick_ns, traits.flag_bits)?;

    let unreliable = program
        .instructions()
        .iter()
        .filter(|inst| inst.duration < traits.min_reliable_ticks)
        .count();
    if unreliable > 0 {
        warn!(
            "{unreliable} instruction(s) are shorter than the reliable minimum of {} ticks; the board may not assert them",
            traits.min_reliable_ticks
        );
    }
    debug!(
        "compiled {} instruction(s) spanning {} ns",
        program.len(),
        program.total_duration_ns()
    );
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_traits::BoardKind;
    use crate::program::Opcode;
    use crate::{Error, Pulse};

    fn esr_setup() -> (ChannelTable, CompilerSettings, &'static BoardTraits) {
        let traits = BoardKind::EsrPro500.traits();
        let mut table = ChannelTable::new(traits.flag_bits);
        table.assign("uW", 0).unwrap();
        table.assign("AOM", 1).unwrap();
        table.assign(sync_out::SYNC_OUT_CHANNEL, 2).unwrap();
        (table, CompilerSettings::for_board(traits), traits)
    }

    #[test]
    fn test_compile_from_named_channels() {
        let (table, mut settings, traits) = esr_setup();
        settings.all_off_padding_ns = 20.0;
        let channels = vec![
            Channel::from_name("uW", &table, &[0.0], &[100.0], 2.0).unwrap(),
            Channel::from_name("AOM", &table, &[100.0], &[100.0], 2.0).unwrap(),
        ];
        let program = compile_program(channels, &table, &settings, traits).unwrap();
        let flags: Vec<u32> = program.instructions().iter().map(|inst| inst.flags).collect();
        assert_eq!(flags, [0b01, 0b10, 0b00]);
        assert_eq!(program.total_duration_ns(), 220.0);
        assert_eq!(
            program.instructions().last().unwrap().opcode,
            Opcode::Branch
        );
    }

    #[test]
    fn test_empty_input_compiles_to_empty_program() {
        let (table, settings, traits) = esr_setup();
        let program = compile_program(vec![], &table, &settings, traits).unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn test_padding_alone_compiles_to_idle_loop() {
        let (table, mut settings, traits) = esr_setup();
        settings.all_off_padding_ns = 80.0;
        let program = compile_program(vec![], &table, &settings, traits).unwrap();
        assert_eq!(program.len(), 1);
        let idle = program.instructions()[0];
        assert_eq!(idle.flags, 0);
        assert_eq!(idle.opcode, Opcode::Branch);
        assert_eq!(idle.duration, 40);
    }

    #[test]
    fn test_sync_out_requires_table_entry() {
        let traits = BoardKind::EsrPro500.traits();
        let table = ChannelTable::new(traits.flag_bits);
        let settings = CompilerSettings {
            sync_out_mhz: Some(1.0),
            ..CompilerSettings::for_board(traits)
        };
        let channels = vec![Channel::from_flags(0b1, vec![Pulse::new(0, 100)])];
        let err = compile_program(channels, &table, &settings, traits).unwrap_err();
        assert!(matches!(err, Error::UnknownChannelName { .. }));
    }

    #[test]
    fn test_sync_at_clock_rate_is_rejected() {
        // A 500 MHz sync on the 500 MHz board would be all falling edges;
        // the compiler refuses rather than emit a line that never rises.
        let (table, mut settings, traits) = esr_setup();
        settings.sync_out_mhz = Some(500.0);
        let channels = vec![Channel::from_name("uW", &table, &[0.0], &[100.0], 2.0).unwrap()];
        let err = compile_program(channels, &table, &settings, traits).unwrap_err();
        assert!(err.to_string().contains("1-tick period"));
    }
}
