//! Property-based tests for the gain and depop commands.

use audren_commands::{DepopForMixBuffersCommand, MixRampCommand, VolumeCommand};
use audren_core::{CapturingDevice, Command, CommandList, GuestMemory, StateStore, VoiceUpdateState};
use proptest::prelude::*;

fn pcm_block(len: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec((-32_768i32..=32_767).prop_map(|x| x as f32), len)
}

/// Run `command` over a two-buffer arena whose buffer 0 holds `input`.
fn run(input: &[f32], states: &mut StateStore, command: impl Command + 'static) -> Vec<f32> {
    let mut list = CommandList::new(2, input.len(), 48_000);
    list.arena_mut().get(0).copy_from_slice(input);
    list.push(command);
    let mut memory = GuestMemory::new(0, 0);
    let mut device = CapturingDevice::new(48_000, 2);
    list.process(states, &mut memory, &mut device);
    list.arena().get_const(1).to_vec()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A ramp whose endpoints are equal produces the same samples as a
    /// constant volume.
    #[test]
    fn flat_ramp_matches_volume(
        input in (1usize..256).prop_flat_map(pcm_block),
        volume in -2.0f32..2.0f32,
    ) {
        let mut states = StateStore::new(2);
        let voice = states.insert(VoiceUpdateState::default());
        let ramped = run(&input, &mut states, MixRampCommand::new(0, 0, 1, volume, volume, 0, voice).unwrap());
        let constant = run(&input, &mut StateStore::new(2), VolumeCommand::new(0, 0, 1, volume));
        prop_assert_eq!(ramped, constant);
    }

    /// A ramp that is silent at both ends contributes nothing.
    #[test]
    fn silent_ramp_contributes_nothing(input in (1usize..256).prop_flat_map(pcm_block)) {
        let mut states = StateStore::new(2);
        let voice = states.insert(VoiceUpdateState::default());
        let output = run(&input, &mut states, MixRampCommand::new(0, 0, 1, 0.0, 0.0, 3, voice).unwrap());
        prop_assert!(output.iter().all(|&x| x == 0.0));
        prop_assert_eq!(states.voices[voice].last_samples[3], 0.0);
    }

    /// The depop tail keeps the sign of the accumulator, shrinks
    /// monotonically and never overshoots zero.
    #[test]
    fn depop_tail_keeps_sign(
        value in -32_768i32..=32_767,
        len in 1usize..480,
        rate in prop::sample::select(vec![32_000u32, 48_000]),
    ) {
        let value = value as f32;
        let mut states = StateStore::new(2);
        states.depop[1] = value;
        let tail = run(&vec![0.0; len], &mut states, DepopForMixBuffersCommand::new(0, 1, 1, rate));

        let mut previous = value.abs();
        for &sample in &tail {
            prop_assert!(sample == 0.0 || sample.signum() == value.signum());
            prop_assert!(sample.abs() <= previous);
            previous = sample.abs();
        }
        prop_assert!(states.depop[1].abs() <= value.abs());
    }
}
