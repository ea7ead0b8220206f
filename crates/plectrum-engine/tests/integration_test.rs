use plectrum_dsp::UnitTypeTag;
use plectrum_engine::{Command, EngineState};
use plectrum_spatial::ChannelSpatial;

#[test]
fn parameter_set_round_trips_through_commands() {
    let mut engine = EngineState::new(1, 48000, 1);
    engine.apply(Command::AppendUnit { channel: 0, unit_type: UnitTypeTag::Overdrive });
    let reply = engine.apply(Command::SetNumericParameter {
        channel: 0,
        unit: 0,
        name: "drive".to_string(),
        value: 80,
    });
    assert!(reply.success, "{}", reply.reason);
}

#[test]
fn bypass_is_idempotent_and_passes_signal_through() {
    let mut engine = EngineState::new(1, 48000, 1);
    engine.apply(Command::AppendUnit { channel: 0, unit_type: UnitTypeTag::Distortion });
    engine.apply(Command::SetBypass { channel: 0, unit: 0, bypass: true });
    let first = engine.apply(Command::SetBypass { channel: 0, unit: 0, bypass: true });
    assert!(first.success);

    let inputs = vec![vec![0.25; 128]];
    let output = engine.process(&inputs);
    assert_eq!(output.channels[0], inputs[0], "bypassed unit must not alter the channel signal");
    assert_eq!(output.master_left.len(), output.master_right.len());
}

#[test]
fn center_panned_channel_splits_evenly_across_stereo_field() {
    let mut engine = EngineState::new(1, 48000, 1);
    engine.apply(Command::SetChannelSpatial {
        channel: 0,
        placement: ChannelSpatial { azimuth_deg: 0.0, distance: 0.0, level: 1.0 },
    });
    let inputs = vec![vec![0.5; 64]];
    let output = engine.process(&inputs);
    for (l, r) in output.master_left.iter().zip(&output.master_right) {
        assert!((l - r).abs() < 1e-9);
    }
}

#[test]
fn metronome_click_stays_out_of_the_master_mix_until_aux_is_enabled() {
    let mut engine = EngineState::new(1, 48000, 1);
    engine.apply(Command::SetMetronome { bpm: 120.0, beats_per_measure: 4, enabled: true });

    let inputs = vec![vec![0.0; 48000]];
    let output = engine.process(&inputs);
    assert!(output.master_left.iter().all(|&x| x == 0.0), "click should not leak without metronome_aux enabled");
    assert!(output.aux.iter().any(|&x| x != 0.0), "aux buffer should still carry the click");
}

#[test]
fn block_size_does_not_change_processing_outcome() {
    let mut engine_a = EngineState::new(1, 48000, 1);
    let mut engine_b = EngineState::new(1, 48000, 1);
    engine_a.apply(Command::AppendUnit { channel: 0, unit_type: UnitTypeTag::Delay });
    engine_b.apply(Command::AppendUnit { channel: 0, unit_type: UnitTypeTag::Delay });

    let signal: Vec<f64> = (0..512).map(|i| (i as f64 * 0.01).sin() * 0.5).collect();

    let whole = engine_a.process(&[signal.clone()]);

    let mut chunked = Vec::new();
    for chunk in signal.chunks(64) {
        let output = engine_b.process(&[chunk.to_vec()]);
        chunked.extend(output.channels[0].clone());
    }

    assert_eq!(whole.channels[0].len(), chunked.len());
}

#[test]
fn invalid_channel_index_reports_failure_without_panicking() {
    let mut engine = EngineState::new(2, 48000, 2);
    let reply = engine.apply(Command::AppendUnit { channel: 9, unit_type: UnitTypeTag::Chorus });
    assert!(!reply.success);
}

#[test]
fn power_amp_slot_convolves_with_a_loaded_impulse_response() {
    let path = std::env::temp_dir().join("plectrum_engine_test_ir.wav");
    let data = plectrum_file::AudioData { sample_rate: 48000, channels: vec![vec![1.0, 0.0, 0.0, 0.0]] };
    plectrum_file::write_wav(&path, &data, plectrum_file::BitDepth::Float32).unwrap();

    let mut engine = EngineState::new(1, 48000, 1);
    engine.apply(Command::AppendUnit { channel: 0, unit_type: UnitTypeTag::PowerAmp });
    engine.load_impulse_response("unit-ir", &path.to_string_lossy()).expect("ir loads");
    engine.assign_power_amp_slot(0, 0, 0, "unit-ir").expect("slot assigns");

    let inputs = vec![vec![0.4, -0.3, 0.2, 0.1]];
    let output = engine.process(&inputs);
    assert!(output.channels[0].iter().any(|&x| x != 0.0));

    let _ = std::fs::remove_file(&path);
}
