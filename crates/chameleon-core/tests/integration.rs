//! End-to-end tests for the chameleon-core effect chain.
//!
//! Exercises the chain as both execution modes use it: whole buffers through
//! `EffectChain::run`, shared coefficients across chains, and sine-level
//! checks that each stage does what its settings say.

use std::sync::Arc;

use chameleon_core::{
    AudioBuffer, EffectChain, EffectSettings, EngineConfig, FilterBank, PEAK_CEILING, detect_pitch,
    peak,
};

const SAMPLE_RATE: u32 = 44100;
const TAU: f32 = std::f32::consts::TAU;

fn generate_sine(freq_hz: f32, amplitude: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| (TAU * freq_hz * n as f32 / SAMPLE_RATE as f32).sin() * amplitude)
        .collect()
}

fn chain() -> EffectChain {
    EffectChain::new(EngineConfig::default()).unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn silent_second_with_defaults_stays_silent() {
    let input = vec![0.0_f32; 44100];
    let out = chain().run(&input, &EffectSettings::default()).unwrap();
    assert_eq!(out.len(), 44100);
    assert!(out.iter().all(|&s| s == 0.0), "expected all-zero output");
}

#[test]
fn hot_signal_clamped_to_ceiling() {
    let input = generate_sine(440.0, 1.5, 8192);
    assert!((peak(&input) - 1.5).abs() < 1e-3);

    let settings = EffectSettings {
        volume: 1.0,
        ..EffectSettings::bypass()
    };
    let out = chain().run(&input, &settings).unwrap();
    assert_eq!(peak(&out), PEAK_CEILING);
}

// ============================================================================
// Chain reduces to the normalizer when every effect is off
// ============================================================================

#[test]
fn bypassed_chain_preserves_quiet_peak() {
    let input = generate_sine(300.0, 0.6, 4096);
    let settings = EffectSettings {
        volume: 1.0,
        ..EffectSettings::bypass()
    };
    let out = chain().run(&input, &settings).unwrap();
    assert_eq!(out, input, "quiet input should pass through untouched");
}

#[test]
fn volume_scales_before_clamp() {
    let input = generate_sine(300.0, 0.5, 4096);
    let settings = EffectSettings {
        volume: 0.5,
        ..EffectSettings::bypass()
    };
    let out = chain().run(&input, &settings).unwrap();
    assert!((peak(&out) - 0.25).abs() < 1e-3);
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn filter_design_is_deterministic() {
    for sr in [8000, 22050, 44100, 48000, 96000] {
        let a = FilterBank::build(sr).unwrap();
        let b = FilterBank::build(sr).unwrap();
        assert_eq!(a, b, "coefficients differ at {sr} Hz");
        for (x, y) in a.low_cut.taps().iter().zip(b.low_cut.taps()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }
}

#[test]
fn shared_coefficients_give_identical_output() {
    let coeffs = Arc::new(FilterBank::build(SAMPLE_RATE).unwrap());
    let a = EffectChain::with_coefficients(EngineConfig::default(), Arc::clone(&coeffs)).unwrap();
    let b = EffectChain::with_coefficients(EngineConfig::new(SAMPLE_RATE, 512), coeffs).unwrap();
    assert!(Arc::ptr_eq(a.coefficients(), b.coefficients()));

    let input = generate_sine(1000.0, 0.5, 2048);
    let settings = EffectSettings::default();
    assert_eq!(a.run(&input, &settings).unwrap(), b.run(&input, &settings).unwrap());
}

#[test]
fn low_cut_removes_rumble() {
    let rumble = generate_sine(40.0, 0.8, 16384);
    let settings = EffectSettings {
        volume: 1.0,
        low_cut_enabled: true,
        ..EffectSettings::bypass()
    };
    let out = chain().run(&rumble, &settings).unwrap();
    let tail = &out[4096..];
    assert!(peak(tail) < 0.5 * 0.8, "40 Hz should be attenuated, peak {}", peak(tail));
}

// ============================================================================
// Pitch
// ============================================================================

#[test]
fn pitch_shift_moves_detected_pitch() {
    let input = generate_sine(300.0, 0.5, 44100);
    let settings = EffectSettings {
        pitch_semitones: 7.0,
        volume: 1.0,
        ..EffectSettings::bypass()
    };
    let out = chain().run(&input, &settings).unwrap();
    assert_eq!(out.len(), input.len());

    let expected = 300.0 * 2.0_f32.powf(7.0 / 12.0);
    let detected = detect_pitch(&out, SAMPLE_RATE).unwrap();
    assert!(
        (detected - expected).abs() < expected * 0.03,
        "expected ~{expected:.1} Hz, got {detected:.1} Hz"
    );
}

// ============================================================================
// Whole chain
// ============================================================================

#[test]
fn full_chain_on_voice_band_signal() {
    let mut input = generate_sine(220.0, 0.7, 22050);
    for (i, s) in generate_sine(1200.0, 0.3, 22050).into_iter().enumerate() {
        input[i] += s;
    }
    let settings = EffectSettings {
        pitch_semitones: -3.0,
        echo_amount: 0.6,
        reverb_amount: 0.4,
        volume: 1.5,
        ..EffectSettings::default()
    };
    let out = chain().run(&input, &settings).unwrap();
    assert_eq!(out.len(), input.len());
    assert!(out.iter().all(|s| s.is_finite()));
    assert!(peak(&out) <= PEAK_CEILING);
    assert!(peak(&out) > 0.1, "signal should survive the chain");
}

#[test]
fn process_buffer_keeps_rate_and_length() {
    let buf = AudioBuffer::new(generate_sine(500.0, 0.5, 3000), SAMPLE_RATE);
    let out = chain().process_buffer(&buf, &EffectSettings::default()).unwrap();
    assert_eq!(out.sample_rate, SAMPLE_RATE);
    assert_eq!(out.len(), 3000);
}
