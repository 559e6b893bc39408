use motion::{ControlCurve, MotionPipeline, PipelineState};
use shared::protocol::{decode_frame, encode_frame};

fn default_curve() -> ControlCurve {
    ControlCurve {
        sensitivity: 1.0,
        smoothing_factor: 0.1,
        normalisation_factor: 100.0,
        max_volume: 220,
        min_tempo: 0.6,
    }
}

#[test]
fn small_pitch_step_from_rest() {
    let pipeline = MotionPipeline::new(0.5, default_curve());
    let mut state = PipelineState::default();

    let first = pipeline.step(&mut state, decode_frame(&encode_frame(0, 0, 0)).expect("frame"));
    assert_eq!(first.energy.value(), 0.0);
    assert_eq!(first.control.smoothed.value(), 0.0);

    let second = pipeline.step(&mut state, decode_frame(&encode_frame(50, 0, 0)).expect("frame"));
    assert!((second.energy.value() - 5.0).abs() < 1e-9);
    assert!((second.control.smoothed.value() - 0.5).abs() < 1e-9);
    assert!((second.control.scaled - 0.005).abs() < 1e-9);
    assert_eq!(second.control.volume, 50);
    assert!((second.control.rate - 0.602).abs() < 1e-9);

    assert_eq!(state.orientation.pitch, 5.0);
    assert!((state.smoothed.value() - 0.5).abs() < 1e-9);
}

#[test]
fn unit_smoothing_has_no_lag() {
    let pipeline = MotionPipeline::new(
        0.5,
        ControlCurve {
            smoothing_factor: 1.0,
            ..default_curve()
        },
    );
    let mut state = PipelineState::default();

    // Each sample advances pitch by the same 2 degrees, so every delta is equal.
    for i in 1..=10i16 {
        let sample = decode_frame(&encode_frame(i * 20, 0, 0)).expect("frame");
        let out = pipeline.step(&mut state, sample);
        assert!((out.energy.value() - 2.0).abs() < 1e-9);
        assert_eq!(out.control.smoothed.value(), out.energy.value());
    }
}

#[test]
fn slow_smoothing_approaches_steady_energy() {
    let pipeline = MotionPipeline::new(0.5, default_curve());
    let mut state = PipelineState::default();
    let mut previous = 0.0;
    for i in 1..=40i16 {
        let sample = decode_frame(&encode_frame(i * 100, 0, 0)).expect("frame");
        let out = pipeline.step(&mut state, sample);
        let smoothed = out.control.smoothed.value();
        assert!(smoothed > previous && smoothed < 10.0);
        previous = smoothed;
    }
    assert!(previous > 9.0);
}

#[test]
fn state_is_replaced_as_a_unit() {
    let pipeline = MotionPipeline::new(0.5, default_curve());
    let mut state = PipelineState::default();
    let sample = decode_frame(&encode_frame(300, 1900, -40)).expect("frame");
    let out = pipeline.step(&mut state, sample);
    assert_eq!(state.orientation, sample);
    assert_eq!(state.smoothed, out.control.smoothed);
}
