use super::*;
use crate::estimator::MotionEstimator;
use shared::domain::OrientationSample;

fn curve() -> ControlCurve {
    ControlCurve {
        sensitivity: 1.0,
        smoothing_factor: 0.1,
        normalisation_factor: 100.0,
        max_volume: 220,
        min_tempo: 0.6,
    }
}

fn energy(value: f64) -> MotionEnergy {
    MotionEstimator::new(0.0).estimate(
        &OrientationSample::default(),
        &OrientationSample::new(value, 0.0, 0.0),
    )
}

#[test]
fn smoothing_is_convex_combination() {
    for factor in [0.05, 0.1, 0.5, 0.9, 1.0] {
        let mapper = ControlMapper::new(ControlCurve {
            smoothing_factor: factor,
            ..curve()
        });
        for (previous, next) in [(0.0, 50.0), (40.0, 0.0), (12.5, 12.5), (3.0, 27.0)] {
            let smoothed = mapper.smooth(SmoothedMotion::new(previous), energy(next)).value();
            let low = f64::min(previous, next);
            let high = f64::max(previous, next);
            assert!(
                smoothed >= low - 1e-12 && smoothed <= high + 1e-12,
                "factor={factor} previous={previous} next={next} smoothed={smoothed}"
            );
        }
    }
}

#[test]
fn full_smoothing_factor_tracks_energy_immediately() {
    let mapper = ControlMapper::new(ControlCurve {
        smoothing_factor: 1.0,
        ..curve()
    });
    let smoothed = mapper.smooth(SmoothedMotion::new(33.0), energy(5.0));
    assert_eq!(smoothed.value(), 5.0);
}

#[test]
fn stillness_maps_to_floor_volume_and_min_tempo() {
    let mapper = ControlMapper::new(curve());
    let output = mapper.map(SmoothedMotion::default(), MotionEnergy::ZERO);
    assert_eq!(output.scaled, 0.0);
    assert_eq!(output.volume, 50);
    assert!((output.rate - 0.6).abs() < 1e-12);
}

#[test]
fn full_motion_maps_to_ceiling() {
    let mapper = ControlMapper::new(ControlCurve {
        sensitivity: 10.0,
        smoothing_factor: 1.0,
        ..curve()
    });
    let output = mapper.map(SmoothedMotion::default(), energy(50.0));
    assert_eq!(output.scaled, 1.0);
    assert_eq!(output.volume, 220);
    assert_eq!(output.rate, 1.0);
}

#[test]
fn outputs_bounded_and_monotone_in_scaled() {
    let mapper = ControlMapper::new(curve());
    let mut last_volume = 0u16;
    let mut last_rate = 0.0f64;
    for step in 0..=1000 {
        let scaled = f64::from(step) / 1000.0;
        let volume = mapper.volume_for(scaled);
        let rate = mapper.rate_for(scaled);
        assert!((50..=220).contains(&volume), "volume {volume} at {scaled}");
        assert!((0.6..=1.0).contains(&rate), "rate {rate} at {scaled}");
        assert!(volume >= last_volume);
        assert!(rate >= last_rate);
        last_volume = volume;
        last_rate = rate;
    }
}

#[test]
fn adversarial_smoothed_value_still_scales_into_unit_interval() {
    let mapper = ControlMapper::new(curve());
    assert_eq!(mapper.scale(SmoothedMotion::new(1.0e9)), 1.0);
    assert_eq!(mapper.scale(SmoothedMotion::new(-5.0)), 0.0);
}

#[test]
fn limits_mirror_curve() {
    let limits = curve().limits();
    assert_eq!(limits.max_volume, 220);
    assert_eq!(limits.min_tempo, 0.6);
}
