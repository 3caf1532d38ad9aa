use super::*;

const HALF: MediaTime = MediaTime::from_millis(500);

#[test]
fn ease_endpoints_are_stable() {
    for ease in [
        Ease::Linear,
        Ease::InQuad,
        Ease::OutQuad,
        Ease::InOutQuad,
        Ease::InOutCubic,
    ] {
        assert_eq!(ease.apply(0.0), 0.0);
        assert_eq!(ease.apply(1.0), 1.0);
        assert!(ease.apply(0.25) < ease.apply(0.75));
    }
}

#[test]
fn opacity_values_are_clamped_at_construction() {
    let d = AnimationDescriptor::opacity(-0.5, 1.7, MediaTime::ZERO, HALF);
    assert_eq!(d.ramp, PropertyRamp::Opacity { from: 0.0, to: 1.0 });
    assert_eq!(d.property(), AnimatedProperty::Opacity);
}

#[test]
fn ramp_holds_endpoints_outside_its_window() {
    let fade_out = AnimationDescriptor::opacity(1.0, 0.0, MediaTime::from_millis(2500), HALF);
    assert_eq!(fade_out.sample_at(MediaTime::ZERO), SampledValue::Opacity(1.0));
    assert_eq!(
        fade_out.sample_at(MediaTime::from_millis(2750)),
        SampledValue::Opacity(0.5)
    );
    assert_eq!(fade_out.sample_at(MediaTime::from_secs(9)), SampledValue::Opacity(0.0));
}

#[test]
fn zero_length_ramp_jumps_at_begin() {
    let d = AnimationDescriptor::scale(1.0, 2.0, MediaTime::from_secs(1), MediaTime::ZERO);
    assert_eq!(d.progress_at(MediaTime::from_millis(999)), 0.0);
    assert_eq!(d.progress_at(MediaTime::from_secs(1)), 1.0);
}

#[test]
fn position_ramp_interpolates_both_axes() {
    let d = AnimationDescriptor::position(
        Vec2::new(-40.0, 10.0),
        Vec2::new(40.0, -10.0),
        MediaTime::ZERO,
        MediaTime::from_secs(2),
    );
    assert_eq!(d.property(), AnimatedProperty::Position);
    assert_eq!(
        d.sample_at(MediaTime::from_secs(1)),
        SampledValue::Position(Vec2::new(0.0, 0.0))
    );
    assert_eq!(
        d.sample_at(MediaTime::from_millis(1500)),
        SampledValue::Position(Vec2::new(20.0, -5.0))
    );
}

#[test]
fn to_absolute_shifts_once() {
    let d = AnimationDescriptor::opacity(0.0, 1.0, MediaTime::ZERO, HALF);
    let abs = d.to_absolute(MediaTime::from_secs(6));
    assert_eq!(abs.begin, MediaTime::from_secs(6));
    assert_eq!(abs.time_base, TimeBase::Absolute);
    assert_eq!(abs.to_absolute(MediaTime::from_secs(6)), abs);
}

#[test]
fn layer_state_combines_fades_and_motion() {
    let descs = [
        AnimationDescriptor::opacity(0.0, 1.0, MediaTime::ZERO, HALF),
        AnimationDescriptor::opacity(1.0, 0.0, MediaTime::from_millis(2500), HALF),
        AnimationDescriptor::scale(1.0, 1.2, MediaTime::ZERO, MediaTime::from_secs(3)),
        AnimationDescriptor::position(
            Vec2::ZERO,
            Vec2::new(-30.0, 0.0),
            MediaTime::ZERO,
            MediaTime::from_secs(3),
        ),
    ];

    let start = LayerState::sample(&descs, MediaTime::ZERO);
    assert_eq!(start.opacity, 0.0);
    assert!(!start.is_visible());

    let mid = LayerState::sample(&descs, MediaTime::from_millis(1500));
    assert_eq!(mid.opacity, 1.0);
    assert!((mid.scale - 1.1).abs() < 1e-9);
    assert!((mid.position.x + 15.0).abs() < 1e-9);

    let end = LayerState::sample(&descs, MediaTime::from_secs(3));
    assert_eq!(end.opacity, 0.0);
}
