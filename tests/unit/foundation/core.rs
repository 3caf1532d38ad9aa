use super::*;

#[test]
fn media_time_frames_are_exact_for_integral_products() {
    let fps = Fps::integer(60);
    assert_eq!(MediaTime::from_secs(3).frames_at(fps), 180);
    assert_eq!(MediaTime::from_millis(2_500).frames_at(fps), 150);

    let ntsc = Fps::new(30000, 1001).unwrap();
    assert_eq!(MediaTime::from_secs(1001).frames_at(ntsc), 30_000);
}

#[test]
fn media_time_accumulation_has_no_drift() {
    let d = MediaTime::from_secs_f64(3.0).unwrap();
    let total: MediaTime = std::iter::repeat_n(d, 150).sum();
    assert_eq!(total, MediaTime::from_secs(450));
    assert_eq!(total.frames_at(Fps::integer(60)), 150 * 180);
}

#[test]
fn media_time_rejects_negative_and_nan() {
    assert!(MediaTime::from_secs_f64(-0.5).is_err());
    assert!(MediaTime::from_secs_f64(f64::NAN).is_err());
    assert!(MediaTime::try_from(f64::INFINITY).is_err());
}

#[test]
fn frame_instants_round_trip_through_frames_at() {
    let fps = Fps::integer(60);
    for f in [0u64, 1, 59, 60, 719] {
        let t = MediaTime::from_frame(FrameIndex(f), fps);
        assert_eq!(t.frames_at(fps), f);
    }
}

#[test]
fn media_time_serializes_as_seconds() {
    let t = MediaTime::from_millis(1_500);
    assert_eq!(serde_json::to_string(&t).unwrap(), "1.5");
    let back: MediaTime = serde_json::from_str("0.25").unwrap();
    assert_eq!(back, MediaTime::from_millis(250));
    assert!(serde_json::from_str::<MediaTime>("-1.0").is_err());
}

#[test]
fn fraction_of_clamps_and_handles_zero_span() {
    let span = MediaTime::from_secs(2);
    assert_eq!(MediaTime::from_secs(1).fraction_of(span), 0.5);
    assert_eq!(MediaTime::from_secs(5).fraction_of(span), 1.0);
    assert_eq!(MediaTime::ZERO.fraction_of(MediaTime::ZERO), 1.0);
}

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert_eq!(Fps::default(), Fps::integer(60));
}

#[test]
fn rgba_premul_of_opaque_is_identity() {
    assert_eq!(Rgba8::opaque(10, 20, 30).to_premul_array(), [10, 20, 30, 255]);
    let half = Rgba8 {
        r: 255,
        g: 0,
        b: 0,
        a: 128,
    };
    assert_eq!(half.to_premul_array(), [128, 0, 0, 128]);
}
