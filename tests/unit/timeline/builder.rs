use super::*;
use crate::{
    foundation::core::{Affine, RenderSize, Size},
    media::item::VideoTrack,
    timeline::{
        anim::PropertyRamp,
        model::SegmentKind,
        motion::{Motion, MotionSequence},
    },
};

fn photo() -> MediaItem {
    MediaItem::image(StillImage::solid(40, 30, [200, 10, 10, 255]))
}

fn clip(secs: u64) -> VideoClip {
    VideoClip::new(
        "clip.mov",
        VideoTrack {
            natural_size: Size::new(1920.0, 1080.0),
            intrinsic: Affine::IDENTITY,
            duration: MediaTime::from_secs(secs),
            fps: None,
            has_audio: false,
        },
    )
}

fn fades_in(seg: &TimelineSegment) -> bool {
    seg.animations.iter().any(|a| {
        a.begin == MediaTime::ZERO && matches!(a.ramp, PropertyRamp::Opacity { from, .. } if from == 0.0)
    })
}

#[test]
fn four_photos_make_twelve_seconds() {
    let cfg = RenderConfig::default();
    let items = vec![photo(), photo(), photo(), photo()];
    let tl = TimelineBuilder::new(&cfg)
        .with_filler(FillerClip::Solid)
        .build(&items);

    assert_eq!(tl.segments.len(), 4);
    assert_eq!(tl.total_duration, MediaTime::from_secs(12));
    assert_eq!(tl.total_frames(), 720);
    assert!(tl.is_contiguous());
    assert!(tl.skipped.is_empty());
}

#[test]
fn first_photo_never_fades_in() {
    let cfg = RenderConfig::default();
    let items = vec![photo(), photo(), photo()];
    let tl = TimelineBuilder::new(&cfg)
        .with_filler(FillerClip::Solid)
        .build(&items);

    assert!(!fades_in(&tl.segments[0]));
    assert!(fades_in(&tl.segments[1]));
    assert!(fades_in(&tl.segments[2]));
    for seg in &tl.segments {
        let fade_out_ends_at_end = seg.animations.iter().any(|a| {
            a.end() == seg.duration && matches!(a.ramp, PropertyRamp::Opacity { to, .. } if to == 0.0)
        });
        assert!(fade_out_ends_at_end);
    }
}

#[test]
fn first_placed_segment_skips_fade_in_even_after_a_skip() {
    let cfg = RenderConfig::default();
    let items = vec![MediaItem::video(VideoClip::unopened("broken.mov")), photo()];
    let tl = TimelineBuilder::new(&cfg)
        .with_filler(FillerClip::Solid)
        .build(&items);
    assert_eq!(tl.segments[0].index, 1);
    assert!(!fades_in(&tl.segments[0]));
}

#[test]
fn injected_motions_are_used_in_order() {
    let cfg = RenderConfig::default();
    let items = vec![photo(), photo(), photo()];
    let tl = TimelineBuilder::new(&cfg)
        .with_filler(FillerClip::Solid)
        .with_motions(MotionSequence::new([Motion::PanLeft, Motion::ZoomOut]))
        .build(&items);
    let motions: Vec<_> = tl.segments.iter().map(|s| s.motion).collect();
    assert_eq!(
        motions,
        vec![Some(Motion::PanLeft), Some(Motion::ZoomOut), Some(Motion::PanLeft)]
    );
}

#[test]
fn equal_seeds_build_equal_motion_sequences() {
    let cfg = RenderConfig::default();
    let items: Vec<_> = (0..10).map(|_| photo()).collect();
    let a = TimelineBuilder::new(&cfg)
        .with_filler(FillerClip::Solid)
        .with_seed(7)
        .build(&items);
    let b = TimelineBuilder::new(&cfg)
        .with_filler(FillerClip::Solid)
        .with_seed(7)
        .build(&items);
    let ma: Vec<_> = a.segments.iter().map(|s| s.motion).collect();
    let mb: Vec<_> = b.segments.iter().map(|s| s.motion).collect();
    assert_eq!(ma, mb);
}

#[test]
fn unopened_and_empty_clips_are_skipped_without_advancing() {
    let cfg = RenderConfig::default();
    let items = vec![
        MediaItem::video(clip(2)),
        MediaItem::video(VideoClip::unopened("missing.mov")),
        MediaItem::video(clip(0)),
        MediaItem::video(clip(5)),
    ];
    let tl = TimelineBuilder::new(&cfg).build(&items);

    assert_eq!(tl.segments.len(), 2);
    assert_eq!(tl.segments[1].insert, MediaTime::from_secs(2));
    assert_eq!(tl.total_duration, MediaTime::from_secs(7));
    assert_eq!(
        tl.skipped,
        vec![
            SkippedItem { index: 1, reason: SkipReason::MissingVideoTrack },
            SkippedItem { index: 2, reason: SkipReason::EmptyDuration },
        ]
    );
    assert!(tl.segments.iter().all(|s| s.kind() == SegmentKind::Video));
    assert!(tl.segments.iter().all(|s| s.animations.is_empty()));
}

#[test]
fn photos_without_filler_are_reported() {
    let cfg = RenderConfig::default();
    let items = vec![photo(), MediaItem::video(clip(4))];
    let tl = TimelineBuilder::new(&cfg).build(&items);

    assert_eq!(tl.segments.len(), 1);
    assert_eq!(tl.segments[0].insert, MediaTime::ZERO);
    assert_eq!(
        tl.skipped,
        vec![SkippedItem { index: 0, reason: SkipReason::MissingFiller }]
    );
}

#[test]
fn short_filler_clip_cannot_back_a_photo() {
    let cfg = RenderConfig::default();
    let tl = TimelineBuilder::new(&cfg)
        .with_filler(FillerClip::Clip(clip(1)))
        .build(&[photo()]);
    assert!(tl.is_empty());
    assert_eq!(tl.skipped[0].reason, SkipReason::FillerTooShort);

    let tl = TimelineBuilder::new(&cfg)
        .with_filler(FillerClip::Clip(clip(3)))
        .build(&[photo()]);
    assert_eq!(tl.segments.len(), 1);
}

#[test]
fn crossfade_goes_on_every_outgoing_segment_but_the_last() {
    let cfg = RenderConfig {
        transition: TransitionKind::CrossFade,
        photo_fade: MediaTime::ZERO,
        ..RenderConfig::default()
    };
    let items = vec![MediaItem::video(clip(2)), photo(), MediaItem::video(clip(1))];
    let tl = TimelineBuilder::new(&cfg)
        .with_filler(FillerClip::Solid)
        .build(&items);

    let opacity_ramps = |seg: &TimelineSegment| {
        seg.animations
            .iter()
            .filter(|a| matches!(a.ramp, PropertyRamp::Opacity { .. }))
            .copied()
            .collect::<Vec<_>>()
    };
    let first = opacity_ramps(&tl.segments[0]);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].ramp, PropertyRamp::Opacity { from: 1.0, to: 0.0 });
    assert_eq!(first[0].begin, MediaTime::from_millis(1500));
    assert_eq!(first[0].end(), MediaTime::from_secs(2));
    assert_eq!(opacity_ramps(&tl.segments[1]).len(), 1);
    assert!(opacity_ramps(&tl.segments[2]).is_empty());
}

#[test]
fn many_photos_stay_contiguous_and_exact() {
    let cfg = RenderConfig::default();
    let items: Vec<_> = (0..150).map(|_| photo()).collect();
    let tl = TimelineBuilder::new(&cfg)
        .with_filler(FillerClip::Solid)
        .build(&items);
    assert!(tl.is_contiguous());
    assert_eq!(tl.total_frames(), 150 * 3 * 60);
    for seg in &tl.segments {
        assert_eq!(tl.frame_range(seg).count(), 180);
    }
}

#[test]
fn segment_lookup_uses_half_open_ranges() {
    let cfg = RenderConfig::default();
    let tl = TimelineBuilder::new(&cfg)
        .with_filler(FillerClip::Solid)
        .build(&[photo(), photo()]);
    assert_eq!(tl.segment_at(MediaTime::ZERO).map(|s| s.index), Some(0));
    assert_eq!(tl.segment_at(MediaTime::from_secs(3)).map(|s| s.index), Some(1));
    assert!(tl.segment_at(MediaTime::from_secs(6)).is_none());
}

#[test]
fn photo_transform_follows_content_fit() {
    let cfg = RenderConfig {
        size: RenderSize::new(800, 400),
        content_fit: crate::config::ContentFit::Fit,
        ..RenderConfig::default()
    };
    let tl = TimelineBuilder::new(&cfg)
        .with_filler(FillerClip::Solid)
        .build(&[MediaItem::image(StillImage::solid(400, 400, [0, 0, 0, 255]))]);
    assert!((tl.segments[0].transform.scale - 1.0).abs() < 1e-12);
}

#[test]
fn items_past_the_time_range_are_skipped() {
    let cfg = RenderConfig {
        photo_duration: MediaTime::from_micros(u64::MAX / 2 + 1),
        ..RenderConfig::default()
    };
    let items = vec![photo(), photo(), MediaItem::video(clip(2))];
    let tl = TimelineBuilder::new(&cfg)
        .with_filler(FillerClip::Solid)
        .build(&items);

    assert_eq!(tl.segments.len(), 2);
    assert_eq!(
        tl.skipped,
        vec![SkippedItem {
            index: 1,
            reason: SkipReason::TimelineOverflow
        }]
    );
    assert_eq!(tl.segments[1].insert, cfg.photo_duration);
    assert_eq!(
        tl.total_duration,
        MediaTime::from_micros(u64::MAX / 2 + 1 + 2_000_000)
    );
    assert!(tl.is_contiguous());
}
