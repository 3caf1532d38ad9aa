use super::*;
use crate::{
    encode::{
        memory::{InMemoryWriter, InMemoryWriterOpts},
        writer::WriterConfig,
    },
    export::state::{JobState, StateCell},
    foundation::core::{MediaTime, RenderSize},
    foundation::error::ExportErrorKind,
    media::item::{MediaItem, StillImage},
    timeline::{builder::TimelineBuilder, model::FillerClip},
};

fn config() -> RenderConfig {
    RenderConfig {
        size: RenderSize::new(16, 8),
        fps: Fps::integer(30),
        photo_duration: MediaTime::from_millis(100),
        ..RenderConfig::default()
    }
}

fn timeline(cfg: &RenderConfig, colors: &[[u8; 4]]) -> Timeline {
    let items: Vec<_> = colors
        .iter()
        .map(|c| MediaItem::image(StillImage::solid(4, 4, *c)))
        .collect();
    TimelineBuilder::new(cfg)
        .with_filler(FillerClip::Solid)
        .build(&items)
}

fn writer(cfg: &RenderConfig, tl: &Timeline, opts: InMemoryWriterOpts) -> InMemoryWriter {
    let mut w = InMemoryWriter::new(opts);
    w.begin(&WriterConfig {
        size: cfg.size,
        fps: cfg.fps,
        out_path: "raster.mp4".into(),
        background: cfg.background,
        duration: tl.total_duration,
        audio: None,
    })
    .unwrap();
    w
}

fn reporter() -> (ProgressReporter, crossbeam_channel::Receiver<f64>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let state = StateCell::new();
    state.transition(JobState::Preparing);
    state.transition(JobState::Encoding { progress: 0.0 });
    (ProgressReporter::new(tx, None, state), rx)
}

#[test]
fn every_frame_is_opaque_and_in_order() {
    let cfg = config();
    let tl = timeline(&cfg, &[[255, 0, 0, 255], [0, 255, 0, 128]]);
    let mut w = writer(&cfg, &tl, InMemoryWriterOpts {
        keep_frames: true,
        burst: Some(1),
        ..Default::default()
    });
    let rec = w.recording();
    let (mut progress, rx) = reporter();

    let frames = run_raster(&tl, &cfg, &mut w, &AtomicBool::new(false), &mut progress).unwrap();
    assert_eq!(frames, 6);

    let rec = rec.lock().unwrap();
    assert!(rec.ended);
    assert_eq!(
        rec.indices,
        (0..6).map(FrameIndex).collect::<Vec<_>>()
    );
    assert_eq!(rec.wait_calls, 5);
    for f in &rec.frames {
        assert_eq!((f.width, f.height), (16, 8));
        assert!(f.data.chunks_exact(4).all(|px| px[3] == 255));
    }
    assert_eq!(&rec.frames[0].data[..4], &[255, 0, 0, 255]);
    // The translucent still is forced opaque instead of leaking alpha.
    let last = &rec.frames[5].data[..4];
    assert_eq!((last[0], last[2], last[3]), (0, 0, 255));
    assert!((120..=135).contains(&last[1]));

    drop(progress);
    let values: Vec<f64> = rx.iter().collect();
    assert!(values.windows(2).all(|w| w[0] < w[1]));
    assert!(values.iter().all(|v| *v < 1.0));
}

#[test]
fn cancellation_stops_before_the_next_frame() {
    let cfg = config();
    let tl = timeline(&cfg, &[[255, 0, 0, 255]]);
    let mut w = writer(&cfg, &tl, InMemoryWriterOpts::default());
    let rec = w.recording();
    let (mut progress, _rx) = reporter();

    let err = run_raster(&tl, &cfg, &mut w, &AtomicBool::new(true), &mut progress).unwrap_err();
    assert_eq!(err.kind(), ExportErrorKind::Cancelled);
    assert!(rec.lock().unwrap().indices.is_empty());
}

#[test]
fn rejected_frames_surface_as_append_errors() {
    let cfg = config();
    let tl = timeline(&cfg, &[[255, 0, 0, 255], [0, 0, 255, 255]]);
    let mut w = writer(&cfg, &tl, InMemoryWriterOpts {
        fail_on_frame: Some(2),
        ..Default::default()
    });
    let rec = w.recording();
    let (mut progress, _rx) = reporter();

    let err = run_raster(&tl, &cfg, &mut w, &AtomicBool::new(false), &mut progress).unwrap_err();
    assert_eq!(err.kind(), ExportErrorKind::AppendToBuffer);
    let rec = rec.lock().unwrap();
    assert_eq!(rec.indices.len(), 2);
    assert!(!rec.ended);
}

#[test]
fn finalize_failure_is_a_writer_error() {
    let cfg = config();
    let tl = timeline(&cfg, &[[255, 0, 0, 255]]);
    let mut w = writer(&cfg, &tl, InMemoryWriterOpts {
        fail_on_end: true,
        ..Default::default()
    });
    let (mut progress, _rx) = reporter();
    let err = run_raster(&tl, &cfg, &mut w, &AtomicBool::new(false), &mut progress).unwrap_err();
    assert_eq!(err.kind(), ExportErrorKind::VideoWriter);
}
