use super::*;
use crate::{
    encode::memory::{InMemoryWriterFactory, InMemoryWriterOpts},
    foundation::core::{Fps, RenderSize},
    foundation::error::ExportErrorKind,
    media::item::{StillImage, VideoClip},
};

fn config() -> RenderConfig {
    RenderConfig {
        size: RenderSize::new(16, 8),
        fps: Fps::integer(30),
        photo_duration: MediaTime::from_millis(100),
        ..RenderConfig::default()
    }
}

fn stills(n: usize) -> Vec<MediaItem> {
    (0..n)
        .map(|_| MediaItem::image(StillImage::solid(4, 4, [10, 20, 30, 255])))
        .collect()
}

fn job(items: Vec<MediaItem>, out: &std::path::Path, factory: &Arc<InMemoryWriterFactory>) -> ExportJob {
    ExportJob::new(ExportRequest::new(items, config(), out))
        .writer_factory(Arc::clone(factory) as Arc<dyn WriterFactory>)
}

#[test]
fn successful_jobs_walk_every_phase_once() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(InMemoryWriterFactory::default());
    let handle = job(stills(2), &dir.path().join("a.mp4"), &factory).start();
    let cell = handle.state.clone();
    let out = handle.wait().unwrap();

    assert_eq!(out.frames, 6);
    assert_eq!(out.segments, 2);
    assert!(!out.audio_included);
    let phases: Vec<_> = cell
        .history()
        .into_iter()
        .map(|s| std::mem::discriminant(&s))
        .collect();
    assert_eq!(phases.len(), 4);
    assert!(matches!(cell.get(), JobState::Finished { .. }));
}

#[test]
fn empty_input_fails_without_a_worker() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(InMemoryWriterFactory::default());
    let mut handle = job(Vec::new(), &dir.path().join("a.mp4"), &factory).start();
    assert!(handle.worker.is_none());
    assert_eq!(
        handle.try_outcome().map(|o| o.as_ref().map_err(ExportError::kind).err()),
        Some(Some(ExportErrorKind::Media))
    );
    assert_eq!(
        handle.state(),
        JobState::Failed {
            error: ExportErrorKind::Media
        }
    );
    assert_eq!(handle.wait().unwrap_err().kind(), ExportErrorKind::Media);
    assert_eq!(factory.created(), 0);
}

#[test]
fn nothing_placeable_is_a_media_error() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(InMemoryWriterFactory::default());
    let items = vec![
        MediaItem::video(VideoClip::unopened("missing.mov")),
        MediaItem::image(StillImage::solid(0, 0, [0, 0, 0, 0])),
    ];
    let err = job(items, &dir.path().join("a.mp4"), &factory).run().unwrap_err();
    assert_eq!(err.kind(), ExportErrorKind::Media);
    assert_eq!(factory.created(), 0);
}

#[test]
fn writer_start_failure_is_a_writer_error() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(InMemoryWriterFactory::new(InMemoryWriterOpts {
        fail_on_begin: true,
        ..Default::default()
    }));
    let err = job(stills(1), &dir.path().join("a.mp4"), &factory).run().unwrap_err();
    assert_eq!(err.kind(), ExportErrorKind::VideoWriter);
    assert_eq!(factory.created(), 1);
    assert!(factory.recordings()[0].lock().unwrap().aborted);
}

#[test]
fn invalid_config_fails_while_preparing() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(InMemoryWriterFactory::default());
    let mut cfg = config();
    cfg.size = RenderSize::new(15, 8);
    let handle = ExportJob::new(ExportRequest::new(stills(1), cfg, dir.path().join("a.mp4")))
        .writer_factory(Arc::clone(&factory) as Arc<dyn WriterFactory>)
        .start();
    let cell = handle.state.clone();
    assert_eq!(handle.wait().unwrap_err().kind(), ExportErrorKind::VideoWriter);
    assert_eq!(
        cell.history(),
        vec![
            JobState::Idle,
            JobState::Preparing,
            JobState::Failed {
                error: ExportErrorKind::VideoWriter
            }
        ]
    );
    assert_eq!(factory.created(), 0);
}

#[test]
fn missing_filler_skips_stills() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(InMemoryWriterFactory::default());
    let err = ExportJob::new(
        ExportRequest::new(stills(3), config(), dir.path().join("a.mp4")).without_filler(),
    )
    .writer_factory(Arc::clone(&factory) as Arc<dyn WriterFactory>)
    .run()
    .unwrap_err();
    assert_eq!(err.kind(), ExportErrorKind::Media);
}

#[test]
fn completion_callback_sees_the_same_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(InMemoryWriterFactory::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let out = job(stills(1), &dir.path().join("a.mp4"), &factory)
        .strategy(ExportStrategy::Layered)
        .poll_interval(Duration::from_millis(5))
        .on_complete(move |o| sink.lock().unwrap().push(o.as_ref().map(|o| o.frames).ok()))
        .run()
        .unwrap();
    assert_eq!(out.strategy, ExportStrategy::Layered);
    assert_eq!(*seen.lock().unwrap(), vec![Some(3)]);
}

#[test]
fn panicking_completion_callback_still_settles_the_handle() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(InMemoryWriterFactory::default());
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let out = job(stills(1), &dir.path().join("a.mp4"), &factory)
        .on_complete(move |outcome| {
            *sink.lock().unwrap() = Some(outcome.is_ok());
            panic!("callback blew up");
        })
        .run()
        .unwrap();

    assert_eq!(out.frames, 3);
    assert_eq!(*seen.lock().unwrap(), Some(true));
}
