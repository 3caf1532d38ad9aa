use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::{
    config::RenderConfig,
    encode::{
        ffmpeg::FfmpegWriterFactory,
        writer::{VideoWriter, WriterConfig, WriterFactory},
    },
    export::{
        audio::resolve_audio,
        layered::run_layered,
        output::{discard_partial, prepare_output},
        progress::{ProgressCallback, ProgressReporter},
        raster::run_raster,
        state::{JobState, StateCell},
    },
    foundation::core::MediaTime,
    foundation::error::ExportError,
    media::item::MediaItem,
    render::layers::LayerSynthesizer,
    timeline::{
        builder::TimelineBuilder,
        model::{FillerClip, SkippedItem},
        motion::{MotionSource, SeededMotions},
    },
};

/// Terminal result of an export.
pub type ExportOutcome = Result<ExportOutput, ExportError>;

/// Called exactly once with the terminal outcome, from whichever thread reached it.
pub type CompletionCallback = Box<dyn FnOnce(&ExportOutcome) + Send>;

/// Everything an export needs besides the writer.
#[derive(Clone, Debug)]
pub struct ExportRequest {
    pub items: Vec<MediaItem>,
    pub config: RenderConfig,
    pub output: PathBuf,
    /// Base under stills. `None` makes every still a skip.
    pub filler: Option<FillerClip>,
    /// Seed for the pan/zoom choice of each still.
    pub seed: u64,
}

impl ExportRequest {
    pub fn new(items: Vec<MediaItem>, config: RenderConfig, output: impl Into<PathBuf>) -> Self {
        Self {
            items,
            config,
            output: output.into(),
            filler: Some(FillerClip::Solid),
            seed: 0,
        }
    }

    pub fn with_filler(mut self, filler: FillerClip) -> Self {
        self.filler = Some(filler);
        self
    }

    pub fn without_filler(mut self) -> Self {
        self.filler = None;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Which frame synthesizer drives the writer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStrategy {
    /// Pull loop over pooled, non-animated frames.
    #[default]
    Raster,
    /// Layer graph rendered by an asynchronous composition session.
    Layered,
}

/// What a finished export produced.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ExportOutput {
    pub path: PathBuf,
    pub strategy: ExportStrategy,
    pub duration: MediaTime,
    pub frames: u64,
    pub segments: usize,
    pub skipped: Vec<SkippedItem>,
    pub audio_included: bool,
}

/// One-shot export of media items into a movie file.
///
/// ```no_run
/// use montage::{ExportJob, ExportRequest, MediaItem, RenderConfig, StillImage};
///
/// let items = vec![MediaItem::image(StillImage::solid(640, 480, [255, 0, 0, 255]))];
/// let out = ExportJob::new(ExportRequest::new(items, RenderConfig::default(), "out.mp4")).run()?;
/// println!("{} frames", out.frames);
/// # Ok::<(), montage::ExportError>(())
/// ```
pub struct ExportJob {
    request: ExportRequest,
    strategy: ExportStrategy,
    writers: Arc<dyn WriterFactory>,
    motions: Option<Box<dyn MotionSource>>,
    on_progress: Option<ProgressCallback>,
    on_complete: Option<CompletionCallback>,
    poll_interval: Duration,
}

impl ExportJob {
    pub fn new(request: ExportRequest) -> Self {
        Self {
            request,
            strategy: ExportStrategy::default(),
            writers: Arc::new(FfmpegWriterFactory),
            motions: None,
            on_progress: None,
            on_complete: None,
            poll_interval: Duration::from_millis(50),
        }
    }

    pub fn strategy(mut self, strategy: ExportStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn writer_factory(mut self, writers: Arc<dyn WriterFactory>) -> Self {
        self.writers = writers;
        self
    }

    /// Replace the seeded motion choice.
    pub fn motions(mut self, motions: impl MotionSource + 'static) -> Self {
        self.motions = Some(Box::new(motions));
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(f64) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn on_complete(mut self, callback: impl FnOnce(&ExportOutcome) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// How often the layered path polls its session.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run to completion on the calling thread's behalf.
    pub fn run(self) -> ExportOutcome {
        self.start().wait()
    }

    /// Start the export on a background worker.
    ///
    /// An empty item list fails right here with [`ExportError::Media`], before any writer exists.
    pub fn start(self) -> ExportHandle {
        let state = StateCell::new();
        let cancel = Arc::new(AtomicBool::new(false));
        let (progress_tx, progress_rx) = crossbeam_channel::unbounded();
        let (outcome_tx, outcome_rx) = crossbeam_channel::bounded(1);
        let completion = Completion::new(self.on_complete, outcome_tx, state.clone());

        let mut handle = ExportHandle {
            state: state.clone(),
            cancel: Arc::clone(&cancel),
            progress: progress_rx,
            outcome: outcome_rx,
            settled: None,
            worker: None,
        };

        if self.request.items.is_empty() {
            completion.fire(Err(ExportError::media("no media items to export")), None);
            return handle;
        }

        let worker = Worker {
            request: self.request,
            strategy: self.strategy,
            writers: self.writers,
            motions: self.motions,
            cancel,
            state: state.clone(),
            poll_interval: self.poll_interval,
        };
        let reporter = ProgressReporter::new(progress_tx, self.on_progress, state);
        let slot = Arc::new(Mutex::new(Some(completion)));
        let worker_slot = Arc::clone(&slot);

        let spawned = std::thread::Builder::new()
            .name("montage-export".into())
            .spawn(move || {
                let mut reporter = reporter;
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    worker.execute(&mut reporter)
                }))
                .unwrap_or_else(|panic| {
                    let msg = panic
                        .downcast_ref::<&str>()
                        .map(|s| (*s).to_owned())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_owned());
                    Err(ExportError::Render(format!("export worker panicked: {msg}")))
                });
                if let Some(completion) = take_completion(&worker_slot) {
                    completion.fire(outcome, Some(&mut reporter));
                }
            });

        match spawned {
            Ok(worker) => handle.worker = Some(worker),
            Err(e) => {
                if let Some(completion) = take_completion(&slot) {
                    completion.fire(
                        Err(ExportError::video_writer(format!(
                            "failed to spawn export worker: {e}"
                        ))),
                        None,
                    );
                }
            }
        }
        handle
    }
}

fn take_completion(slot: &Mutex<Option<Completion>>) -> Option<Completion> {
    slot.lock().unwrap_or_else(|e| e.into_inner()).take()
}

/// Single-use terminal signal; consuming `self` is what makes it fire at most once.
struct Completion {
    callback: Option<CompletionCallback>,
    tx: Sender<ExportOutcome>,
    state: StateCell,
}

impl Completion {
    fn new(callback: Option<CompletionCallback>, tx: Sender<ExportOutcome>, state: StateCell) -> Self {
        Self {
            callback,
            tx,
            state,
        }
    }

    fn fire(self, outcome: ExportOutcome, reporter: Option<&mut ProgressReporter>) {
        match &outcome {
            Ok(out) => {
                self.state.transition(JobState::Finished {
                    output: out.path.clone(),
                });
                if let Some(reporter) = reporter {
                    reporter.finish();
                }
                tracing::info!(
                    out = %out.path.display(),
                    frames = out.frames,
                    duration = %out.duration,
                    skipped = out.skipped.len(),
                    audio = out.audio_included,
                    "export finished"
                );
            }
            Err(err) => {
                self.state.transition(JobState::Failed { error: err.kind() });
                tracing::info!(kind = ?err.kind(), %err, "export failed");
            }
        }
        if let Some(cb) = self.callback
            && std::panic::catch_unwind(AssertUnwindSafe(|| cb(&outcome))).is_err()
        {
            tracing::warn!("completion callback panicked");
        }
        let _ = self.tx.send(outcome);
    }
}

struct Worker {
    request: ExportRequest,
    strategy: ExportStrategy,
    writers: Arc<dyn WriterFactory>,
    motions: Option<Box<dyn MotionSource>>,
    cancel: Arc<AtomicBool>,
    state: StateCell,
    poll_interval: Duration,
}

impl Worker {
    #[tracing::instrument(
        name = "export",
        skip_all,
        fields(out = %self.request.output.display(), strategy = ?self.strategy, items = self.request.items.len())
    )]
    fn execute(self, progress: &mut ProgressReporter) -> ExportOutcome {
        let Worker {
            request,
            strategy,
            writers,
            motions,
            cancel,
            state,
            poll_interval,
        } = self;
        let ExportRequest {
            items,
            config,
            output,
            filler,
            seed,
        } = request;

        state.transition(JobState::Preparing);
        config.validate().map_err(ExportError::video_writer)?;

        let builder = TimelineBuilder::new(&config).with_optional_filler(filler);
        let builder = match motions {
            Some(motions) => builder.with_motions(motions),
            None => builder.with_motions(SeededMotions::new(seed)),
        };
        let timeline = builder.build(&items);
        if timeline.is_empty() {
            return Err(ExportError::media(format!(
                "none of the {} media items could be placed on the timeline",
                items.len()
            )));
        }

        let graph = match strategy {
            ExportStrategy::Raster => None,
            ExportStrategy::Layered => Some(Arc::new(
                LayerSynthesizer::build(&timeline, &config).map_err(ExportError::render)?,
            )),
        };

        prepare_output(&output)?;
        if cancel.load(Ordering::Acquire) {
            return Err(ExportError::Cancelled);
        }

        let audio = resolve_audio(config.audio.as_ref(), timeline.total_duration);
        let audio_included = audio.is_some();
        let writer_cfg = WriterConfig {
            size: config.size,
            fps: config.fps,
            out_path: output.clone(),
            background: config.background,
            duration: timeline.total_duration,
            audio,
        };
        let writer = open_writer(writers.as_ref(), &writer_cfg)?;

        state.transition(JobState::Encoding { progress: 0.0 });
        progress.report(0.0);

        let encoded = match (strategy, graph) {
            (ExportStrategy::Layered, Some(graph)) => {
                run_layered(graph, writer, &cancel, progress, poll_interval)
            }
            _ => {
                let mut writer = writer;
                let res = run_raster(&timeline, &config, writer.as_mut(), &cancel, progress);
                if res.is_err() {
                    writer.abort();
                }
                res
            }
        };

        match encoded {
            Ok(frames) => Ok(ExportOutput {
                path: output,
                strategy,
                duration: timeline.total_duration,
                frames,
                segments: timeline.segments.len(),
                skipped: timeline.skipped,
                audio_included,
            }),
            Err(err) => {
                discard_partial(&output);
                Err(err)
            }
        }
    }
}

fn open_writer(
    writers: &dyn WriterFactory,
    cfg: &WriterConfig,
) -> Result<Box<dyn VideoWriter>, ExportError> {
    let mut writer = writers.create().map_err(ExportError::video_writer)?;
    if let Err(err) = writer.begin(cfg) {
        writer.abort();
        discard_partial(&cfg.out_path);
        return Err(ExportError::video_writer(err));
    }
    Ok(writer)
}

/// Live view of a started export.
pub struct ExportHandle {
    state: StateCell,
    cancel: Arc<AtomicBool>,
    progress: Receiver<f64>,
    outcome: Receiver<ExportOutcome>,
    settled: Option<ExportOutcome>,
    worker: Option<JoinHandle<()>>,
}

impl ExportHandle {
    pub fn state(&self) -> JobState {
        self.state.get()
    }

    /// Phases the job has gone through so far, starting with `Idle`.
    pub fn history(&self) -> Vec<JobState> {
        self.state.history()
    }

    /// Ask the job to stop at the next frame boundary. The job then fails with `Cancelled`.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Progress values in `[0, 1]`, non-decreasing, ending with `1.0` on success.
    pub fn progress(&self) -> &Receiver<f64> {
        &self.progress
    }

    /// The outcome, if the job has already settled.
    pub fn try_outcome(&mut self) -> Option<&ExportOutcome> {
        if self.settled.is_none() {
            self.settled = self.outcome.try_recv().ok();
        }
        self.settled.as_ref()
    }

    /// Block until the job settles.
    pub fn wait(mut self) -> ExportOutcome {
        let outcome = match self.settled.take() {
            Some(outcome) => outcome,
            None => self.outcome.recv().unwrap_or_else(|_| {
                Err(ExportError::Render(
                    "export worker exited without an outcome".to_owned(),
                ))
            }),
        };
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        outcome
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/job.rs"]
mod tests;
