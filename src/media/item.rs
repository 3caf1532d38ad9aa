use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::core::{Affine, Fps, MediaTime, Size};
use crate::transform::orientation::Orientation;

/// One input to the timeline. Immutable once handed to a builder.
#[derive(Clone, Debug)]
pub enum MediaItem {
    Image(StillImage),
    VideoClip(VideoClip),
}

impl MediaItem {
    pub fn image(image: StillImage) -> Self {
        Self::Image(image)
    }

    pub fn video(clip: VideoClip) -> Self {
        Self::VideoClip(clip)
    }
}

/// Decoded still image (straight-alpha RGBA8) plus its intrinsic orientation.
#[derive(Clone, Debug)]
pub struct StillImage {
    pixels: Arc<image::RgbaImage>,
    orientation: Orientation,
}

impl StillImage {
    pub fn new(pixels: image::RgbaImage, orientation: Orientation) -> Self {
        Self {
            pixels: Arc::new(pixels),
            orientation,
        }
    }

    /// Uniform color image, handy for tests and title cards.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::new(
            image::RgbaImage::from_pixel(width, height, image::Rgba(rgba)),
            Orientation::Up,
        )
    }

    pub fn pixels(&self) -> &image::RgbaImage {
        &self.pixels
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Stored (unrotated) pixel size.
    pub fn natural_size(&self) -> Size {
        Size::new(
            f64::from(self.pixels.width()),
            f64::from(self.pixels.height()),
        )
    }

    /// Intrinsic transform equivalent of the orientation tag.
    pub fn intrinsic_transform(&self) -> Affine {
        self.orientation.matrix()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }
}

/// Probed facts about a clip's video track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoTrack {
    pub natural_size: Size,
    pub intrinsic: Affine,
    pub duration: MediaTime,
    pub fps: Option<Fps>,
    pub has_audio: bool,
}

impl VideoTrack {
    pub fn orientation(&self) -> Orientation {
        Orientation::from_transform(self.intrinsic)
    }
}

/// Reference to a local video file.
///
/// `track` is `None` when the file could not be opened or has no video stream; such clips are
/// skipped by the timeline builder rather than failing the export.
#[derive(Clone, Debug)]
pub struct VideoClip {
    source: PathBuf,
    track: Option<VideoTrack>,
}

impl VideoClip {
    pub fn new(source: impl Into<PathBuf>, track: VideoTrack) -> Self {
        Self {
            source: source.into(),
            track: Some(track),
        }
    }

    pub fn unopened(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            track: None,
        }
    }

    /// Probe `source` and keep whatever could be learned about it.
    pub fn open(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        match crate::media::probe::probe_video(&source) {
            Ok(track) => Self::new(source, track),
            Err(err) => {
                tracing::warn!(source = %source.display(), %err, "video clip could not be opened");
                Self::unopened(source)
            }
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn track(&self) -> Option<&VideoTrack> {
        self.track.as_ref()
    }
}
