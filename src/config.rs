use std::path::PathBuf;

use crate::{
    foundation::core::{Fps, MediaTime, RenderSize, Rgba8},
    foundation::error::{MontageError, MontageResult},
    transform::orientation::ScalePolicy,
};

/// Upper bound for per-item timings (photo duration, fades).
pub const MAX_TIMING: MediaTime = MediaTime::from_secs(24 * 60 * 60);

/// How stills are mapped into the render frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFit {
    Fit,
    #[default]
    Fill,
}

impl From<ContentFit> for ScalePolicy {
    fn from(fit: ContentFit) -> Self {
        match fit {
            ContentFit::Fit => ScalePolicy::Fit,
            ContentFit::Fill => ScalePolicy::Fill,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionKind {
    #[default]
    None,
    CrossFade,
}

/// Background music, trimmed to `[trim_start, trim_end)` before it is laid under the timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioTrack {
    pub source: PathBuf,
    #[serde(default)]
    pub trim_start: MediaTime,
    #[serde(default)]
    pub trim_end: Option<MediaTime>,
}

impl AudioTrack {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            trim_start: MediaTime::ZERO,
            trim_end: None,
        }
    }

    /// Length of the trim window, if bounded.
    pub fn window(&self) -> Option<MediaTime> {
        self.trim_end.map(|end| end.saturating_sub(self.trim_start))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionAnchor {
    Top,
    Center,
    #[default]
    Bottom,
}

/// Pre-rendered caption image composited above everything else for the whole timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptionSpec {
    pub image: PathBuf,
    #[serde(default)]
    pub anchor: CaptionAnchor,
    /// Distance from the anchored edge, in render pixels.
    #[serde(default)]
    pub margin: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub size: RenderSize,
    pub fps: Fps,
    pub content_fit: ContentFit,
    pub transition: TransitionKind,
    pub photo_duration: MediaTime,
    pub photo_fade: MediaTime,
    pub crossfade: MediaTime,
    pub background: Rgba8,
    pub audio: Option<AudioTrack>,
    pub caption: Option<CaptionSpec>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            size: RenderSize::default(),
            fps: Fps::default(),
            content_fit: ContentFit::default(),
            transition: TransitionKind::default(),
            photo_duration: MediaTime::from_secs(3),
            photo_fade: MediaTime::from_millis(500),
            crossfade: MediaTime::from_millis(500),
            background: Rgba8::BLACK,
            audio: None,
            caption: None,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> MontageResult<()> {
        let RenderSize { width, height } = self.size;
        if width == 0 || height == 0 {
            return Err(MontageError::validation(format!(
                "render size must be non-zero (got {width}x{height})"
            )));
        }
        if width % 2 != 0 || height % 2 != 0 {
            return Err(MontageError::validation(format!(
                "render size must be even for yuv420p output (got {width}x{height})"
            )));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(MontageError::validation("render size exceeds 65535"));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if self.photo_duration.is_zero() {
            return Err(MontageError::validation("photo_duration must be > 0"));
        }
        for (name, value) in [
            ("photo_duration", self.photo_duration),
            ("photo_fade", self.photo_fade),
            ("crossfade", self.crossfade),
        ] {
            if value > MAX_TIMING {
                return Err(MontageError::validation(format!(
                    "{name} must be at most {MAX_TIMING} (got {value})"
                )));
            }
        }
        if let Some(audio) = &self.audio
            && let Some(end) = audio.trim_end
            && end <= audio.trim_start
        {
            return Err(MontageError::validation(format!(
                "audio trim window is empty ({} .. {end})",
                audio.trim_start
            )));
        }
        if let Some(caption) = &self.caption
            && (!caption.margin.is_finite() || caption.margin < 0.0)
        {
            return Err(MontageError::validation(
                "caption margin must be finite and >= 0",
            ));
        }
        Ok(())
    }

    pub fn scale_policy(&self) -> ScalePolicy {
        self.content_fit.into()
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
