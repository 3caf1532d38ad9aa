use std::path::Path;

use crate::{
    foundation::core::{Fps, MediaTime, Size},
    foundation::error::{MontageError, MontageResult},
    media::item::VideoTrack,
    transform::orientation::Orientation,
};

/// Facts about an audio-bearing file, as far as the exporter cares.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioInfo {
    pub duration: MediaTime,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    tags: Option<ProbeTags>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
}

#[derive(serde::Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

impl ProbeOut {
    fn stream(&self, kind: &str) -> Option<&ProbeStream> {
        self.streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some(kind))
    }

    fn duration(&self, stream: Option<&ProbeStream>) -> MediaTime {
        stream
            .and_then(|s| s.duration.as_deref())
            .or_else(|| self.format.as_ref().and_then(|f| f.duration.as_deref()))
            .and_then(|s| s.parse::<f64>().ok())
            .and_then(|secs| MediaTime::from_secs_f64(secs).ok())
            .unwrap_or(MediaTime::ZERO)
    }
}

/// Interpret `ffprobe -print_format json -show_streams -show_format` output as a video track.
pub fn parse_video_probe(json: &[u8]) -> MontageResult<VideoTrack> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| MontageError::media(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .stream("video")
        .ok_or_else(|| MontageError::media("no video stream found"))?;
    let width = video
        .width
        .ok_or_else(|| MontageError::media("missing video width from ffprobe"))?;
    let height = video
        .height
        .ok_or_else(|| MontageError::media("missing video height from ffprobe"))?;

    let fps = video
        .r_frame_rate
        .as_deref()
        .and_then(parse_ff_ratio)
        .and_then(|(num, den)| Fps::new(num, den).ok());

    Ok(VideoTrack {
        natural_size: Size::new(f64::from(width), f64::from(height)),
        intrinsic: rotation_of(video).matrix(),
        duration: parsed.duration(Some(video)),
        fps,
        has_audio: parsed.stream("audio").is_some(),
    })
}

pub fn parse_audio_probe(json: &[u8]) -> MontageResult<AudioInfo> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| MontageError::media(format!("ffprobe json parse failed: {e}")))?;
    let audio = parsed
        .stream("audio")
        .ok_or_else(|| MontageError::media("no audio stream found"))?;
    Ok(AudioInfo {
        duration: parsed.duration(Some(audio)),
    })
}

/// Legacy containers use a `rotate` tag; newer ffprobe reports a display matrix whose rotation
/// has the opposite sign.
fn rotation_of(stream: &ProbeStream) -> Orientation {
    let tagged = stream
        .tags
        .as_ref()
        .and_then(|t| t.rotate.as_deref())
        .and_then(|r| r.trim().parse::<i64>().ok());
    let degrees = tagged.or_else(|| {
        stream
            .side_data_list
            .iter()
            .find_map(|sd| sd.rotation)
            .map(|r| -(r.round() as i64))
    });
    degrees
        .map(Orientation::from_rotation_degrees)
        .unwrap_or_default()
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if a == 0 || b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(feature = "media-ffmpeg")]
fn run_ffprobe(path: &Path) -> MontageResult<Vec<u8>> {
    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| MontageError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(MontageError::media(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(out.stdout)
}

#[cfg(not(feature = "media-ffmpeg"))]
fn run_ffprobe(_path: &Path) -> MontageResult<Vec<u8>> {
    Err(MontageError::media(
        "video and audio sources require the 'media-ffmpeg' feature",
    ))
}

#[tracing::instrument(level = "debug", fields(path = %path.display()))]
pub fn probe_video(path: &Path) -> MontageResult<VideoTrack> {
    parse_video_probe(&run_ffprobe(path)?)
}

#[tracing::instrument(level = "debug", fields(path = %path.display()))]
pub fn probe_audio(path: &Path) -> MontageResult<AudioInfo> {
    parse_audio_probe(&run_ffprobe(path)?)
}

#[cfg(test)]
#[path = "../../tests/unit/media/probe.rs"]
mod tests;
