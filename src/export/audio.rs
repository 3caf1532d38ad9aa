use std::path::Path;

use crate::{
    config::AudioTrack,
    encode::writer::AudioInput,
    foundation::core::MediaTime,
    foundation::error::MontageResult,
    media::probe::{AudioInfo, probe_audio},
};

/// Turn the configured track into writer input, or `None` when it cannot be used.
///
/// Audio problems never fail an export: the video is written without sound instead.
pub(crate) fn resolve_audio(track: Option<&AudioTrack>, total: MediaTime) -> Option<AudioInput> {
    resolve_audio_with(track, total, probe_audio)
}

pub(crate) fn resolve_audio_with(
    track: Option<&AudioTrack>,
    total: MediaTime,
    probe: impl FnOnce(&Path) -> MontageResult<AudioInfo>,
) -> Option<AudioInput> {
    let track = track?;
    if !track.source.is_file() {
        tracing::warn!(source = %track.source.display(), "audio source not found, exporting without audio");
        return None;
    }
    let info = match probe(&track.source) {
        Ok(info) => info,
        Err(err) => {
            tracing::warn!(source = %track.source.display(), %err, "audio source unreadable, exporting without audio");
            return None;
        }
    };
    let available = info.duration.saturating_sub(track.trim_start);
    if available.is_zero() {
        tracing::warn!(
            source = %track.source.display(),
            trim_start = %track.trim_start,
            "audio trim starts past the end of the source, exporting without audio"
        );
        return None;
    }
    let duration = track
        .window()
        .unwrap_or(available)
        .min(available)
        .min(total);
    tracing::debug!(start = %track.trim_start, %duration, "audio resolved");
    Some(AudioInput {
        source: track.source.clone(),
        start: track.trim_start,
        duration,
    })
}
