use std::path::PathBuf;

use crate::{
    foundation::core::{Fps, FrameIndex, MediaTime, RenderSize, Rgba8},
    media::item::{StillImage, VideoClip, VideoTrack},
    timeline::{anim::AnimationDescriptor, motion::Motion},
    transform::orientation::FittedTransform,
};

/// Base footage that sits under still images.
#[derive(Clone, Debug)]
pub enum FillerClip {
    /// Plain background color; needs no media.
    Solid,
    /// Looping-free base clip; must be at least as long as one photo.
    Clip(VideoClip),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Image,
    Video,
}

#[derive(Clone, Debug)]
pub enum SegmentSource {
    Image {
        image: StillImage,
        filler: FillerClip,
    },
    Video {
        source: PathBuf,
        track: VideoTrack,
    },
}

#[derive(Clone, Debug)]
pub struct TimelineSegment {
    /// Position of the originating item in the input list.
    pub index: usize,
    pub insert: MediaTime,
    pub duration: MediaTime,
    pub source: SegmentSource,
    pub transform: FittedTransform,
    /// Segment-relative unless marked absolute.
    pub animations: Vec<AnimationDescriptor>,
    pub motion: Option<Motion>,
}

impl TimelineSegment {
    pub fn kind(&self) -> SegmentKind {
        match self.source {
            SegmentSource::Image { .. } => SegmentKind::Image,
            SegmentSource::Video { .. } => SegmentKind::Video,
        }
    }

    pub fn end(&self) -> MediaTime {
        self.insert + self.duration
    }

    pub fn contains(&self, t: MediaTime) -> bool {
        self.insert <= t && t < self.end()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The clip could not be opened or has no video stream.
    MissingVideoTrack,
    /// Zero-length clip or zero-sized image.
    EmptyDuration,
    /// A still was given but no filler was provided to the builder.
    MissingFiller,
    /// The filler clip is shorter than one photo.
    FillerTooShort,
    /// Placing the item would push the timeline past the representable range.
    TimelineOverflow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SkippedItem {
    pub index: usize,
    pub reason: SkipReason,
}

/// Ordered, gap-free sequence of segments. Read-only once built.
#[derive(Clone, Debug)]
pub struct Timeline {
    pub segments: Vec<TimelineSegment>,
    pub total_duration: MediaTime,
    pub skipped: Vec<SkippedItem>,
    pub size: RenderSize,
    pub fps: Fps,
    pub background: Rgba8,
}

impl Timeline {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_frames(&self) -> u64 {
        self.total_duration.frames_at(self.fps)
    }

    /// Segment presented at `t`, or `None` at and past the end.
    pub fn segment_at(&self, t: MediaTime) -> Option<&TimelineSegment> {
        let idx = self.segments.partition_point(|s| s.insert <= t);
        let seg = self.segments.get(idx.checked_sub(1)?)?;
        seg.contains(t).then_some(seg)
    }

    /// Output frames `[start, end)` that present `segment`.
    pub fn frame_range(&self, segment: &TimelineSegment) -> std::ops::Range<u64> {
        segment.insert.frames_at(self.fps)..segment.end().frames_at(self.fps)
    }

    pub fn frame_time(&self, frame: FrameIndex) -> MediaTime {
        MediaTime::from_frame(frame, self.fps)
    }

    /// Every segment starts where the previous one ends, and the sum matches the total.
    pub fn is_contiguous(&self) -> bool {
        let mut cursor = MediaTime::ZERO;
        for seg in &self.segments {
            if seg.insert != cursor {
                return false;
            }
            cursor += seg.duration;
        }
        cursor == self.total_duration
    }
}
