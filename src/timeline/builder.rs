use crate::{
    config::{RenderConfig, TransitionKind},
    foundation::core::MediaTime,
    media::item::{MediaItem, StillImage, VideoClip},
    timeline::{
        anim::AnimationDescriptor,
        model::{
            FillerClip, SegmentSource, SkipReason, SkippedItem, Timeline, TimelineSegment,
        },
        motion::{MotionSource, SeededMotions},
    },
    transform::orientation::{resolve_transform, resolve_transform_with},
};

/// Lays media items end to end and attaches per-segment transforms and animations.
///
/// Items that cannot be placed are recorded in [`Timeline::skipped`] and do not advance the
/// insert cursor.
pub struct TimelineBuilder<'a> {
    config: &'a RenderConfig,
    filler: Option<FillerClip>,
    motions: Box<dyn MotionSource + 'a>,
}

impl<'a> TimelineBuilder<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self {
            config,
            filler: None,
            motions: Box::new(SeededMotions::new(0)),
        }
    }

    pub fn with_filler(mut self, filler: FillerClip) -> Self {
        self.filler = Some(filler);
        self
    }

    pub fn with_optional_filler(mut self, filler: Option<FillerClip>) -> Self {
        self.filler = filler;
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_motions(SeededMotions::new(seed))
    }

    pub fn with_motions(mut self, motions: impl MotionSource + 'a) -> Self {
        self.motions = Box::new(motions);
        self
    }

    #[tracing::instrument(level = "debug", skip_all, fields(items = items.len()))]
    pub fn build(mut self, items: &[MediaItem]) -> Timeline {
        let mut segments: Vec<TimelineSegment> = Vec::with_capacity(items.len());
        let mut skipped = Vec::new();
        let mut cursor = MediaTime::ZERO;

        for (index, item) in items.iter().enumerate() {
            let placed = match item {
                MediaItem::VideoClip(clip) => self.place_video(index, clip, cursor),
                MediaItem::Image(image) => {
                    let first = segments.is_empty();
                    self.place_image(index, image, cursor, first)
                }
            };
            let placed = placed.and_then(|seg| match cursor.checked_add(seg.duration) {
                Some(end) => Ok((seg, end)),
                None => Err(SkipReason::TimelineOverflow),
            });
            match placed {
                Ok((seg, end)) => {
                    tracing::debug!(
                        index,
                        kind = ?seg.kind(),
                        insert = %seg.insert,
                        duration = %seg.duration,
                        motion = ?seg.motion,
                        "placed segment"
                    );
                    cursor = end;
                    segments.push(seg);
                }
                Err(reason) => {
                    tracing::warn!(index, ?reason, "skipping media item");
                    skipped.push(SkippedItem { index, reason });
                }
            }
        }

        if self.config.transition == TransitionKind::CrossFade
            && let Some((_, outgoing)) = segments.split_last_mut()
        {
            for seg in outgoing {
                let span = self.config.crossfade.min(seg.duration);
                if span.is_zero() {
                    continue;
                }
                seg.animations.push(AnimationDescriptor::opacity(
                    1.0,
                    0.0,
                    seg.duration.saturating_sub(span),
                    span,
                ));
            }
        }

        Timeline {
            segments,
            total_duration: cursor,
            skipped,
            size: self.config.size,
            fps: self.config.fps,
            background: self.config.background,
        }
    }

    fn place_video(
        &mut self,
        index: usize,
        clip: &VideoClip,
        insert: MediaTime,
    ) -> Result<TimelineSegment, SkipReason> {
        let track = clip.track().ok_or(SkipReason::MissingVideoTrack)?;
        if track.duration.is_zero() {
            return Err(SkipReason::EmptyDuration);
        }
        let transform = resolve_transform(track.natural_size, track.intrinsic, self.config.size);
        Ok(TimelineSegment {
            index,
            insert,
            duration: track.duration,
            source: SegmentSource::Video {
                source: clip.source().to_path_buf(),
                track: *track,
            },
            transform,
            animations: Vec::new(),
            motion: None,
        })
    }

    fn place_image(
        &mut self,
        index: usize,
        image: &StillImage,
        insert: MediaTime,
        first: bool,
    ) -> Result<TimelineSegment, SkipReason> {
        if image.is_empty() {
            return Err(SkipReason::EmptyDuration);
        }
        let duration = self.config.photo_duration;
        let filler = match &self.filler {
            None => return Err(SkipReason::MissingFiller),
            Some(FillerClip::Solid) => FillerClip::Solid,
            Some(FillerClip::Clip(clip)) => {
                let track = clip.track().ok_or(SkipReason::MissingFiller)?;
                if track.duration < duration {
                    return Err(SkipReason::FillerTooShort);
                }
                FillerClip::Clip(clip.clone())
            }
        };

        let transform = resolve_transform_with(
            image.natural_size(),
            image.intrinsic_transform(),
            self.config.size,
            self.config.scale_policy(),
        );

        let motion = self.motions.next_motion();
        let mut animations = motion.descriptors(duration, self.config.size);
        let fade = self.config.photo_fade.min(duration);
        if !fade.is_zero() {
            if !first {
                animations.push(AnimationDescriptor::opacity(0.0, 1.0, MediaTime::ZERO, fade));
            }
            animations.push(AnimationDescriptor::opacity(
                1.0,
                0.0,
                duration.saturating_sub(fade),
                fade,
            ));
        }

        Ok(TimelineSegment {
            index,
            insert,
            duration,
            source: SegmentSource::Image {
                image: image.clone(),
                filler,
            },
            transform,
            animations,
            motion: Some(motion),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/builder.rs"]
mod tests;
