//! Declarative, time-keyed property animations.
//!
//! A descriptor is data: the layered renderer samples it at arbitrary instants, the timeline
//! builder only decides which descriptors a segment gets.

use crate::foundation::core::{MediaTime, Vec2};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InOutCubic,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }
}

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimatedProperty {
    Opacity,
    Scale,
    Position,
}

/// Start and end values of one animated property.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyRamp {
    /// Always within `[0,1]`; enforced by [`AnimationDescriptor::opacity`].
    Opacity { from: f64, to: f64 },
    /// Uniform scale about the render center.
    Scale { from: f64, to: f64 },
    /// Offset from the resting position, in render pixels.
    Position { from: Vec2, to: Vec2 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    /// `begin` counts from the owning segment's insert time.
    #[default]
    Segment,
    /// `begin` counts from the start of the timeline.
    Absolute,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationDescriptor {
    pub ramp: PropertyRamp,
    pub begin: MediaTime,
    pub duration: MediaTime,
    pub ease: Ease,
    pub time_base: TimeBase,
}

impl AnimationDescriptor {
    pub fn opacity(from: f64, to: f64, begin: MediaTime, duration: MediaTime) -> Self {
        Self::new(
            PropertyRamp::Opacity {
                from: clamp_unit(from),
                to: clamp_unit(to),
            },
            begin,
            duration,
        )
    }

    pub fn scale(from: f64, to: f64, begin: MediaTime, duration: MediaTime) -> Self {
        Self::new(PropertyRamp::Scale { from, to }, begin, duration)
    }

    pub fn position(from: Vec2, to: Vec2, begin: MediaTime, duration: MediaTime) -> Self {
        Self::new(PropertyRamp::Position { from, to }, begin, duration)
    }

    fn new(ramp: PropertyRamp, begin: MediaTime, duration: MediaTime) -> Self {
        Self {
            ramp,
            begin,
            duration,
            ease: Ease::Linear,
            time_base: TimeBase::Segment,
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn property(&self) -> AnimatedProperty {
        match self.ramp {
            PropertyRamp::Opacity { .. } => AnimatedProperty::Opacity,
            PropertyRamp::Scale { .. } => AnimatedProperty::Scale,
            PropertyRamp::Position { .. } => AnimatedProperty::Position,
        }
    }

    pub fn end(&self) -> MediaTime {
        self.begin + self.duration
    }

    /// Eased progress at `t` (same time base as `begin`). Holds `0` before and `1` after.
    pub fn progress_at(&self, t: MediaTime) -> f64 {
        if t <= self.begin {
            return if self.duration.is_zero() && t == self.begin {
                1.0
            } else {
                0.0
            };
        }
        self.ease
            .apply(t.saturating_sub(self.begin).fraction_of(self.duration))
    }

    pub fn sample_at(&self, t: MediaTime) -> SampledValue {
        let p = self.progress_at(t);
        match self.ramp {
            PropertyRamp::Opacity { from, to } => {
                SampledValue::Opacity(clamp_unit(<f64 as Lerp>::lerp(&from, &to, p)))
            }
            PropertyRamp::Scale { from, to } => SampledValue::Scale(<f64 as Lerp>::lerp(&from, &to, p)),
            PropertyRamp::Position { from, to } => {
                SampledValue::Position(<Vec2 as Lerp>::lerp(&from, &to, p))
            }
        }
    }

    /// Rebase a segment-relative descriptor onto the timeline clock.
    pub fn to_absolute(self, insert: MediaTime) -> Self {
        match self.time_base {
            TimeBase::Absolute => self,
            TimeBase::Segment => Self {
                begin: self.begin + insert,
                time_base: TimeBase::Absolute,
                ..self
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SampledValue {
    Opacity(f64),
    Scale(f64),
    Position(Vec2),
}

/// Combined effect of every descriptor on one layer at one instant.
///
/// Opacities multiply, scales multiply, positions add.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerState {
    pub opacity: f64,
    pub scale: f64,
    pub position: Vec2,
}

impl Default for LayerState {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            scale: 1.0,
            position: Vec2::ZERO,
        }
    }
}

impl LayerState {
    pub fn sample<'a>(
        descriptors: impl IntoIterator<Item = &'a AnimationDescriptor>,
        t: MediaTime,
    ) -> Self {
        let mut state = Self::default();
        for d in descriptors {
            match d.sample_at(t) {
                SampledValue::Opacity(o) => state.opacity *= o,
                SampledValue::Scale(s) => state.scale *= s,
                SampledValue::Position(p) => state.position += p,
            }
        }
        state.opacity = clamp_unit(state.opacity);
        state
    }

    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0 && self.scale > 0.0
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/anim.rs"]
mod tests;
