use crate::foundation::error::{MontageError, MontageResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Timeline instant or duration, in integer microsecond ticks.
///
/// Integer ticks keep `insert + duration == next insert` exact no matter how many segments are
/// accumulated. Serialized as (fractional) seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct MediaTime(u64);

impl MediaTime {
    pub const ZERO: Self = Self(0);
    pub const TICKS_PER_SEC: u64 = 1_000_000;

    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * 1_000)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * Self::TICKS_PER_SEC)
    }

    pub fn from_secs_f64(secs: f64) -> MontageResult<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(MontageError::validation(format!(
                "time must be finite and >= 0 (got {secs})"
            )));
        }
        Ok(Self((secs * Self::TICKS_PER_SEC as f64).round() as u64))
    }

    pub const fn as_micros(self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / Self::TICKS_PER_SEC as f64
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Number of whole frames at `fps` that start before this instant.
    pub fn frames_at(self, fps: Fps) -> u64 {
        let num = u128::from(self.0) * u128::from(fps.num);
        let den = u128::from(fps.den) * u128::from(Self::TICKS_PER_SEC);
        (num / den) as u64
    }

    /// Presentation instant of `frame` at `fps`, rounded up to the next tick so that
    /// `from_frame(f).frames_at(fps) == f`.
    pub fn from_frame(frame: FrameIndex, fps: Fps) -> Self {
        let num = u128::from(frame.0) * u128::from(fps.den) * u128::from(Self::TICKS_PER_SEC);
        let den = u128::from(fps.num);
        Self(num.div_ceil(den) as u64)
    }

    /// Fraction of `span` covered by `self`, clamped to `[0,1]`. A zero span counts as complete.
    pub fn fraction_of(self, span: Self) -> f64 {
        if span.0 == 0 {
            return 1.0;
        }
        (self.0 as f64 / span.0 as f64).clamp(0.0, 1.0)
    }
}

impl std::ops::Add for MediaTime {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for MediaTime {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for MediaTime {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, t| acc + t)
    }
}

impl TryFrom<f64> for MediaTime {
    type Error = MontageError;

    fn try_from(secs: f64) -> MontageResult<Self> {
        Self::from_secs_f64(secs)
    }
}

impl From<MediaTime> for f64 {
    fn from(t: MediaTime) -> f64 {
        t.as_secs_f64()
    }
}

impl std::fmt::Display for MediaTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}s", self.as_secs_f64())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> MontageResult<Self> {
        if den == 0 {
            return Err(MontageError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(MontageError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub const fn integer(num: u32) -> Self {
        Self { num, den: 1 }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self::integer(60)
    }
}

/// Output frame size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

impl RenderSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn to_size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    pub fn byte_len_rgba8(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

impl Default for RenderSize {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_premul_array(self) -> [u8; 4] {
        use crate::foundation::math::mul_div255_u8;
        let a = u16::from(self.a);
        [
            mul_div255_u8(u16::from(self.r), a),
            mul_div255_u8(u16::from(self.g), a),
            mul_div255_u8(u16::from(self.b), a),
            self.a,
        ]
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::BLACK
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
