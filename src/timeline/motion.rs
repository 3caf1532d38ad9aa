use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    foundation::core::{MediaTime, RenderSize, Vec2},
    timeline::anim::{AnimationDescriptor, Ease},
};

const ZOOM: f64 = 1.2;
/// Pan travel on each side of rest, as a fraction of the render dimension. Stays inside the
/// margin the `ZOOM` overscan provides.
const PAN_TRAVEL: f64 = 0.08;

/// Ken Burns style movement applied to a still image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
    PanDiagUp,
    PanDiagDown,
}

impl Motion {
    pub const ALL: [Motion; 6] = [
        Motion::ZoomIn,
        Motion::ZoomOut,
        Motion::PanLeft,
        Motion::PanRight,
        Motion::PanDiagUp,
        Motion::PanDiagDown,
    ];

    /// Descriptors spanning `[0, duration)` of the owning segment.
    pub fn descriptors(self, duration: MediaTime, render: RenderSize) -> Vec<AnimationDescriptor> {
        let dx = f64::from(render.width) * PAN_TRAVEL;
        let dy = f64::from(render.height) * PAN_TRAVEL;
        let at = MediaTime::ZERO;
        let pan = |from: Vec2, to: Vec2| {
            vec![
                AnimationDescriptor::scale(ZOOM, ZOOM, at, duration),
                AnimationDescriptor::position(from, to, at, duration).with_ease(Ease::InOutQuad),
            ]
        };
        match self {
            Self::ZoomIn => {
                vec![AnimationDescriptor::scale(1.0, ZOOM, at, duration).with_ease(Ease::OutQuad)]
            }
            Self::ZoomOut => {
                vec![AnimationDescriptor::scale(ZOOM, 1.0, at, duration).with_ease(Ease::OutQuad)]
            }
            Self::PanLeft => pan(Vec2::new(dx, 0.0), Vec2::new(-dx, 0.0)),
            Self::PanRight => pan(Vec2::new(-dx, 0.0), Vec2::new(dx, 0.0)),
            Self::PanDiagUp => pan(Vec2::new(-dx, dy), Vec2::new(dx, -dy)),
            Self::PanDiagDown => pan(Vec2::new(-dx, -dy), Vec2::new(dx, dy)),
        }
    }
}

/// Supplies the motion for each placed still, in order.
pub trait MotionSource: Send {
    fn next_motion(&mut self) -> Motion;
}

impl<M: MotionSource + ?Sized> MotionSource for Box<M> {
    fn next_motion(&mut self) -> Motion {
        (**self).next_motion()
    }
}

/// Uniform choice over [`Motion::ALL`] from a seeded generator; equal seeds give equal sequences.
#[derive(Clone, Debug)]
pub struct SeededMotions {
    rng: StdRng,
}

impl SeededMotions {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl MotionSource for SeededMotions {
    fn next_motion(&mut self) -> Motion {
        Motion::ALL[self.rng.gen_range(0..Motion::ALL.len())]
    }
}

/// Fixed, repeating sequence.
#[derive(Clone, Debug)]
pub struct MotionSequence {
    motions: Vec<Motion>,
    next: usize,
}

impl MotionSequence {
    /// An empty list behaves like `[ZoomIn]`.
    pub fn new(motions: impl Into<Vec<Motion>>) -> Self {
        let mut motions = motions.into();
        if motions.is_empty() {
            motions.push(Motion::ZoomIn);
        }
        Self { motions, next: 0 }
    }
}

impl MotionSource for MotionSequence {
    fn next_motion(&mut self) -> Motion {
        let m = self.motions[self.next % self.motions.len()];
        self.next = self.next.wrapping_add(1);
        m
    }
}
