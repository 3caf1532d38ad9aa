//! Orientation correction and frame fitting for source media.
//!
//! Sources carry an intrinsic orientation matrix (camera rotation metadata). Resolving maps the
//! source's natural, unrotated pixel space into the render frame: upright the content, scale it
//! uniformly, then center it.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::foundation::core::{Affine, Point, Rect, RenderSize, Size, Vec2};

const MATRIX_EPS: f64 = 1e-6;

/// Canonical source orientation, derived once from the intrinsic transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Up,
    /// Rotated 90 degrees counter-clockwise (`[0,-1,1,0]`).
    Left,
    /// Rotated 90 degrees clockwise (`[0,1,-1,0]`).
    Right,
    /// Upside down (`[-1,0,0,-1]`).
    Down,
}

impl Orientation {
    /// Classify the linear part of `transform` against the four canonical matrices.
    ///
    /// Translation is ignored. Anything unrecognized is treated as `Up`.
    pub fn from_transform(transform: Affine) -> Self {
        let [a, b, c, d, _, _] = transform.as_coeffs();
        let is = |m: [f64; 4]| {
            (a - m[0]).abs() < MATRIX_EPS
                && (b - m[1]).abs() < MATRIX_EPS
                && (c - m[2]).abs() < MATRIX_EPS
                && (d - m[3]).abs() < MATRIX_EPS
        };

        if is([0.0, 1.0, -1.0, 0.0]) {
            Self::Right
        } else if is([0.0, -1.0, 1.0, 0.0]) {
            Self::Left
        } else if is([-1.0, 0.0, 0.0, -1.0]) {
            Self::Down
        } else {
            Self::Up
        }
    }

    /// Map a container rotation tag (degrees clockwise, as written by cameras) to an orientation.
    pub fn from_rotation_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) {
            90 => Self::Right,
            180 => Self::Down,
            270 => Self::Left,
            _ => Self::Up,
        }
    }

    pub fn is_portrait(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Canonical matrix for this orientation, without translation.
    pub fn matrix(self) -> Affine {
        match self {
            Self::Up => Affine::IDENTITY,
            Self::Left => Affine::new([0.0, -1.0, 1.0, 0.0, 0.0, 0.0]),
            Self::Right => Affine::new([0.0, 1.0, -1.0, 0.0, 0.0, 0.0]),
            Self::Down => Affine::new([-1.0, 0.0, 0.0, -1.0, 0.0, 0.0]),
        }
    }

    /// Size of the content once uprighted.
    pub fn display_size(self, natural: Size) -> Size {
        if self.is_portrait() {
            Size::new(natural.height, natural.width)
        } else {
            natural
        }
    }

    /// Transform taking natural pixel space to upright content anchored at the origin.
    pub fn upright(self, natural: Size) -> Affine {
        match self {
            Self::Up => Affine::IDENTITY,
            Self::Right => Affine::translate(Vec2::new(natural.height, 0.0)) * self.matrix(),
            Self::Left => Affine::translate(Vec2::new(0.0, natural.width)) * self.matrix(),
            // The canonical `Down` matrix does not survive scale+translate composition, so the
            // correction is an explicit half-turn applied first.
            Self::Down => {
                Affine::translate(Vec2::new(natural.width, natural.height)) * Affine::rotate(PI)
            }
        }
    }

    /// Rotation angle (radians, y-down screen space) this orientation applies.
    pub fn rotation_rad(self) -> f64 {
        match self {
            Self::Up => 0.0,
            Self::Right => FRAC_PI_2,
            Self::Left => -FRAC_PI_2,
            Self::Down => PI,
        }
    }
}

/// How the uprighted content is scaled into the render frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalePolicy {
    /// The shorter uprighted dimension matches the corresponding render dimension.
    #[default]
    ShorterSide,
    /// Whole content visible; letterboxed on one axis.
    Fit,
    /// Render frame fully covered; cropped on one axis.
    Fill,
}

/// Result of fitting a source into the render frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FittedTransform {
    pub orientation: Orientation,
    pub scale: f64,
    /// Top-left of the scaled, uprighted content in render space.
    pub offset: Vec2,
    /// Natural pixel space -> render space.
    pub affine: Affine,
}

impl FittedTransform {
    /// Natural space is render space.
    pub fn identity() -> Self {
        Self {
            orientation: Orientation::Up,
            scale: 1.0,
            offset: Vec2::ZERO,
            affine: Affine::IDENTITY,
        }
    }

    /// Bounding box of the source's natural rect once mapped into render space.
    pub fn content_bounds(&self, natural: Size) -> Rect {
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(natural.width, 0.0),
            Point::new(0.0, natural.height),
            Point::new(natural.width, natural.height),
        ];
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in corners {
            let q = self.affine * p;
            min.x = min.x.min(q.x);
            min.y = min.y.min(q.y);
            max.x = max.x.max(q.x);
            max.y = max.y.max(q.y);
        }
        Rect::from_points(min, max)
    }
}

/// Resolve the source-to-render transform for a clip, fitting the shorter uprighted side.
pub fn resolve_transform(natural: Size, intrinsic: Affine, render: RenderSize) -> FittedTransform {
    resolve_transform_with(natural, intrinsic, render, ScalePolicy::ShorterSide)
}

/// Resolve the source-to-render transform with an explicit scale policy.
///
/// Degenerate (zero-area) sources resolve to the identity with unit scale.
pub fn resolve_transform_with(
    natural: Size,
    intrinsic: Affine,
    render: RenderSize,
    policy: ScalePolicy,
) -> FittedTransform {
    let orientation = Orientation::from_transform(intrinsic);
    let display = orientation.display_size(natural);
    if display.width <= 0.0 || display.height <= 0.0 {
        return FittedTransform {
            orientation,
            ..FittedTransform::identity()
        };
    }

    let render_w = f64::from(render.width);
    let render_h = f64::from(render.height);
    let sx = render_w / display.width;
    let sy = render_h / display.height;
    let scale = match policy {
        ScalePolicy::ShorterSide => {
            if display.height <= display.width {
                sy
            } else {
                sx
            }
        }
        ScalePolicy::Fit => sx.min(sy),
        ScalePolicy::Fill => sx.max(sy),
    };

    let offset = Vec2::new(
        render_w / 2.0 - display.width * scale / 2.0,
        render_h / 2.0 - display.height * scale / 2.0,
    );
    let affine =
        Affine::translate(offset) * Affine::scale(scale) * orientation.upright(natural);

    FittedTransform {
        orientation,
        scale,
        offset,
        affine,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/orientation.rs"]
mod tests;
