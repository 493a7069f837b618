//! Planar geometry helpers shared by the scorer, predictor and corrector.

use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

/// Extent of a detection or pose (full width and height of its fitted ellipse).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[inline]
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Display color attached to an identity. The engine never reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    #[inline]
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Signed difference `alpha - beta` wrapped into `[-π, π]`.
///
/// Non-finite input yields NaN, which callers treat as "no difference known".
pub fn angle_difference(alpha: f32, beta: f32) -> f32 {
    let difference = alpha - beta;
    if !difference.is_finite() {
        return f32::NAN;
    }
    let mut wrapped = (difference + PI).rem_euclid(TAU) - PI;
    // rem_euclid may round up to TAU for tiny negative inputs
    if wrapped > PI {
        wrapped -= TAU;
    } else if wrapped < -PI {
        wrapped += TAU;
    }
    wrapped
}

/// Wrap an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Absolute angular distance between a heading and a line orientation,
/// ignoring which way along the line the object faces.
pub fn undirected_angle_distance(heading: f32, line: f32) -> f32 {
    angle_difference(heading, line)
        .abs()
        .min(angle_difference(heading + PI, line).abs())
}
