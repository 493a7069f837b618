//! Identity likelihood between an expected pose and an observation.
//!
//! The score is a comparative affinity in `[0, 1]`, not a calibrated
//! probability: a weighted blend of an unnormalized Gaussian over the
//! positional offset and another over the undirected orientation offset.

use nalgebra::Point2;

use crate::tracker::config::Calibration;
use crate::tracker::geometry::undirected_angle_distance;
use crate::tracker::matching::Detection;
use crate::tracker::pose::Pose;

/// Score and Euclidean distance between an expected pose and an observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affinity {
    pub score: f32,
    pub distance: f32,
}

#[inline]
fn gaussian(sigma: f64, offset: f64) -> f64 {
    (-(offset * offset) / (2.0 * sigma * sigma)).exp()
}

#[inline]
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Blend a positional and an angular offset into a likelihood.
///
/// Both offsets enter only through their magnitude. Any term that degenerates
/// to NaN contributes zero.
pub fn likelihood_from_offsets(
    distance: f32,
    angle_offset: f32,
    angle_importance: f32,
    calibration: &Calibration,
) -> f32 {
    let importance = angle_importance.clamp(0.0, 1.0) as f64;
    let distance_term = finite_or_zero(gaussian(calibration.distance_sigma, distance.abs() as f64));
    let angle_term = finite_or_zero(gaussian(calibration.angle_sigma, angle_offset.abs() as f64));
    let score = (1.0 - importance) * distance_term + importance * angle_term;
    finite_or_zero(score).clamp(0.0, 1.0) as f32
}

/// Affinity between a heading at one position and a line orientation at another.
pub fn affinity_between(
    position: Point2<f32>,
    heading: f32,
    other_position: Point2<f32>,
    other_orientation: f32,
    calibration: &Calibration,
) -> Affinity {
    let distance = nalgebra::distance(&position, &other_position);
    let angle_offset = undirected_angle_distance(heading, other_orientation);
    Affinity {
        score: likelihood_from_offsets(
            distance,
            angle_offset,
            calibration.angle_importance,
            calibration,
        ),
        distance,
    }
}

/// Affinity of a detection to an identity's expected pose.
pub fn identity_likelihood(
    pose: &Pose,
    detection: &Detection,
    calibration: &Calibration,
) -> Affinity {
    affinity_between(
        pose.position,
        pose.orientation,
        detection.center,
        detection.angle_rad(),
        calibration,
    )
}
