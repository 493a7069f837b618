//! Motion prediction from an identity's recent pose history.
//!
//! Two estimates come out of the history:
//! - a point extrapolation of the next position, driven by the average
//!   recent speed and the identity's locked heading, and
//! - an independent heading estimate from a falloff-weighted average of the
//!   most recent per-frame displacements.
//!
//! Both need a minimum run of consecutive frames and report `None` rather
//! than a low-quality guess when it is missing. Image coordinates have y
//! growing downwards, so headings are measured against `-y`.

use nalgebra::{Point2, Vector2};

use crate::tracker::config::{Calibration, MotionConfig};
use crate::tracker::identity::Tracked;
use crate::tracker::pose::Pose;

/// Consecutive frames, ending at the reference frame, needed to extrapolate.
pub const MIN_PREDICTION_FRAMES: u64 = 4;

/// Consecutive frames, ending at the reference frame, needed for a heading.
pub const MIN_HEADING_FRAMES: u64 = 3;

/// Movement direction estimated from recent displacement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingEstimate {
    /// Radians, counter-clockwise from +x with y pointing up.
    pub heading: f32,
    /// Grows with the averaged displacement, capped at 1.
    pub confidence: f32,
}

fn has_consecutive<T: Tracked + ?Sized>(identity: &T, frame: u64, count: u64) -> bool {
    frame + 1 >= count && (0..count).all(|k| identity.has_pose_at(frame - k))
}

/// Heading of a displacement in image coordinates.
#[inline]
pub fn heading_of(displacement: &Vector2<f32>) -> f32 {
    (-displacement.y).atan2(displacement.x)
}

/// Unit step along `heading` in image coordinates.
#[inline]
pub fn step_along(heading: f32) -> Vector2<f32> {
    Vector2::new(heading.cos(), -heading.sin())
}

/// Average frame-to-frame displacement magnitude over the last `smoothing_window` steps.
///
/// The window shrinks to whatever consecutive history is available.
pub fn current_speed<T: Tracked + ?Sized>(
    identity: &T,
    frame: u64,
    smoothing_window: usize,
) -> Option<f32> {
    if !has_consecutive(identity, frame, MIN_PREDICTION_FRAMES) {
        return None;
    }

    let mut total = 0.0f32;
    let mut steps = 0usize;
    let mut i = frame;
    while steps < smoothing_window && i > 0 {
        let (Some(previous), Some(current)) = (identity.pose_at(i - 1), identity.pose_at(i)) else {
            break;
        };
        total += nalgebra::distance(&previous.position, &current.position);
        steps += 1;
        i -= 1;
    }

    if steps == 0 {
        return None;
    }
    let speed = total / steps as f32;
    speed.is_finite().then_some(speed)
}

/// Extrapolate the pose at `frame + 1` from the history up to `frame`.
///
/// Needs a locked heading at `frame`; everything except the position is
/// carried over from the pose at `frame`.
pub fn predict_next_pose<T: Tracked + ?Sized>(
    identity: &T,
    frame: u64,
    calibration: &Calibration,
) -> Option<Pose> {
    let current = identity.pose_at(frame)?;
    let heading = current.confident_heading()?;
    let speed = current_speed(identity, frame, calibration.motion.smoothing_window)?;

    let position: Point2<f32> = current.position + step_along(heading) * speed;
    if !(position.x.is_finite() && position.y.is_finite()) {
        return None;
    }
    Some(Pose {
        position,
        ..*current
    })
}

/// The pose an identity is matched from: the prediction when one exists,
/// otherwise the latest known pose.
pub fn expected_pose<T: Tracked + ?Sized>(
    identity: &T,
    frame: u64,
    calibration: &Calibration,
) -> Option<Pose> {
    predict_next_pose(identity, frame, calibration)
        .or_else(|| identity.latest_pose_at_or_before(frame).map(|(_, p)| *p))
}

/// Estimate the movement direction at `frame` from weighted recent displacements.
///
/// The k-th most recent displacement is weighted `falloff^k`; accumulation
/// stops once the weight falls below `falloff_margin`.
pub fn estimate_heading<T: Tracked + ?Sized>(
    identity: &T,
    frame: u64,
    motion: &MotionConfig,
) -> Option<HeadingEstimate> {
    if !has_consecutive(identity, frame, MIN_HEADING_FRAMES) {
        return None;
    }
    let first = identity.first_frame()?;

    let mut next = identity.pose_at(frame)?.position;
    let mut derivative = Vector2::<f32>::zeros();
    let mut weight = 1.0f32;
    let mut weight_sum = 0.0f32;

    for i in (first..frame).rev() {
        let Some(pose) = identity.pose_at(i) else {
            continue;
        };
        derivative += (next - pose.position) * weight;
        weight_sum += weight;

        weight *= motion.falloff;
        if weight < motion.falloff_margin {
            break;
        }
        next = pose.position;
    }

    if weight_sum > 0.0 {
        derivative /= weight_sum;
    }

    let displacement = derivative.norm();
    // also rejects NaN
    if !(displacement >= motion.min_heading_displacement) {
        return None;
    }

    Some(HeadingEstimate {
        heading: heading_of(&derivative),
        confidence: (displacement / motion.full_confidence_displacement).min(1.0),
    })
}
