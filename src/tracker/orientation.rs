//! Heading disambiguation and smoothing for freshly assigned detections.
//!
//! A detector only reports a line orientation: the object may face either
//! way along it. The corrector picks the direction that agrees with the
//! identity's recent motion (or its last locked heading), then damps
//! implausible jumps against the locked heading.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::tracker::config::MotionConfig;
use crate::tracker::geometry::{angle_difference, normalize_angle};
use crate::tracker::identity::Tracked;
use crate::tracker::matching::Detection;
use crate::tracker::motion::estimate_heading;

/// Deviation from the locked heading beyond which a measurement is damped.
const MAX_UNDAMPED_DEVIATION: f32 = 0.2 * PI;

/// Share of an over-large deviation that is still applied.
const DAMPED_STEP: f32 = 0.1;

/// Maximum disagreement with the motion estimate for a first lock.
const FIRST_LOCK_TOLERANCE: f32 = FRAC_PI_4;

/// Outcome of a heading correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingCorrection {
    /// Corrected heading in radians, in `[0, 2π)` when a correction happened.
    pub heading: f32,
    /// Whether the heading may be locked.
    pub confident: bool,
}

/// Resolve and smooth the heading of `detection`, assigned to `identity`
/// for the frame after `frame`.
///
/// On success the detection's angle is overwritten with the corrected
/// heading. Without any reference heading the detection is left untouched
/// and the raw orientation is returned as not confident.
pub fn correct_heading<T: Tracked + ?Sized>(
    detection: &mut Detection,
    identity: &T,
    frame: u64,
    motion: &MotionConfig,
) -> HeadingCorrection {
    let raw = detection.angle_rad();
    let estimate = estimate_heading(identity, frame, motion).map(|e| e.heading);
    let last_confident = identity
        .latest_pose_at_or_before(frame)
        .and_then(|(_, pose)| pose.confident_heading());

    let Some(reference) = estimate.or(last_confident) else {
        return HeadingCorrection {
            heading: raw,
            confident: false,
        };
    };

    // nothing measured: take the reference as is
    if !raw.is_finite() {
        detection.set_angle_rad(reference);
        return HeadingCorrection {
            heading: reference,
            confident: false,
        };
    }

    let mut proposed = raw;
    if angle_difference(proposed, reference).abs() > FRAC_PI_2 {
        proposed += PI;
    }

    match (last_confident, estimate) {
        (Some(last), _) => {
            let deviation = angle_difference(last, proposed);
            if deviation.abs() > MAX_UNDAMPED_DEVIATION {
                proposed = if raw == 0.0 {
                    // a zero angle this far off is most likely a non-measurement
                    last
                } else {
                    last - DAMPED_STEP * deviation
                };
            }
        }
        (None, Some(estimated)) => proposed = estimated,
        (None, None) => {}
    }

    let heading = normalize_angle(proposed);
    detection.set_angle_rad(heading);

    let confident = last_confident.is_some()
        || estimate.is_some_and(|e| angle_difference(heading, e).abs() < FIRST_LOCK_TOLERANCE);

    HeadingCorrection { heading, confident }
}
