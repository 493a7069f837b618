//! Tracker configuration and the calibration derived from it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Relative likelihood assigned to a displacement equal to the average speed.
const AVERAGE_SPEED_LIKELIHOOD: f64 = 0.66;

/// Fixed spread of the orientation term in radians.
const ANGLE_SIGMA: f64 = 10.0 * std::f64::consts::PI / 2.0 * 0.05;

/// Errors reported when a configuration cannot drive the tracker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("average speed must be finite and positive, got {0}")]
    InvalidAverageSpeed(f32),
    #[error("angle importance must lie in [0, 1], got {0}")]
    InvalidAngleImportance(f32),
    #[error("promotion threshold must be at least 1, got {0}")]
    InvalidPromotionThreshold(i32),
    #[error("candidate miss penalty must not be negative, got {0}")]
    InvalidMissPenalty(i32),
    #[error("smoothing window must be at least 1")]
    EmptySmoothingWindow,
    #[error(
        "heading falloff must lie in (0, 1) with a margin below 1, \
         got falloff {falloff} margin {margin}"
    )]
    InvalidFalloff { falloff: f32, margin: f32 },
    #[error(
        "heading displacement thresholds must satisfy 0 <= min <= full and full > 0, \
         got min {min} full {full}"
    )]
    InvalidHeadingCalibration { min: f32, full: f32 },
    #[error("gating {0} must be finite and positive")]
    InvalidGating(&'static str),
}

/// How far a detection may lie from an identity's expected position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Gating {
    /// `multiple * average_speed * age`, optionally capped.
    AgeScaled { multiple: f32, cap: Option<f32> },
    /// The same radius regardless of how long the identity went unseen.
    Fixed { radius: f32 },
}

impl Default for Gating {
    fn default() -> Self {
        Gating::AgeScaled {
            multiple: 3.0,
            cap: None,
        }
    }
}

impl Gating {
    /// Gating radius for an identity whose last known position is `age` frames old.
    pub fn radius(&self, average_speed: f32, age: u32) -> f32 {
        match *self {
            Gating::AgeScaled { multiple, cap } => {
                let radius = multiple * average_speed * age.max(1) as f32;
                match cap {
                    Some(cap) => radius.min(cap),
                    None => radius,
                }
            }
            Gating::Fixed { radius } => radius,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        match *self {
            Gating::AgeScaled { multiple, cap } => {
                if !positive(multiple) {
                    return Err(ConfigError::InvalidGating("multiple"));
                }
                if cap.is_some_and(|c| !positive(c)) {
                    return Err(ConfigError::InvalidGating("cap"));
                }
            }
            Gating::Fixed { radius } => {
                if !positive(radius) {
                    return Err(ConfigError::InvalidGating("radius"));
                }
            }
        }
        Ok(())
    }
}

/// Parameters of the motion predictor and the heading estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Frame-to-frame displacements averaged for the speed estimate.
    pub smoothing_window: usize,
    /// Weight multiplier applied per step back in time.
    pub falloff: f32,
    /// Accumulation stops once the weight drops below this.
    pub falloff_margin: f32,
    /// Averaged displacement (px/frame) below which no heading is reported.
    pub min_heading_displacement: f32,
    /// Averaged displacement (px/frame) at which heading confidence saturates.
    pub full_confidence_displacement: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 3,
            falloff: 0.9,
            falloff_margin: 0.4,
            min_heading_displacement: 0.1,
            full_confidence_displacement: 0.3,
        }
    }
}

/// Configuration for the identity tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Number of confirmed tracks to maintain. Probation stops once reached.
    pub target_tracks: usize,
    /// Candidate score at which a candidate becomes a track.
    pub promotion_threshold: i32,
    /// Expected displacement per frame, in pixels.
    pub average_speed: f32,
    /// Weight of the orientation term in the identity likelihood.
    pub angle_importance: f32,
    pub gating: Gating,
    /// Score removed from a candidate that obtains no detection in a frame.
    pub candidate_miss_penalty: i32,
    pub motion: MotionConfig,
    /// Seed for the display colors handed to new identities.
    pub color_seed: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            target_tracks: 5,
            promotion_threshold: 30,
            average_speed: 5.0,
            angle_importance: 0.2,
            gating: Gating::default(),
            candidate_miss_penalty: 0,
            motion: MotionConfig::default(),
            color_seed: 12345,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.average_speed.is_finite() && self.average_speed > 0.0) {
            return Err(ConfigError::InvalidAverageSpeed(self.average_speed));
        }
        if !(0.0..=1.0).contains(&self.angle_importance) {
            return Err(ConfigError::InvalidAngleImportance(self.angle_importance));
        }
        if self.promotion_threshold < 1 {
            return Err(ConfigError::InvalidPromotionThreshold(
                self.promotion_threshold,
            ));
        }
        if self.candidate_miss_penalty < 0 {
            return Err(ConfigError::InvalidMissPenalty(self.candidate_miss_penalty));
        }
        let motion = &self.motion;
        if motion.smoothing_window == 0 {
            return Err(ConfigError::EmptySmoothingWindow);
        }
        if !(motion.falloff > 0.0 && motion.falloff < 1.0 && motion.falloff_margin < 1.0) {
            return Err(ConfigError::InvalidFalloff {
                falloff: motion.falloff,
                margin: motion.falloff_margin,
            });
        }
        if !(motion.min_heading_displacement >= 0.0
            && motion.full_confidence_displacement > 0.0
            && motion.min_heading_displacement <= motion.full_confidence_displacement)
        {
            return Err(ConfigError::InvalidHeadingCalibration {
                min: motion.min_heading_displacement,
                full: motion.full_confidence_displacement,
            });
        }
        self.gating.validate()
    }
}

/// Numeric constants derived from a validated [`TrackerConfig`].
///
/// Built once per configuration and passed by reference into the scorer and
/// the predictor. Replacing it happens only between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub average_speed: f32,
    pub angle_importance: f32,
    pub distance_sigma: f64,
    pub angle_sigma: f64,
    pub gating: Gating,
    pub motion: MotionConfig,
}

impl Calibration {
    pub fn from_config(config: &TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::derive(config))
    }

    fn derive(config: &TrackerConfig) -> Self {
        let speed = config.average_speed as f64;
        Self {
            average_speed: config.average_speed,
            angle_importance: config.angle_importance,
            distance_sigma: distance_sigma(speed),
            angle_sigma: ANGLE_SIGMA,
            gating: config.gating,
            motion: config.motion.clone(),
        }
    }

    /// Gating radius for an identity whose last known position is `age` frames old.
    pub fn gating_radius(&self, age: u32) -> f32 {
        self.gating.radius(self.average_speed, age)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::derive(&TrackerConfig::default())
    }
}

/// Sigma such that a displacement of `average_speed` scores ~66% of a perfect match.
pub fn distance_sigma(average_speed: f64) -> f64 {
    (-(average_speed * average_speed / 2.0) / AVERAGE_SPEED_LIKELIHOOD.ln()).sqrt()
}
