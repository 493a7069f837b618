//! Identity tracking for many similar-looking objects moving in a 2D scene.
//!
//! Each frame, oriented detections (center, line orientation, size) are
//! assigned to a fixed pool of confirmed identities with a conflict-aware
//! greedy matcher. Leftover detections go through a probation pool of
//! candidates that are promoted once they have been seen often enough.
//!
//! ```
//! use swarmtrack_rs::{Detection, IdentityTracker, TrackerConfig};
//!
//! let mut tracker = IdentityTracker::new(TrackerConfig::default()).unwrap();
//! let report = tracker.update(vec![Detection::new(120.0, 80.0, 35.0, 12.0, 4.0)]);
//! assert_eq!(report.spawned.len(), 1);
//! ```

pub mod integration;
pub mod tracker;

pub use integration::{DetectionBuilder, DetectionSource, IntoDetections, TrackerPipeline};
pub use tracker::{
    Assignment, Candidate, CandidateState, ConfigError, Detection, FrameReport, IdentityTracker,
    MatchOutcome, Pose, Track, TrackerConfig, Tracked,
};
