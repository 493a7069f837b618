//! Integration module for connecting object detectors with the tracker.
//!
//! This module provides traits and utilities for feeding the output of a
//! segmentation or blob detector into [`IdentityTracker`](crate::tracker::IdentityTracker).

mod builder;
mod detector;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::TrackerPipeline;
