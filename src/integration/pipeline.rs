//! TrackerPipeline for combining detection with tracking.

use crate::tracker::{ConfigError, FrameReport, IdentityTracker, TrackerConfig};

use super::DetectionSource;

/// Bundles a `DetectionSource` with an `IdentityTracker` to run end-to-end
/// tracking one frame at a time.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    tracker: IdentityTracker,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline with the given detector and tracker config.
    pub fn new(detector: D, config: TrackerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            detector,
            tracker: IdentityTracker::new(config)?,
        })
    }

    /// Create a new tracking pipeline with default tracker configuration.
    pub fn with_default_config(detector: D) -> Self {
        Self {
            detector,
            tracker: IdentityTracker::default(),
        }
    }

    /// Run detection on the input image and feed the result to the tracker.
    ///
    /// A detection error leaves the tracker untouched; the frame is not counted.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<FrameReport, D::Error> {
        let detections = self.detector.detect(input, width, height)?;
        Ok(self.tracker.update(detections))
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn tracker(&self) -> &IdentityTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut IdentityTracker {
        &mut self.tracker
    }
}
