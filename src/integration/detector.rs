//! Trait for upstream object detectors.

use crate::tracker::Detection;

/// Trait for upstream object detectors.
///
/// Implement this trait to connect any segmentation or blob detector to the
/// tracker. Detections only need a center, a line orientation and a size.
///
/// # Example
///
/// ```ignore
/// use swarmtrack_rs::{DetectionSource, Detection};
///
/// struct BlobDetector {
///     // background model, thresholds...
/// }
///
/// impl DetectionSource for BlobDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, input: &[u8], width: u32, height: u32) -> Result<Vec<Detection>, Self::Error> {
///         // Segment the frame and fit an ellipse per blob
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error;

    /// Run detection on raw image data.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes (format depends on implementation)
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error>;
}

/// Helper trait for converting detector-specific outputs to `Detection`.
pub trait IntoDetections {
    /// Convert the output into a vector of detections.
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

/// Rows of `[x, y, angle_deg, width, height]`.
impl IntoDetections for Vec<[f32; 5]> {
    fn into_detections(self) -> Vec<Detection> {
        self.into_iter()
            .map(|[x, y, angle, w, h]| Detection::new(x, y, angle, w, h))
            .collect()
    }
}
