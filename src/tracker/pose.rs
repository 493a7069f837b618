//! Per-frame pose of an identity.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::tracker::geometry::{Color, Size};
use crate::tracker::matching::Detection;

/// Where an identity was (or is believed to be) at one frame.
///
/// `age == 1` means the position came from a detection assigned in this
/// frame; every frame without an assignment increments it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Center position in image coordinates (y grows downwards).
    pub position: Point2<f32>,
    /// Orientation in radians. NaN when no orientation was ever measured.
    pub orientation: f32,
    /// Extent of the detection the position came from.
    pub size: Size,
    /// Display color, carried along untouched.
    pub color: Color,
    /// Frames since a detection was last assigned (>= 1).
    pub age: u32,
    /// Whether `orientation` is a confidently resolved heading rather than
    /// an undirected line orientation.
    pub heading_locked: bool,
}

impl Pose {
    pub fn new(position: Point2<f32>, orientation: f32, size: Size, color: Color) -> Self {
        Self {
            position,
            orientation,
            size,
            color,
            age: 1,
            heading_locked: false,
        }
    }

    /// Fresh pose built from a detection, orientation converted to radians.
    pub fn from_detection(detection: &Detection, color: Color) -> Self {
        Self::new(detection.center, detection.angle_rad(), detection.size, color)
    }

    /// Record a frame without an assignment.
    pub fn set_next_position_unknown(&mut self) {
        self.age = self.age.saturating_add(1);
    }

    /// The orientation usable as a heading, if one has been locked.
    pub fn confident_heading(&self) -> Option<f32> {
        (self.heading_locked && self.orientation.is_finite()).then_some(self.orientation)
    }

    /// A copy describing the next frame with no detection assigned.
    pub fn unknown_successor(&self) -> Self {
        let mut next = *self;
        next.set_next_position_unknown();
        next
    }

    pub fn with_heading(mut self, heading: f32, locked: bool) -> Self {
        self.orientation = heading;
        self.heading_locked = locked;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_lifecycle() {
        let det = Detection::new(3.0, 4.0, 90.0, 10.0, 5.0);
        let mut pose = Pose::from_detection(&det, Color::default());
        assert_eq!(pose.age, 1);
        assert!((pose.orientation - std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        pose.set_next_position_unknown();
        pose.set_next_position_unknown();
        assert_eq!(pose.age, 3);
        assert_eq!(pose.position, Point2::new(3.0, 4.0));
    }

    #[test]
    fn test_unknown_successor_keeps_lock() {
        let pose = Pose::new(Point2::origin(), 1.0, Size::default(), Color::default())
            .with_heading(1.0, true);
        let next = pose.unknown_successor();
        assert_eq!(next.age, 2);
        assert_eq!(next.confident_heading(), Some(1.0));
        assert_eq!(next.position, pose.position);
    }

    #[test]
    fn test_unlocked_pose_has_no_heading() {
        let pose = Pose::new(Point2::origin(), 1.0, Size::default(), Color::default());
        assert_eq!(pose.confident_heading(), None);
    }
}
