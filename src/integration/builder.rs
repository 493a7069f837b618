//! Builder for creating Detection objects from various input formats.

use nalgebra::Point2;

use crate::tracker::{Detection, Size};

/// Builder for creating `Detection` objects from various input formats.
///
/// The orientation defaults to "not measured" (NaN), in which case the
/// tracker keeps the identity's own heading.
#[derive(Debug, Clone)]
pub struct DetectionBuilder {
    cx: f32,
    cy: f32,
    angle_deg: f32,
    width: f32,
    height: f32,
}

impl Default for DetectionBuilder {
    fn default() -> Self {
        Self {
            cx: 0.0,
            cy: 0.0,
            angle_deg: f32::NAN,
            width: 0.0,
            height: 0.0,
        }
    }
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the center in image coordinates.
    pub fn center(mut self, cx: f32, cy: f32) -> Self {
        self.cx = cx;
        self.cy = cy;
        self
    }

    /// Set the orientation of the object's long axis, in degrees.
    pub fn angle_deg(mut self, angle: f32) -> Self {
        self.angle_deg = angle;
        self
    }

    /// Set the orientation in radians.
    pub fn angle_rad(mut self, angle: f32) -> Self {
        self.angle_deg = angle.to_degrees();
        self
    }

    /// Set the extent along (width) and across (height) the long axis.
    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set everything from a fitted ellipse.
    ///
    /// Ellipse fitters report the rotation of the first axis; when the
    /// second axis is the longer one the orientation is turned by 90
    /// degrees so that `width` always runs along the long axis.
    pub fn ellipse(
        mut self,
        cx: f32,
        cy: f32,
        axis_a: f32,
        axis_b: f32,
        rotation_deg: f32,
    ) -> Self {
        self.cx = cx;
        self.cy = cy;
        if axis_b > axis_a {
            self.width = axis_b;
            self.height = axis_a;
            self.angle_deg = rotation_deg + 90.0;
        } else {
            self.width = axis_a;
            self.height = axis_b;
            self.angle_deg = rotation_deg;
        }
        self
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Detection {
        Detection::from_parts(
            Point2::new(self.cx, self.cy),
            self.angle_deg,
            Size::new(self.width, self.height),
        )
    }
}
