//! Matching utilities for identity assignment.

use nalgebra::Point2;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::tracker::config::Calibration;
use crate::tracker::geometry::Size;
use crate::tracker::likelihood::{Affinity, identity_likelihood};
use crate::tracker::pose::Pose;

/// Detection input for the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Center of the fitted ellipse
    pub center: Point2<f32>,
    /// Line orientation in degrees, NaN when nothing was measured
    pub angle_deg: f32,
    /// Full axis lengths of the fitted ellipse
    pub size: Size,
}

impl Detection {
    pub fn new(x: f32, y: f32, angle_deg: f32, width: f32, height: f32) -> Self {
        Self {
            center: Point2::new(x, y),
            angle_deg,
            size: Size::new(width, height),
        }
    }

    pub fn from_parts(center: Point2<f32>, angle_deg: f32, size: Size) -> Self {
        Self {
            center,
            angle_deg,
            size,
        }
    }

    #[inline]
    pub fn angle_rad(&self) -> f32 {
        self.angle_deg.to_radians()
    }

    /// Overwrite the orientation with a heading given in radians.
    #[inline]
    pub fn set_angle_rad(&mut self, angle: f32) {
        self.angle_deg = angle.to_degrees();
    }
}

/// Result of best-match selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    /// Index of the winning entry
    pub index: usize,
    /// Raw likelihood of the winner
    pub score: f32,
    /// Margin over the runner-up, rescaled to [0, 1]; the raw score when
    /// there was no runner-up
    pub confidence: f32,
}

/// Pick the highest scoring entry out of `(index, score)` pairs.
///
/// Ties keep the earlier entry.
pub fn best_of<I>(scored: I) -> Option<BestMatch>
where
    I: IntoIterator<Item = (usize, f32)>,
{
    let mut best: Option<(usize, f32)> = None;
    let mut second: Option<(usize, f32)> = None;

    for (index, score) in scored {
        let score = if score.is_finite() { score } else { 0.0 };
        match best {
            Some((_, best_score)) if score <= best_score => {
                if second.is_none_or(|(_, second_score)| score > second_score) {
                    second = Some((index, score));
                }
            }
            _ => {
                second = best;
                best = Some((index, score));
            }
        }
    }

    let (index, score) = best?;
    let confidence = match second {
        Some((_, second_score)) => {
            let share = score / (score + second_score);
            let rescaled = 2.0 * (share - 0.5);
            if rescaled.is_finite() { rescaled } else { 0.0 }
        }
        None => score,
    };

    Some(BestMatch {
        index,
        score,
        confidence,
    })
}

/// Best entry among `(index, affinity)` pairs that lie within `gating_radius`.
///
/// A NaN distance never passes a gate.
pub fn gated_best<I>(entries: I, gating_radius: Option<f32>) -> Option<BestMatch>
where
    I: IntoIterator<Item = (usize, Affinity)>,
{
    best_of(entries.into_iter().filter_map(|(index, affinity)| {
        let admitted = gating_radius.is_none_or(|radius| affinity.distance <= radius);
        admitted.then_some((index, affinity.score))
    }))
}

/// Select the detection most likely to belong to `query`.
///
/// Detections farther away than `gating_radius` are not considered.
pub fn select_best(
    query: &Pose,
    detections: &[Detection],
    gating_radius: Option<f32>,
    calibration: &Calibration,
) -> Option<BestMatch> {
    gated_best(
        detections
            .iter()
            .enumerate()
            .map(|(j, det)| (j, identity_likelihood(query, det, calibration))),
        gating_radius,
    )
}

/// Pairwise affinities between expected poses (rows) and detections (columns).
#[derive(Debug, Clone)]
pub struct AffinityTable {
    pub scores: Array2<f32>,
    pub distances: Array2<f32>,
}

impl AffinityTable {
    pub fn compute(poses: &[Pose], detections: &[Detection], calibration: &Calibration) -> Self {
        let mut scores = Array2::zeros((poses.len(), detections.len()));
        let mut distances = Array2::zeros((poses.len(), detections.len()));
        for (i, pose) in poses.iter().enumerate() {
            for (j, det) in detections.iter().enumerate() {
                let affinity = identity_likelihood(pose, det, calibration);
                scores[[i, j]] = affinity.score;
                distances[[i, j]] = affinity.distance;
            }
        }
        Self { scores, distances }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.scores.dim()
    }

    #[inline]
    pub fn score(&self, row: usize, col: usize) -> f32 {
        self.scores[[row, col]]
    }

    #[inline]
    pub fn distance(&self, row: usize, col: usize) -> f32 {
        self.distances[[row, col]]
    }

    #[inline]
    pub fn affinity(&self, row: usize, col: usize) -> Affinity {
        Affinity {
            score: self.score(row, col),
            distance: self.distance(row, col),
        }
    }

    /// Best column of `row` among those `available` and within `gating_radius`.
    pub fn best_in_row<F>(
        &self,
        row: usize,
        gating_radius: Option<f32>,
        available: F,
    ) -> Option<BestMatch>
    where
        F: Fn(usize) -> bool,
    {
        let (_, cols) = self.dim();
        gated_best(
            (0..cols)
                .filter(|&col| available(col))
                .map(|col| (col, self.affinity(row, col))),
            gating_radius,
        )
    }
}
