//! Conflict-aware greedy assignment of detections to identities.
//!
//! Each pass takes the first unresolved identity, lets it claim its best
//! gated detection, and then checks whether another unresolved identity has
//! a stronger claim on that detection. If so, the stronger claimant is
//! resolved first, recursively. A visited set carried through one chain
//! keeps an identity from becoming the active claimant twice, which bounds
//! the chain by the number of identities. Every pass resolves exactly one
//! identity, either with a detection or as unseen.
//!
//! The result is deterministic and local; it does not attempt a globally
//! optimal matching.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::tracker::config::Calibration;
use crate::tracker::identity::Tracked;
use crate::tracker::matching::{AffinityTable, Detection, best_of};
use crate::tracker::motion::expected_pose;
use crate::tracker::orientation::correct_heading;
use crate::tracker::pose::Pose;

/// What happened to one identity in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome {
    /// A detection was assigned and recorded as `pose`.
    Matched {
        pose: Pose,
        /// Margin of the chosen detection over the runner-up.
        confidence: f32,
        /// Whether the heading correction was confident.
        heading_confident: bool,
    },
    /// No plausible detection; the last pose was carried forward, one frame older.
    Unseen,
}

/// Per-identity result of a mapping run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    pub id: u64,
    pub outcome: MatchOutcome,
}

impl Assignment {
    pub fn is_matched(&self) -> bool {
        matches!(self.outcome, MatchOutcome::Matched { .. })
    }

    pub fn pose(&self) -> Option<&Pose> {
        match &self.outcome {
            MatchOutcome::Matched { pose, .. } => Some(pose),
            MatchOutcome::Unseen => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Resolution {
    Open,
    Matched { col: usize, confidence: f32 },
    Unseen,
}

/// Working state of one mapping run. Rows are identities with an expected
/// pose, columns are detections.
struct Resolver<'t> {
    table: &'t AffinityTable,
    radii: Vec<f32>,
    /// Whether the identity has a pose at the reference frame and may
    /// therefore compete for detections claimed by others.
    competes: Vec<bool>,
    rows: Vec<Resolution>,
    open_cols: Vec<bool>,
}

impl Resolver<'_> {
    fn first_open_row(&self) -> Option<usize> {
        self.rows.iter().position(|r| matches!(r, Resolution::Open))
    }

    fn has_open_col(&self) -> bool {
        self.open_cols.iter().any(|&open| open)
    }

    /// Resolve `active`, or a stronger claimant it defers to.
    fn resolve(&mut self, active: usize, visited: &mut HashSet<usize>) {
        visited.insert(active);

        let claim = self
            .table
            .best_in_row(active, Some(self.radii[active]), |col| self.open_cols[col]);

        let Some(claim) = claim else {
            self.rows[active] = Resolution::Unseen;
            return;
        };

        // Scores are symmetric in offset magnitude, so a competitor's
        // affinity to the claimed detection is also its affinity to the
        // claimant's proposed pose.
        let competitors = self.rows.iter().enumerate().filter_map(|(row, state)| {
            let open = matches!(state, Resolution::Open);
            let eligible =
                row == active || (open && self.competes[row] && !visited.contains(&row));
            eligible.then(|| (row, self.table.score(row, claim.index)))
        });

        match best_of(competitors) {
            Some(winner) if winner.index != active => {
                trace!(
                    from = active,
                    to = winner.index,
                    detection = claim.index,
                    "deferring to stronger claimant"
                );
                self.resolve(winner.index, visited);
            }
            _ => {
                self.rows[active] = Resolution::Matched {
                    col: claim.index,
                    confidence: claim.confidence,
                };
                self.open_cols[claim.index] = false;
            }
        }
    }
}

/// Assignment engine for one pool of identities.
#[derive(Debug, Clone, Copy)]
pub struct Mapper<'c> {
    calibration: &'c Calibration,
}

impl<'c> Mapper<'c> {
    pub fn new(calibration: &'c Calibration) -> Self {
        Self { calibration }
    }

    /// Match `identities` against `detections` for `frame`, using the
    /// history up to `frame - 1`.
    ///
    /// Every identity with any history receives a pose at `frame`: the
    /// detection assigned to it, or its previous pose aged by one frame.
    /// Consumed detections are removed from `detections`; the order of the
    /// rest is preserved. Identities earlier in the slice win ties.
    ///
    /// Frame 0 has no preceding frame to match from; it yields no
    /// assignments and leaves identities and detections untouched.
    pub fn map<T: Tracked>(
        &self,
        identities: &mut [T],
        detections: &mut Vec<Detection>,
        frame: u64,
    ) -> Vec<Assignment> {
        let Some(reference) = frame.checked_sub(1) else {
            return Vec::new();
        };

        let mut members = Vec::with_capacity(identities.len());
        let mut expected = Vec::with_capacity(identities.len());
        let mut radii = Vec::with_capacity(identities.len());
        let mut competes = Vec::with_capacity(identities.len());
        for (idx, identity) in identities.iter().enumerate() {
            let Some(pose) = expected_pose(identity, reference, self.calibration) else {
                continue;
            };
            let age = identity
                .latest_pose_at_or_before(reference)
                .map_or(pose.age, |(_, p)| p.age);
            members.push(idx);
            expected.push(pose);
            radii.push(self.calibration.gating_radius(age));
            competes.push(identity.has_pose_at(reference));
        }

        let table = AffinityTable::compute(&expected, detections, self.calibration);
        let mut resolver = Resolver {
            table: &table,
            radii,
            competes,
            rows: vec![Resolution::Open; members.len()],
            open_cols: vec![true; detections.len()],
        };

        while resolver.has_open_col() {
            let Some(active) = resolver.first_open_row() else {
                break;
            };
            let mut visited = HashSet::new();
            resolver.resolve(active, &mut visited);
        }

        let mut assignments = Vec::with_capacity(members.len());
        for (row, &idx) in members.iter().enumerate() {
            let identity = &mut identities[idx];
            let Some((_, &previous)) = identity.latest_pose_at_or_before(reference) else {
                continue;
            };

            let outcome = match resolver.rows[row] {
                Resolution::Matched { col, confidence } => {
                    let correction = correct_heading(
                        &mut detections[col],
                        &*identity,
                        reference,
                        &self.calibration.motion,
                    );
                    let detection = &detections[col];
                    let locked = correction.confident || previous.heading_locked;
                    let pose = Pose::new(
                        detection.center,
                        correction.heading,
                        detection.size,
                        previous.color,
                    )
                    .with_heading(correction.heading, locked);
                    MatchOutcome::Matched {
                        pose,
                        confidence,
                        heading_confident: correction.confident,
                    }
                }
                Resolution::Open | Resolution::Unseen => MatchOutcome::Unseen,
            };

            let recorded = match &outcome {
                MatchOutcome::Matched { pose, .. } => *pose,
                MatchOutcome::Unseen => previous.unknown_successor(),
            };
            identity.record(frame, recorded);
            assignments.push(Assignment {
                id: identity.id(),
                outcome,
            });
        }

        let mut col = 0;
        detections.retain(|_| {
            let keep = resolver.open_cols[col];
            col += 1;
            keep
        });

        debug!(
            frame,
            identities = assignments.len(),
            matched = assignments.iter().filter(|a| a.is_matched()).count(),
            leftover = detections.len(),
            "mapped detections"
        );

        assignments
    }
}
