//! Confirmed tracks, probationary candidates, and the history capability
//! they share.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tracker::pose::Pose;
use crate::tracker::track_state::CandidateState;

/// Something with an identity and a per-frame pose history.
///
/// The assignment engine, predictor and heading corrector only ever see
/// identities through this trait.
pub trait Tracked {
    fn id(&self) -> u64;

    fn pose_at(&self, frame: u64) -> Option<&Pose>;

    /// Most recent pose recorded at or before `frame`.
    fn latest_pose_at_or_before(&self, frame: u64) -> Option<(u64, &Pose)>;

    fn first_frame(&self) -> Option<u64>;

    fn last_frame(&self) -> Option<u64>;

    /// Store `pose` as this identity's pose at `frame`.
    fn record(&mut self, frame: u64, pose: Pose);

    fn has_pose_at(&self, frame: u64) -> bool {
        self.pose_at(frame).is_some()
    }

    fn latest_pose(&self) -> Option<&Pose> {
        self.last_frame().and_then(|frame| self.pose_at(frame))
    }
}

/// A confirmed, persistent identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: u64,
    pub history: BTreeMap<u64, Pose>,
}

impl Track {
    pub fn new(id: u64, frame: u64, pose: Pose) -> Self {
        let mut history = BTreeMap::new();
        history.insert(frame, pose);
        Self { id, history }
    }
}

impl Tracked for Track {
    fn id(&self) -> u64 {
        self.id
    }

    fn pose_at(&self, frame: u64) -> Option<&Pose> {
        self.history.get(&frame)
    }

    fn latest_pose_at_or_before(&self, frame: u64) -> Option<(u64, &Pose)> {
        self.history.range(..=frame).next_back().map(|(f, p)| (*f, p))
    }

    fn first_frame(&self) -> Option<u64> {
        self.history.keys().next().copied()
    }

    fn last_frame(&self) -> Option<u64> {
        self.history.keys().next_back().copied()
    }

    fn record(&mut self, frame: u64, pose: Pose) {
        self.history.insert(frame, pose);
    }
}

/// A candidate's pose at one frame together with its score at that frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidatePose {
    pub pose: Pose,
    pub score: i32,
}

/// A probationary identity accumulating evidence before promotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u64,
    pub state: CandidateState,
    pub history: BTreeMap<u64, CandidatePose>,
}

impl Candidate {
    /// New candidate with a score of 1.
    pub fn new(id: u64, frame: u64, pose: Pose) -> Self {
        let mut history = BTreeMap::new();
        history.insert(frame, CandidatePose { pose, score: 1 });
        Self {
            id,
            state: CandidateState::Active,
            history,
        }
    }

    /// Score at the most recent frame.
    pub fn score(&self) -> i32 {
        self.history.values().next_back().map_or(0, |entry| entry.score)
    }

    fn adjust_score(&mut self, delta: i32) {
        if let Some(entry) = self.history.values_mut().next_back() {
            entry.score = entry.score.saturating_add(delta);
        }
    }

    pub fn increase_score(&mut self) {
        self.adjust_score(1);
    }

    pub fn decrease_score(&mut self, penalty: i32) {
        self.adjust_score(-penalty);
    }

    pub fn mark_promoted(&mut self) {
        self.state = CandidateState::Promoted;
    }

    pub fn mark_dropped(&mut self) {
        self.state = CandidateState::Dropped;
    }

    /// A track continuing this candidate's identity from `frame` on.
    pub fn to_track(&self, frame: u64) -> Option<Track> {
        let (_, pose) = self.latest_pose_at_or_before(frame)?;
        Some(Track::new(self.id, frame, *pose))
    }
}

impl Tracked for Candidate {
    fn id(&self) -> u64 {
        self.id
    }

    fn pose_at(&self, frame: u64) -> Option<&Pose> {
        self.history.get(&frame).map(|entry| &entry.pose)
    }

    fn latest_pose_at_or_before(&self, frame: u64) -> Option<(u64, &Pose)> {
        self.history
            .range(..=frame)
            .next_back()
            .map(|(f, entry)| (*f, &entry.pose))
    }

    fn first_frame(&self) -> Option<u64> {
        self.history.keys().next().copied()
    }

    fn last_frame(&self) -> Option<u64> {
        self.history.keys().next_back().copied()
    }

    /// The score carries over from the previous entry.
    fn record(&mut self, frame: u64, pose: Pose) {
        let score = self.score();
        self.history.insert(frame, CandidatePose { pose, score });
    }
}

/// Hands out ids shared by tracks and candidates so the two never collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Allocator whose first id is greater than every id in `taken`.
    pub fn after<I: IntoIterator<Item = u64>>(taken: I) -> Self {
        let next = taken.into_iter().max().map_or(1, |max| max + 1);
        Self { next }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}
