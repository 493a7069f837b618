//! Probation of new identities.
//!
//! Detections left over after the confirmed tracks have been served are
//! matched against the candidate pool with the same assignment engine.
//! Candidates collect one point per frame with a detection and lose the
//! configured penalty per frame without one. They are promoted into the
//! confirmed pool once their score reaches the promotion threshold, and
//! dropped when their score goes negative or they received no pose for the
//! frame. Whatever detections remain afterwards start new candidates, which
//! are promoted right away if their starting score already meets the
//! threshold.
//!
//! Once the confirmed pool is full, probation stops and the pool is cleared.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::tracker::config::{Calibration, TrackerConfig};
use crate::tracker::geometry::Color;
use crate::tracker::identity::{Candidate, IdAllocator, Track, Tracked};
use crate::tracker::mapper::{Assignment, Mapper};
use crate::tracker::matching::Detection;
use crate::tracker::pose::Pose;
use crate::tracker::track_state::CandidateState;

/// What the candidate pass did in one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateReport {
    pub assignments: Vec<Assignment>,
    /// Ids of candidates that became tracks (the track keeps the id).
    pub promoted: Vec<u64>,
    pub dropped: Vec<u64>,
    pub spawned: Vec<u64>,
    /// The pool was cleared because the confirmed pool is full.
    pub cleared: bool,
}

/// Youngest last-known position first, id as tie-break.
pub(crate) fn sort_by_age<T: Tracked>(identities: &mut [T]) {
    identities.sort_by_key(|identity| {
        let age = identity.latest_pose().map_or(u32::MAX, |p| p.age);
        (age, identity.id())
    });
}

/// Owns the candidate identities and their display colors.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
    rng: ChaCha8Rng,
}

impl CandidatePool {
    pub fn new(color_seed: u64) -> Self {
        Self::from_candidates(Vec::new(), color_seed)
    }

    /// Resume from candidates restored elsewhere. Only active ones are kept.
    pub fn from_candidates(mut candidates: Vec<Candidate>, color_seed: u64) -> Self {
        candidates.retain(|c| c.state == CandidateState::Active);
        Self {
            candidates,
            rng: ChaCha8Rng::seed_from_u64(color_seed),
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    fn next_color(&mut self) -> Color {
        Color::new(
            self.rng.gen_range(0..=255),
            self.rng.gen_range(0..=255),
            self.rng.gen_range(0..=255),
        )
    }

    /// Run one frame of probation against the detections the tracks left over.
    ///
    /// Promoted candidates are appended to `tracks`. `detections` is empty
    /// afterwards unless the confirmed pool was already full.
    pub fn step(
        &mut self,
        tracks: &mut Vec<Track>,
        detections: &mut Vec<Detection>,
        frame: u64,
        config: &TrackerConfig,
        calibration: &Calibration,
        ids: &mut IdAllocator,
    ) -> CandidateReport {
        let mut report = CandidateReport::default();

        if tracks.len() >= config.target_tracks {
            if !self.candidates.is_empty() {
                debug!(
                    frame,
                    count = self.candidates.len(),
                    "confirmed pool full, clearing candidates"
                );
            }
            report.cleared = true;
            self.candidates.clear();
            return report;
        }

        sort_by_age(&mut self.candidates);
        report.assignments = Mapper::new(calibration).map(&mut self.candidates, detections, frame);

        let matched: HashMap<u64, bool> = report
            .assignments
            .iter()
            .map(|a| (a.id, a.is_matched()))
            .collect();
        for candidate in &mut self.candidates {
            match matched.get(&candidate.id) {
                Some(true) => candidate.increase_score(),
                Some(false) => candidate.decrease_score(config.candidate_miss_penalty),
                None => {}
            }
        }

        for candidate in &mut self.candidates {
            if !candidate.has_pose_at(frame) || candidate.score() < 0 {
                candidate.mark_dropped();
                report.dropped.push(candidate.id);
            }
        }
        self.candidates.retain(|c| c.state == CandidateState::Active);

        for detection in detections.drain(..) {
            let id = ids.next_id();
            let color = self.next_color();
            self.candidates
                .push(Candidate::new(id, frame, Pose::from_detection(&detection, color)));
            report.spawned.push(id);
        }

        // older candidates come first and get the remaining capacity first
        let mut capacity = config.target_tracks - tracks.len();
        for candidate in &mut self.candidates {
            if capacity == 0 {
                break;
            }
            if candidate.score() < config.promotion_threshold {
                continue;
            }
            if let Some(track) = candidate.to_track(frame) {
                info!(
                    frame,
                    id = candidate.id,
                    score = candidate.score(),
                    "promoting candidate"
                );
                tracks.push(track);
                candidate.mark_promoted();
                report.promoted.push(candidate.id);
                capacity -= 1;
            }
        }
        self.candidates.retain(|c| c.state == CandidateState::Active);

        if !(report.promoted.is_empty() && report.dropped.is_empty() && report.spawned.is_empty()) {
            debug!(
                frame,
                promoted = report.promoted.len(),
                dropped = report.dropped.len(),
                spawned = report.spawned.len(),
                pool = self.candidates.len(),
                "candidate lifecycle"
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::geometry::Size;
    use nalgebra::Point2;

    fn config(threshold: i32, penalty: i32, target: usize) -> TrackerConfig {
        TrackerConfig {
            promotion_threshold: threshold,
            candidate_miss_penalty: penalty,
            target_tracks: target,
            average_speed: 10.0,
            ..Default::default()
        }
    }

    struct Harness {
        config: TrackerConfig,
        calibration: Calibration,
        pool: CandidatePool,
        tracks: Vec<Track>,
        ids: IdAllocator,
        frame: u64,
    }

    impl Harness {
        fn new(config: TrackerConfig) -> Self {
            let calibration = Calibration::from_config(&config).unwrap();
            Self {
                pool: CandidatePool::new(config.color_seed),
                config,
                calibration,
                tracks: Vec::new(),
                ids: IdAllocator::default(),
                frame: 0,
            }
        }

        fn step(&mut self, mut detections: Vec<Detection>) -> CandidateReport {
            self.frame += 1;
            self.pool.step(
                &mut self.tracks,
                &mut detections,
                self.frame,
                &self.config,
                &self.calibration,
                &mut self.ids,
            )
        }
    }

    fn at_origin() -> Vec<Detection> {
        vec![Detection::new(0.0, 0.0, 0.0, 4.0, 1.0)]
    }

    #[test]
    fn test_leftover_detections_spawn_candidates() {
        let mut h = Harness::new(config(30, 0, 5));
        let report = h.step(vec![
            Detection::new(0.0, 0.0, 0.0, 1.0, 1.0),
            Detection::new(100.0, 0.0, 0.0, 1.0, 1.0),
        ]);
        assert_eq!(report.spawned, vec![1, 2]);
        assert_eq!(h.pool.len(), 2);
        assert!(h.pool.candidates().iter().all(|c| c.score() == 1));
    }

    #[test]
    fn test_promotion_on_exact_frame_with_alternating_hits() {
        let mut h = Harness::new(config(4, 0, 5));
        // frame 1 spawns with score 1; hits on even frames
        let spawned = h.step(at_origin()).spawned;
        let id = spawned[0];
        let mut promoted_at = None;
        for _ in 0..6 {
            let detections = if h.frame % 2 == 1 { at_origin() } else { Vec::new() };
            let report = h.step(detections);
            if report.promoted.contains(&id) {
                promoted_at = Some(h.frame);
                break;
            }
            // without a penalty a miss keeps the score
            assert!(h.pool.candidates().iter().any(|c| c.id == id));
        }
        // scores: f2 = 2, f3 = 2, f4 = 3, f5 = 3, f6 = 4
        assert_eq!(promoted_at, Some(6));
        assert_eq!(h.tracks.len(), 1);
        assert_eq!(h.tracks[0].id, id);
        assert!(h.tracks[0].has_pose_at(6));
        assert!(h.pool.is_empty());
    }

    #[test]
    fn test_drop_on_first_negative_score() {
        let mut h = Harness::new(config(30, 2, 5));
        let id = h.step(at_origin()).spawned[0];
        // f2 hit -> 2, f3 miss -> 0, f4 hit -> 1, f5 miss -> -1
        let mut dropped_at = None;
        for _ in 0..4 {
            let detections = if h.frame % 2 == 1 { at_origin() } else { Vec::new() };
            let report = h.step(detections);
            if report.dropped.contains(&id) {
                dropped_at = Some(h.frame);
                break;
            }
        }
        assert_eq!(dropped_at, Some(5));
        assert!(h.pool.is_empty());
        assert!(h.tracks.is_empty());
    }

    #[test]
    fn test_miss_without_penalty_ages_candidate() {
        let mut h = Harness::new(config(30, 0, 5));
        h.step(at_origin());
        let report = h.step(Vec::new());
        assert!(report.dropped.is_empty());
        let candidate = &h.pool.candidates()[0];
        assert_eq!(candidate.score(), 1);
        assert_eq!(candidate.pose_at(2).unwrap().age, 2);
    }

    #[test]
    fn test_threshold_one_promotes_on_spawn() {
        let mut h = Harness::new(config(1, 2, 5));
        let report = h.step(at_origin());
        assert_eq!(report.spawned, vec![1]);
        assert_eq!(report.promoted, vec![1]);
        assert!(h.pool.is_empty());
        assert_eq!(h.tracks.len(), 1);
        assert_eq!(h.tracks[0].id, 1);

        // the missed frame no longer reaches the promoted identity
        let report = h.step(Vec::new());
        assert!(report.dropped.is_empty());
        assert_eq!(h.tracks.len(), 1);
    }

    #[test]
    fn test_new_candidates_share_remaining_capacity() {
        let mut h = Harness::new(config(1, 0, 1));
        let report = h.step(vec![
            Detection::new(0.0, 0.0, 0.0, 1.0, 1.0),
            Detection::new(200.0, 0.0, 0.0, 1.0, 1.0),
        ]);
        assert_eq!(report.promoted, vec![1]);
        assert_eq!(h.tracks.len(), 1);
        assert_eq!(h.pool.len(), 1);
    }

    #[test]
    fn test_full_pool_clears_candidates() {
        let mut h = Harness::new(config(30, 0, 1));
        h.step(at_origin());
        assert_eq!(h.pool.len(), 1);

        let pose = Pose::new(Point2::new(500.0, 500.0), 0.0, Size::default(), Color::default());
        h.tracks.push(Track::new(99, h.frame, pose));

        let mut leftovers = vec![Detection::new(0.0, 0.0, 0.0, 1.0, 1.0)];
        h.frame += 1;
        let report = h.pool.step(
            &mut h.tracks,
            &mut leftovers,
            h.frame,
            &h.config,
            &h.calibration,
            &mut h.ids,
        );
        assert!(report.cleared);
        assert!(h.pool.is_empty());
        assert!(report.spawned.is_empty());
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_promotion_respects_remaining_capacity() {
        let mut h = Harness::new(config(2, 0, 1));
        h.step(vec![
            Detection::new(0.0, 0.0, 0.0, 1.0, 1.0),
            Detection::new(200.0, 0.0, 0.0, 1.0, 1.0),
        ]);
        let report = h.step(vec![
            Detection::new(0.0, 0.0, 0.0, 1.0, 1.0),
            Detection::new(200.0, 0.0, 0.0, 1.0, 1.0),
        ]);
        assert_eq!(report.promoted.len(), 1);
        assert_eq!(h.tracks.len(), 1);
        // the other one waits; the next frame clears it
        assert_eq!(h.pool.len(), 1);
        assert!(h.step(Vec::new()).cleared);
        assert!(h.pool.is_empty());
    }

    #[test]
    fn test_colors_are_reproducible() {
        let mut a = CandidatePool::new(7);
        let mut b = CandidatePool::new(7);
        assert_eq!(a.next_color(), b.next_color());
    }
}
