//! Frame-by-frame identity tracking: confirmed tracks first, then probation.

use tracing::info;

use crate::tracker::candidates::{CandidatePool, sort_by_age};
use crate::tracker::config::{Calibration, ConfigError, TrackerConfig};
use crate::tracker::identity::{Candidate, IdAllocator, Track};
use crate::tracker::mapper::{Assignment, Mapper};
use crate::tracker::matching::Detection;

/// Everything that happened in one call to [`IdentityTracker::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    /// One entry per track that had any history before this frame.
    pub tracks: Vec<Assignment>,
    /// One entry per candidate that took part in probation.
    pub candidates: Vec<Assignment>,
    pub promoted: Vec<u64>,
    pub dropped: Vec<u64>,
    pub spawned: Vec<u64>,
    pub candidates_cleared: bool,
}

impl FrameReport {
    /// Number of detections consumed by confirmed tracks.
    pub fn matched_tracks(&self) -> usize {
        self.tracks.iter().filter(|a| a.is_matched()).count()
    }
}

pub struct IdentityTracker {
    tracks: Vec<Track>,
    candidates: CandidatePool,
    ids: IdAllocator,
    frame_id: u64,
    config: TrackerConfig,
    calibration: Calibration,
}

impl Default for IdentityTracker {
    fn default() -> Self {
        let config = TrackerConfig::default();
        Self {
            tracks: Vec::new(),
            candidates: CandidatePool::new(config.color_seed),
            ids: IdAllocator::default(),
            frame_id: 0,
            calibration: Calibration::default(),
            config,
        }
    }
}

impl IdentityTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        Self::restore(config, Vec::new(), Vec::new(), 0)
    }

    /// Start from already confirmed tracks, e.g. loaded from disk. The next
    /// call to `update` processes `frame_id + 1`.
    pub fn with_tracks(
        config: TrackerConfig,
        tracks: Vec<Track>,
        frame_id: u64,
    ) -> Result<Self, ConfigError> {
        Self::restore(config, tracks, Vec::new(), frame_id)
    }

    /// Resume from a full set of tracks and candidates.
    pub fn restore(
        config: TrackerConfig,
        tracks: Vec<Track>,
        candidates: Vec<Candidate>,
        frame_id: u64,
    ) -> Result<Self, ConfigError> {
        let calibration = Calibration::from_config(&config)?;
        let ids = IdAllocator::after(
            tracks
                .iter()
                .map(|t| t.id)
                .chain(candidates.iter().map(|c| c.id)),
        );
        Ok(Self {
            tracks,
            candidates: CandidatePool::from_candidates(candidates, config.color_seed),
            ids,
            frame_id,
            calibration,
            config,
        })
    }

    /// Replace the configuration. Takes effect from the next frame.
    pub fn set_config(&mut self, config: TrackerConfig) -> Result<(), ConfigError> {
        self.calibration = Calibration::from_config(&config)?;
        info!(
            average_speed = config.average_speed,
            target_tracks = config.target_tracks,
            "tracker configuration reloaded"
        );
        self.config = config;
        Ok(())
    }

    /// Process the detections of the next frame.
    ///
    /// Tracks are matched first, youngest last-known position first; the
    /// leftover detections then go through candidate probation.
    pub fn update(&mut self, mut detections: Vec<Detection>) -> FrameReport {
        self.frame_id += 1;
        let frame = self.frame_id;

        sort_by_age(&mut self.tracks);
        let tracks = Mapper::new(&self.calibration).map(&mut self.tracks, &mut detections, frame);

        let lifecycle = self.candidates.step(
            &mut self.tracks,
            &mut detections,
            frame,
            &self.config,
            &self.calibration,
            &mut self.ids,
        );

        FrameReport {
            frame,
            tracks,
            candidates: lifecycle.assignments,
            promoted: lifecycle.promoted,
            dropped: lifecycle.dropped,
            spawned: lifecycle.spawned,
            candidates_cleared: lifecycle.cleared,
        }
    }

    /// Confirmed tracks, youngest last-known position first as of the last
    /// `update`; tracks promoted during that frame follow at the end.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: u64) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn candidates(&self) -> &[Candidate] {
        self.candidates.candidates()
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }
}
