mod candidates;
mod config;
mod geometry;
mod identity;
mod identity_tracker;
mod likelihood;
mod mapper;
mod matching;
mod motion;
mod orientation;
mod pose;
mod track_state;

pub use candidates::{CandidatePool, CandidateReport};
pub use config::{Calibration, ConfigError, Gating, MotionConfig, TrackerConfig};
pub use geometry::{Color, Size, angle_difference, normalize_angle, undirected_angle_distance};
pub use identity::{Candidate, CandidatePose, IdAllocator, Track, Tracked};
pub use identity_tracker::{FrameReport, IdentityTracker};
pub use likelihood::{Affinity, identity_likelihood, likelihood_from_offsets};
pub use mapper::{Assignment, Mapper, MatchOutcome};
pub use matching::{AffinityTable, BestMatch, Detection, best_of, gated_best, select_best};
pub use motion::{
    HeadingEstimate, current_speed, estimate_heading, expected_pose, predict_next_pose,
};
pub use orientation::{HeadingCorrection, correct_heading};
pub use pose::Pose;
pub use track_state::CandidateState;
