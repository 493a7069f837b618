/// Lifecycle state of a candidate identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum CandidateState {
    /// On probation, receiving fresh or extrapolated poses
    #[default]
    Active,
    /// Moved into the confirmed pool
    Promoted,
    /// Discarded for a negative score or a missing update
    Dropped,
}
