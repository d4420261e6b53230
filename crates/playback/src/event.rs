//! Events a playback controller emits while it runs.

use chess_core::MoveApplicationError;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed(MoveApplicationError),
}

/// Why an activation did not start a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    /// A run is already in flight.
    Busy,
    /// The notation could not be extracted.
    Unplayable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    RunStarted { run: u64, plies: usize },
    MovePlayed { run: u64, ply: usize, san: String, fen: String },
    RunFinished { run: u64, outcome: RunOutcome },
    ActivationIgnored { reason: IgnoredReason },
}
