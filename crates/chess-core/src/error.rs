//! Rules-engine error types

use thiserror::Error;

/// The notation could not be turned into a move list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid notation {notation:?} at ply {ply}: {reason}")]
pub struct NotationParseError {
    pub notation: String,
    /// 1-indexed half-move where parsing stopped.
    pub ply: usize,
    /// Offending SAN token, if the failure was tied to one.
    pub token: Option<String>,
    pub reason: String,
}

/// A move token could not be played on the given position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot apply {san} to {fen}")]
pub struct MoveApplicationError {
    pub san: String,
    pub fen: String,
}
