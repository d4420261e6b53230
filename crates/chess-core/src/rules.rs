//! Rules-engine capability used by the playback core.
//!
//! The core never generates or validates moves itself. It only needs three
//! things from a chess implementation: turn notation into a replayable move
//! list, apply one of those moves, and serialize a position for display.

use std::fmt;

use shakmaty::{fen::Fen, Chess, EnPassantMode, Move, Position};

use crate::error::{MoveApplicationError, NotationParseError};
use crate::pgn;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Narrow chess capability. Any implementation of standard chess rules that
/// can provide these operations is substitutable.
pub trait RulesEngine: Send + Sync + 'static {
    type Position: Clone + Send + Sync + 'static;
    type Move: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;

    /// The fixed standard initial position.
    fn initial_position(&self) -> Self::Position;

    /// Load `notation` into a fresh position and return the played-move history.
    fn extract_moves(&self, notation: &str) -> Result<Vec<Self::Move>, NotationParseError>;

    /// Play one move, returning the resulting position.
    fn apply(
        &self,
        position: &Self::Position,
        mv: &Self::Move,
    ) -> Result<Self::Position, MoveApplicationError>;

    /// Canonical board + metadata string (FEN).
    fn serialize(&self, position: &Self::Position) -> String;

    /// Display notation of a move, for logs and events.
    fn describe(&self, mv: &Self::Move) -> String;
}

/// One extracted move: the engine's own move plus the SAN it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveToken {
    pub san: String,
    pub mv: Move,
}

impl fmt::Display for MoveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.san)
    }
}

/// Standard chess via `shakmaty`, movetext via `pgn-reader`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyRules;

impl ShakmatyRules {
    pub fn new() -> Self {
        Self
    }
}

impl RulesEngine for ShakmatyRules {
    type Position = Chess;
    type Move = MoveToken;

    fn initial_position(&self) -> Chess {
        Chess::default()
    }

    fn extract_moves(&self, notation: &str) -> Result<Vec<MoveToken>, NotationParseError> {
        pgn::extract_mainline(notation)
    }

    fn apply(&self, position: &Chess, token: &MoveToken) -> Result<Chess, MoveApplicationError> {
        position
            .clone()
            .play(token.mv.clone())
            .map_err(|_| MoveApplicationError {
                san: token.san.clone(),
                fen: self.serialize(position),
            })
    }

    fn serialize(&self, position: &Chess) -> String {
        Fen::from_position(position, EnPassantMode::Legal).to_string()
    }

    fn describe(&self, token: &MoveToken) -> String {
        token.san.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_position_serializes_to_start_fen() {
        let rules = ShakmatyRules::new();
        assert_eq!(rules.serialize(&rules.initial_position()), STANDARD_START_FEN);
    }

    #[test]
    fn test_apply_tokens_in_order() {
        let rules = ShakmatyRules::new();
        let tokens = rules.extract_moves("1. e4 e5 2. Nf3").unwrap();

        let mut pos = rules.initial_position();
        for token in &tokens {
            pos = rules.apply(&pos, token).unwrap();
        }

        assert_eq!(
            rules.serialize(&pos),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );
    }

    #[test]
    fn test_apply_out_of_order_fails() {
        let rules = ShakmatyRules::new();
        let tokens = rules.extract_moves("1. e4 e5").unwrap();

        // Black's reply is not playable with White to move.
        let err = rules.apply(&rules.initial_position(), &tokens[1]).unwrap_err();
        assert_eq!(err.san, "e5");
        assert_eq!(err.fen, STANDARD_START_FEN);
    }
}
