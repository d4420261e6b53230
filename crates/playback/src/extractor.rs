//! Move extraction: notation in, replayable move sequence out.

use std::sync::Arc;

use chess_core::{NotationParseError, RulesEngine};

/// Ordered, immutable move list shared between a slide and its controller.
pub type MoveSequence<M> = Arc<[M]>;

pub struct MoveExtractor<E: RulesEngine> {
    engine: Arc<E>,
}

impl<E: RulesEngine> Clone for MoveExtractor<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E: RulesEngine> MoveExtractor<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// Extract the move sequence of `notation`.
    ///
    /// The same notation always produces the same sequence. An empty notation
    /// gives an empty sequence; malformed notation is returned as an error.
    pub fn extract(&self, notation: &str) -> Result<MoveSequence<E::Move>, NotationParseError> {
        let moves = self.engine.extract_moves(notation)?;
        tracing::debug!(plies = moves.len(), notation, "Extracted opening line");
        Ok(moves.into())
    }
}
