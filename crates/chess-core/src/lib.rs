//! Chess rules plumbing shared by the playback engine and the tooling.
//!
//! Everything that needs to know how chess works goes through [`RulesEngine`];
//! [`ShakmatyRules`] is the implementation backed by `shakmaty` and `pgn-reader`.

pub mod error;
pub mod opening_tree;
pub mod pgn;
pub mod rules;

pub use error::{MoveApplicationError, NotationParseError};
pub use rules::{MoveToken, RulesEngine, ShakmatyRules, STANDARD_START_FEN};
