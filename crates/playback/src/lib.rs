//! Opening replay playback engine.
//!
//! A [`MoveExtractor`] turns an opening's movetext into a move sequence; a
//! playback controller task replays it on a board, one move per interval,
//! whenever its slide's activation signal turns on. [`OpeningFeed`] wires a
//! list of openings to one controller per slide.

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod extractor;
pub mod feed;

pub use config::{DeactivationPolicy, PlaybackConfig};
pub use controller::{LockedBoard, PlaybackHandle, PlaybackState, PublishedPosition};
pub use error::PlaybackError;
pub use event::{IgnoredReason, PlaybackEvent, RunOutcome};
pub use extractor::{MoveExtractor, MoveSequence};
pub use feed::{OpeningFeed, Slide};
