//! Playback error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("No slide at index {index} (feed has {len})")]
    NoSuchSlide { index: usize, len: usize },

    #[error("Playback controller has stopped")]
    ControllerGone,
}
