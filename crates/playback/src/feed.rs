//! Snap-scroll feed of opening slides.
//!
//! The feed owns one playback controller per slide and turns a single
//! "active slide" index into per-slide activation signals. Only real changes
//! are signalled: re-selecting the slide that is already active does nothing.

use std::sync::Arc;

use chess_core::{NotationParseError, RulesEngine};
use openings::OpeningRecord;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PlaybackConfig;
use crate::controller::{self, PlaybackHandle};
use crate::error::PlaybackError;
use crate::extractor::MoveExtractor;

pub struct Slide<E: RulesEngine> {
    pub record: OpeningRecord,
    key: String,
    activation: watch::Sender<bool>,
    handle: PlaybackHandle<E>,
    extraction_error: Option<NotationParseError>,
}

impl<E: RulesEngine> Slide<E> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn handle(&self) -> &PlaybackHandle<E> {
        &self.handle
    }

    pub fn is_active(&self) -> bool {
        *self.activation.borrow()
    }

    /// Why this slide's notation could not be played, if it could not.
    pub fn extraction_error(&self) -> Option<&NotationParseError> {
        self.extraction_error.as_ref()
    }

    fn set_active(&self, active: bool) {
        self.activation.send_if_modified(|current| {
            if *current == active {
                return false;
            }
            *current = active;
            true
        });
    }
}

pub struct OpeningFeed<E: RulesEngine> {
    engine: Arc<E>,
    extractor: MoveExtractor<E>,
    config: PlaybackConfig,
    root: CancellationToken,
    slides: Vec<Slide<E>>,
    active: Option<usize>,
}

impl<E: RulesEngine> OpeningFeed<E> {
    /// Build a feed with one idle controller per record and no active slide.
    /// Must be called inside a tokio runtime.
    pub fn new(engine: Arc<E>, records: Vec<OpeningRecord>, config: PlaybackConfig) -> Self {
        let extractor = MoveExtractor::new(Arc::clone(&engine));
        let mut feed = Self {
            engine,
            extractor,
            config,
            root: CancellationToken::new(),
            slides: Vec::new(),
            active: None,
        };
        feed.slides = feed.build_slides(records);
        feed
    }

    fn build_slides(&self, records: Vec<OpeningRecord>) -> Vec<Slide<E>> {
        let slides: Vec<Slide<E>> = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| self.build_slide(index, record))
            .collect();

        let unplayable = slides.iter().filter(|s| s.extraction_error.is_some()).count();
        info!(slides = slides.len(), unplayable, "Feed built");
        slides
    }

    fn build_slide(&self, index: usize, record: OpeningRecord) -> Slide<E> {
        let key = record.slide_key(index);
        let sequence = self.extractor.extract(&record.pgn);
        let extraction_error = sequence.as_ref().err().cloned();
        if let Some(e) = &extraction_error {
            warn!(slide = %key, error = %e, "Opening notation rejected");
        }

        let (activation, activation_rx) = watch::channel(false);
        let handle = controller::spawn_with_token(
            Arc::clone(&self.engine),
            sequence,
            activation_rx,
            self.config.clone(),
            key.clone(),
            self.root.child_token(),
        );

        Slide {
            record,
            key,
            activation,
            handle,
            extraction_error,
        }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn slides(&self) -> &[Slide<E>] {
        &self.slides
    }

    pub fn slide(&self, index: usize) -> Option<&Slide<E>> {
        self.slides.get(index)
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Make `index` the visible slide (`None` when no slide is visible).
    pub fn set_active(&mut self, index: Option<usize>) -> Result<(), PlaybackError> {
        if let Some(i) = index {
            if i >= self.slides.len() {
                return Err(PlaybackError::NoSuchSlide {
                    index: i,
                    len: self.slides.len(),
                });
            }
        }

        if let Some(prev) = self.active {
            if Some(prev) != index {
                self.slides[prev].set_active(false);
            }
        }
        if let Some(i) = index {
            self.slides[i].set_active(true);
        }

        debug!(from = ?self.active, to = ?index, "Active slide changed");
        self.active = index;
        Ok(())
    }

    /// Swap in a new list of openings (e.g. another group was selected).
    /// The old controllers are torn down and no slide is active afterwards.
    pub async fn replace(&mut self, records: Vec<OpeningRecord>) {
        let old = std::mem::take(&mut self.slides);
        self.active = None;
        shutdown_slides(old).await;
        self.slides = self.build_slides(records);
    }

    /// Tear every controller down, cancelling runs in flight.
    pub async fn shutdown(mut self) {
        self.root.cancel();
        let slides = std::mem::take(&mut self.slides);
        shutdown_slides(slides).await;
    }
}

async fn shutdown_slides<E: RulesEngine>(slides: Vec<Slide<E>>) {
    for slide in slides {
        slide.handle.shutdown().await;
    }
}
