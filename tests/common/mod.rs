use std::sync::Arc;

use chess_core::{RulesEngine, ShakmatyRules};
use playback::{PlaybackConfig, PlaybackEvent, PlaybackHandle};
use tokio::sync::{broadcast, watch};

pub const STANDARD_START_FEN: &str = chess_core::STANDARD_START_FEN;

/// Spawn a controller for `notation` with the activation signal switched off.
pub fn controller(
    notation: &str,
    config: PlaybackConfig,
) -> (PlaybackHandle<ShakmatyRules>, watch::Sender<bool>) {
    let engine = Arc::new(ShakmatyRules::new());
    let sequence = playback::MoveExtractor::new(engine.clone()).extract(notation);
    let (active_tx, active_rx) = watch::channel(false);
    let handle = playback::controller::spawn(engine, sequence, active_rx, config);
    (handle, active_tx)
}

/// Receive events until the end of the current run, inclusive.
pub async fn until_finished(rx: &mut broadcast::Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    loop {
        let event = rx.recv().await.expect("event stream closed");
        let done = matches!(event, PlaybackEvent::RunFinished { .. });
        events.push(event);
        if done {
            return events;
        }
    }
}

/// FEN reached by playing `notation` from the start, outside of any controller.
pub fn replay_fen(notation: &str) -> String {
    let rules = ShakmatyRules::new();
    let mut pos = rules.initial_position();
    for token in rules.extract_moves(notation).expect("valid notation") {
        pos = rules.apply(&pos, &token).expect("legal move");
    }
    rules.serialize(&pos)
}
