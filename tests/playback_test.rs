//! End-to-end playback tests: notation in, timed board positions out.
//!
//! Timing runs on tokio's paused clock, so delays are exact and instant.

mod common;

use std::time::Duration;

use playback::{PlaybackConfig, PlaybackEvent, PlaybackState, RunOutcome};
use tokio::time::Instant;

use common::{controller, replay_fen, until_finished, STANDARD_START_FEN};

#[tokio::test(start_paused = true)]
async fn test_opening_line_end_to_end() {
    let notation = "1. e4 e5 2. Nf3";
    let (handle, active) = controller(notation, PlaybackConfig::default());
    let mut events = handle.subscribe_events();
    let mut board = handle.subscribe_position();

    let t0 = Instant::now();
    active.send(true).unwrap();

    let mut frames = Vec::new();
    let mut sans = Vec::new();
    loop {
        match events.recv().await.unwrap() {
            PlaybackEvent::MovePlayed { ply, san, fen, .. } => {
                frames.push((ply, fen, t0.elapsed()));
                sans.push(san);
            }
            PlaybackEvent::RunFinished { outcome, .. } => {
                assert_eq!(outcome, RunOutcome::Completed);
                break;
            }
            _ => {}
        }
    }

    assert_eq!(sans, vec!["e4", "e5", "Nf3"]);
    assert_eq!(frames.len(), 3);
    for (i, (ply, _, at)) in frames.iter().enumerate() {
        assert_eq!(*ply, i + 1);
        assert_eq!(*at, Duration::from_millis(500 * i as u64));
    }
    assert!(t0.elapsed() >= Duration::from_millis(1500));

    // Last published frame is the line played from scratch
    assert_eq!(frames[2].1, replay_fen(notation));
    assert_eq!(board.borrow_and_update().fen, replay_fen(notation));
    assert_eq!(handle.state(), PlaybackState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_published_frames_are_distinct_and_ordered() {
    let notation = "1. d4 Nf6 2. c4 e6 3. Nc3 Bb4";
    let (handle, active) = controller(notation, PlaybackConfig::default());
    let mut events = handle.subscribe_events();

    active.send(true).unwrap();
    let run = until_finished(&mut events).await;

    let fens: Vec<&str> = run
        .iter()
        .filter_map(|e| match e {
            PlaybackEvent::MovePlayed { fen, .. } => Some(fen.as_str()),
            _ => None,
        })
        .collect();

    assert_eq!(fens.len(), 6);
    assert!(fens.iter().all(|fen| *fen != STANDARD_START_FEN));
    for pair in fens.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
    assert_eq!(*fens.last().unwrap(), replay_fen(notation));
}

#[tokio::test(start_paused = true)]
async fn test_every_run_starts_from_the_initial_position() {
    let (handle, active) = controller("1. e4 c5", PlaybackConfig::default());
    let mut events = handle.subscribe_events();

    for run in 1..=3u64 {
        active.send(true).unwrap();
        let events_of_run = until_finished(&mut events).await;
        assert_eq!(events_of_run[0], PlaybackEvent::RunStarted { run, plies: 2 });

        // First frame of each run is one ply from the start
        match &events_of_run[1] {
            PlaybackEvent::MovePlayed { ply, fen, .. } => {
                assert_eq!(*ply, 1);
                assert_eq!(fen, &replay_fen("1. e4"));
            }
            other => panic!("expected a move, got {other:?}"),
        }
        active.send(false).unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_reset_is_published_when_configured() {
    let config = PlaybackConfig {
        publish_reset: true,
        ..PlaybackConfig::default()
    };
    let (handle, active) = controller("1. e4 e5 2. Nf3", config);
    let mut events = handle.subscribe_events();

    active.send(true).unwrap();
    until_finished(&mut events).await;

    let board = handle.position();
    assert_eq!(board.fen, STANDARD_START_FEN);
    assert_eq!(board.ply, 0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_line_run_is_instant() {
    let (handle, active) = controller("", PlaybackConfig::default());
    let mut events = handle.subscribe_events();

    let t0 = Instant::now();
    active.send(true).unwrap();
    let run = until_finished(&mut events).await;

    assert_eq!(
        run,
        vec![
            PlaybackEvent::RunStarted { run: 1, plies: 0 },
            PlaybackEvent::RunFinished { run: 1, outcome: RunOutcome::Completed },
        ]
    );
    assert_eq!(t0.elapsed(), Duration::ZERO);
    assert_eq!(handle.position().fen, STANDARD_START_FEN);
}

#[tokio::test]
async fn test_board_is_read_only() {
    let (handle, _active) = controller("1. e4", PlaybackConfig::default());
    assert!(!handle.interaction().on_piece_drop("e2", "e4"));
    assert!(!handle.interaction().on_piece_drop("g1", "f3"));
}
