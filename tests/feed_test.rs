//! Catalogue to feed: a selected group's slides play one at a time.

use std::sync::Arc;

use chess_core::ShakmatyRules;
use openings::Catalogue;
use playback::{IgnoredReason, OpeningFeed, PlaybackConfig, PlaybackEvent, RunOutcome};
use serde_json::json;

fn catalogue() -> Catalogue {
    let records = json!([
        {"eco": "C50", "group": "Italian Game", "subgroup": "", "name": "Italian Game",
         "pgn": "1. e4 e5 2. Nf3 Nc6 3. Bc4"},
        {"eco": "C53", "group": "Italian Game", "subgroup": "Classical Variation",
         "name": "Italian Game: Classical Variation", "pgn": "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. c3"},
        {"eco": "C50", "group": "Italian Game", "subgroup": "Broken",
         "name": "Italian Game: Broken", "pgn": "1. e4 e5 2. Qh8"},
        {"eco": "C50", "group": "Italian Game", "subgroup": "Garbled",
         "name": "Italian Game: Garbled", "pgn": "1. e4 zzz e5"},
        {"eco": "B20", "group": "Sicilian Defense", "name": "Sicilian Defense", "pgn": "1. e4 c5"}
    ]);
    let bytes = serde_json::to_vec(&records).unwrap();
    Catalogue::from_json(bytes.as_slice()).unwrap()
}

fn italian_feed() -> OpeningFeed<ShakmatyRules> {
    OpeningFeed::new(
        Arc::new(ShakmatyRules::new()),
        catalogue().in_group("Italian Game"),
        PlaybackConfig::default(),
    )
}

async fn moves_of_next_run(rx: &mut tokio::sync::broadcast::Receiver<PlaybackEvent>) -> Vec<String> {
    let mut sans = Vec::new();
    loop {
        match rx.recv().await.unwrap() {
            PlaybackEvent::MovePlayed { san, .. } => sans.push(san),
            PlaybackEvent::RunFinished { outcome, .. } => {
                assert_eq!(outcome, RunOutcome::Completed);
                return sans;
            }
            _ => {}
        }
    }
}

#[test]
fn test_group_selector_options() {
    let options = catalogue().group_options(100);
    assert_eq!(options[0].group, "Sicilian Defense");
    assert_eq!(options[1].group, "Italian Game");
    assert_eq!(options[1].total, 4);
    assert_eq!(catalogue().records()[4].subgroup, "");
}

#[tokio::test(start_paused = true)]
async fn test_scrolling_through_a_group() {
    let mut feed = italian_feed();
    assert_eq!(feed.len(), 4);

    let mut first = feed.slide(0).unwrap().handle().subscribe_events();
    let mut second = feed.slide(1).unwrap().handle().subscribe_events();

    feed.set_active(Some(0)).unwrap();
    assert_eq!(moves_of_next_run(&mut first).await, vec!["e4", "e5", "Nf3", "Nc6", "Bc4"]);

    feed.set_active(Some(1)).unwrap();
    assert_eq!(moves_of_next_run(&mut second).await.len(), 7);

    // Scrolling back replays the first slide from the start
    feed.set_active(Some(0)).unwrap();
    assert_eq!(moves_of_next_run(&mut first).await.len(), 5);

    feed.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_broken_slides_stay_on_initial_board() {
    let mut feed = italian_feed();

    // An illegal move and an unreadable token both make the whole line unplayable
    for (index, token) in [(2, "Qh8"), (3, "zzz")] {
        let slide = feed.slide(index).unwrap();
        let error = slide.extraction_error().unwrap();
        assert_eq!(error.token.as_deref(), Some(token));
        let mut events = slide.handle().subscribe_events();

        feed.set_active(Some(index)).unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            PlaybackEvent::ActivationIgnored { reason: IgnoredReason::Unplayable }
        );

        let handle = feed.slide(index).unwrap().handle();
        assert!(!handle.is_playing());
        assert_eq!(handle.position().fen, chess_core::STANDARD_START_FEN);
    }
    feed.shutdown().await;
}

#[test]
fn test_unique_lines_of_a_group() {
    let italian = catalogue().unique().in_group("Italian Game");
    let names: Vec<&str> = italian.iter().map(|r| r.name.as_str()).collect();

    // The main Italian line continues into the Classical Variation
    assert_eq!(
        names,
        vec![
            "Italian Game: Classical Variation",
            "Italian Game: Broken",
            "Italian Game: Garbled",
        ]
    );
}
