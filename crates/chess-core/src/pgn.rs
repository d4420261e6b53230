//! Movetext extraction on top of `pgn-reader`.
//!
//! The notation is replayed on a fresh position while it is being read, so
//! every token that comes out is a move the engine has already played once.
//! `pgn-reader` steps over tokens it cannot read, so the movetext is scanned
//! strictly first and any word that is not a move, move number, NAG or result
//! rejects the whole line.

use std::ops::ControlFlow;
use std::sync::LazyLock;

use pgn_reader::{Outcome, RawTag, Reader, SanPlus, Skip, Visitor};
use regex::Regex;
use shakmaty::{Chess, Position};

use crate::error::NotationParseError;
use crate::rules::MoveToken;

static MOVE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.+(.*)$").expect("move number pattern"));

static NON_MOVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\.+|\$\d+|1-0|0-1|1/2-1/2|½-½|\*)$").expect("non-move token pattern")
});

static RESULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:1-0|0-1|1/2-1/2|½-½|\*)$").expect("result pattern"));

static ZERO_CASTLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0-0(?:-0)?[+#]?$").expect("castling pattern"));

/// Mainline collected for a single game.
#[derive(Default)]
struct Mainline {
    position: Chess,
    tokens: Vec<MoveToken>,
    failure: Option<Failure>,
}

struct Failure {
    ply: usize,
    token: String,
    reason: String,
}

/// Visitor that keeps the mainline and skips every variation.
struct MainlineCollector;

impl Visitor for MainlineCollector {
    type Tags = ();
    type Movetext = Mainline;
    type Output = Mainline;

    fn begin_tags(&mut self) -> ControlFlow<Mainline, ()> {
        ControlFlow::Continue(())
    }

    fn tag(&mut self, _tags: &mut (), _name: &[u8], _value: RawTag<'_>) -> ControlFlow<Mainline> {
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _tags: ()) -> ControlFlow<Mainline, Mainline> {
        ControlFlow::Continue(Mainline::default())
    }

    fn begin_variation(&mut self, _line: &mut Mainline) -> ControlFlow<Mainline, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, line: &mut Mainline, san_plus: SanPlus) -> ControlFlow<Mainline> {
        let san = san_plus.to_string();
        let played = san_plus
            .san
            .to_move(&line.position)
            .map_err(|e| e.to_string())
            .and_then(|mv| {
                line.position
                    .clone()
                    .play(mv.clone())
                    .map(|next| (mv, next))
                    .map_err(|e| e.to_string())
            });

        match played {
            Ok((mv, next)) => {
                line.position = next;
                line.tokens.push(MoveToken { san, mv });
                ControlFlow::Continue(())
            }
            Err(reason) => {
                let mut failed = std::mem::take(line);
                failed.failure = Some(Failure {
                    ply: failed.tokens.len() + 1,
                    token: san,
                    reason,
                });
                ControlFlow::Break(failed)
            }
        }
    }

    // Anything after the result belongs to another game
    fn outcome(&mut self, line: &mut Mainline, _outcome: Outcome) -> ControlFlow<Mainline> {
        ControlFlow::Break(std::mem::take(line))
    }

    fn end_game(&mut self, line: Mainline) -> Mainline {
        line
    }
}

enum Lexeme {
    Word(String),
    /// Bracket or brace that is never closed, or closed without being opened.
    Unbalanced(char),
}

/// Split movetext into mainline words, dropping tag pairs, comments and
/// (nested) variations.
fn lex_mainline(notation: &str) -> Vec<Lexeme> {
    let mut lexemes = Vec::new();
    let mut word = String::new();
    let mut depth = 0usize;
    let mut chars = notation.chars();

    let flush = |word: &mut String, lexemes: &mut Vec<Lexeme>| {
        if !word.is_empty() {
            lexemes.push(Lexeme::Word(std::mem::take(word)));
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                flush(&mut word, &mut lexemes);
                if !chars.by_ref().any(|c| c == '}') {
                    lexemes.push(Lexeme::Unbalanced('{'));
                }
            }
            ';' => {
                flush(&mut word, &mut lexemes);
                chars.by_ref().find(|c| *c == '\n');
            }
            '[' if depth == 0 => {
                flush(&mut word, &mut lexemes);
                if !chars.by_ref().any(|c| c == ']') {
                    lexemes.push(Lexeme::Unbalanced('['));
                }
            }
            '(' => {
                flush(&mut word, &mut lexemes);
                depth += 1;
            }
            ')' => {
                flush(&mut word, &mut lexemes);
                match depth.checked_sub(1) {
                    Some(d) => depth = d,
                    None => lexemes.push(Lexeme::Unbalanced(')')),
                }
            }
            _ if depth > 0 => {}
            c if c.is_whitespace() => flush(&mut word, &mut lexemes),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut lexemes);
    if depth > 0 {
        lexemes.push(Lexeme::Unbalanced('('));
    }
    lexemes
}

/// Whether `word` reads as a single move, with optional `!`/`?` annotation.
fn is_san(word: &str) -> bool {
    let san = word.trim_end_matches(['!', '?']);
    !san.is_empty() && (ZERO_CASTLE.is_match(san) || SanPlus::from_ascii(san.as_bytes()).is_ok())
}

/// Strict pass over the mainline of the first game.
fn scan_movetext(notation: &str) -> Result<(), Failure> {
    let mut ply = 1;

    for lexeme in lex_mainline(notation) {
        let word = match lexeme {
            Lexeme::Word(word) => word,
            Lexeme::Unbalanced(c) => {
                return Err(Failure {
                    ply,
                    token: c.to_string(),
                    reason: format!("unbalanced '{c}'"),
                })
            }
        };

        if RESULT.is_match(&word) {
            break;
        }
        if NON_MOVE.is_match(&word) {
            continue;
        }

        let san = match MOVE_NUMBER.captures(&word) {
            Some(cap) => cap.get(1).map_or("", |m| m.as_str()).to_string(),
            None => word.clone(),
        };
        if san.is_empty() {
            continue;
        }
        if !is_san(&san) {
            return Err(Failure {
                ply,
                token: word,
                reason: "not a move in SAN".to_string(),
            });
        }
        ply += 1;
    }

    Ok(())
}

/// Parse `notation` (movetext such as `"1. e4 e5 2. Nf3"`) into replayable tokens.
///
/// An empty or blank string yields an empty list. Any unreadable or illegal
/// move fails the whole extraction; no partial list is returned. Only the
/// first game in the text is read.
pub fn extract_mainline(notation: &str) -> Result<Vec<MoveToken>, NotationParseError> {
    if notation.trim().is_empty() {
        return Ok(Vec::new());
    }

    let scanned = scan_movetext(notation);

    let mut reader = Reader::new(notation.as_bytes());
    let line = reader
        .read_game(&mut MainlineCollector)
        .map_err(|e| NotationParseError {
            notation: notation.to_string(),
            ply: 1,
            token: None,
            reason: e.to_string(),
        })?;

    let Some(line) = line else {
        return Ok(Vec::new());
    };

    // Report whichever problem comes first in the line. Tokens after a
    // malformed word are misnumbered by the reader, so the scan wins ties.
    let failure = match (scanned.err(), line.failure) {
        (Some(bad), Some(illegal)) if illegal.ply < bad.ply => Some(illegal),
        (Some(bad), _) => Some(bad),
        (None, illegal) => illegal,
    };

    if let Some(failure) = failure {
        return Err(NotationParseError {
            notation: notation.to_string(),
            ply: failure.ply,
            token: Some(failure.token),
            reason: failure.reason,
        });
    }

    Ok(line.tokens)
}
