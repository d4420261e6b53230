//! Opening tree builder over a catalogue of opening lines.

use serde_json::Value as JsonValue;
use shakmaty::Chess;
use std::collections::HashMap;

use crate::rules::{MoveToken, RulesEngine, ShakmatyRules, STANDARD_START_FEN};

/// One catalogue line for tree building.
pub struct TreeLine<'a> {
    pub name: &'a str,
    pub moves: &'a [MoveToken],
}

struct TreeNode {
    mv: String,
    fen: String,
    lines: i64,
    openings: Vec<String>, // names of lines that end on this node
    children: HashMap<String, TreeNode>,
}

impl TreeNode {
    fn new(mv: &str, fen: &str) -> Self {
        Self {
            mv: mv.to_string(),
            fen: fen.to_string(),
            lines: 0,
            openings: Vec::new(),
            children: HashMap::new(),
        }
    }
}

/// Build the move tree of all lines, at most `max_depth` plies deep.
///
/// Lines whose tokens stop applying are cut at the first failing move.
pub fn build_opening_tree(lines: &[TreeLine<'_>], max_depth: usize) -> JsonValue {
    let rules = ShakmatyRules::new();
    let mut root = TreeNode::new("start", STANDARD_START_FEN);
    root.lines = lines.len() as i64;

    for line in lines {
        let moves = &line.moves[..line.moves.len().min(max_depth)];

        let mut current = &mut root;
        let mut pos: Chess = rules.initial_position();
        let mut complete = true;

        for token in moves {
            pos = match rules.apply(&pos, token) {
                Ok(next) => next,
                Err(_) => {
                    complete = false;
                    break;
                }
            };

            let fen = rules.serialize(&pos);
            let child = current
                .children
                .entry(token.san.clone())
                .or_insert_with(|| TreeNode::new(&token.san, &fen));
            child.lines += 1;
            current = child;
        }

        if complete && moves.len() == line.moves.len() {
            current.openings.push(line.name.to_string());
        }
    }

    node_to_json(&root)
}

fn node_to_json(node: &TreeNode) -> JsonValue {
    let mut children: Vec<&TreeNode> = node.children.values().collect();

    // Most common continuation first, SAN as tie-break
    children.sort_by(|a, b| b.lines.cmp(&a.lines).then_with(|| a.mv.cmp(&b.mv)));

    let children: Vec<JsonValue> = children.into_iter().map(node_to_json).collect();

    serde_json::json!({
        "move": node.mv,
        "fen": node.fen,
        "lines": node.lines,
        "openings": node.openings,
        "children": children,
    })
}
