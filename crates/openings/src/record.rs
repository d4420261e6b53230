use serde::{Deserialize, Serialize};

/// One opening line of the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningRecord {
    pub eco: String,
    pub group: String,
    #[serde(default)]
    pub subgroup: String,
    pub name: String,
    pub pgn: String, // movetext, e.g. "1. e4 e5 2. Nf3"
}

impl OpeningRecord {
    /// Build a record from a lichess name, deriving group and subgroup.
    ///
    /// "Sicilian Defense: Najdorf Variation, English Attack" has group
    /// "Sicilian Defense" and subgroup "Najdorf Variation".
    pub fn from_lichess(eco: &str, name: &str, pgn: &str) -> Self {
        let (group, rest) = match name.split_once(':') {
            Some((group, rest)) => (group.trim(), rest),
            None => (name.trim(), ""),
        };
        let subgroup = rest.split(',').next().unwrap_or("").trim();

        Self {
            eco: eco.trim().to_string(),
            group: group.to_string(),
            subgroup: subgroup.to_string(),
            name: name.trim().to_string(),
            pgn: pgn.trim().to_string(),
        }
    }

    /// Stable key for the slide showing this record at `index`.
    pub fn slide_key(&self, index: usize) -> String {
        format!(
            "{}-{}-{}",
            self.eco,
            self.name.replace(' ', "-").replace(':', " "),
            index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lichess_with_subgroup() {
        let r = OpeningRecord::from_lichess(
            "B90",
            "Sicilian Defense: Najdorf Variation, English Attack",
            "1. e4 c5 2. Nf3 d6 3. d4 cxd4 4. Nxd4 Nf6 5. Nc3 a6 6. Be3",
        );
        assert_eq!(r.group, "Sicilian Defense");
        assert_eq!(r.subgroup, "Najdorf Variation");
    }

    #[test]
    fn test_from_lichess_without_subgroup() {
        let r = OpeningRecord::from_lichess("C20", "King's Pawn Game", "1. e4 e5");
        assert_eq!(r.group, "King's Pawn Game");
        assert_eq!(r.subgroup, "");
    }

    #[test]
    fn test_slide_key() {
        let r = OpeningRecord::from_lichess("C50", "Italian Game: Giuoco Piano", "1. e4 e5");
        assert_eq!(r.slide_key(3), "C50-Italian-Game -Giuoco-Piano-3");
    }
}
