//! Reader for the lichess `chess-openings` TSV files (`a.tsv` .. `e.tsv`).
//!
//! Each file starts with an `eco\tname\tpgn` header row.

use std::io::BufRead;

use crate::error::CatalogueError;
use crate::record::OpeningRecord;

/// Parse one TSV file into records, in file order.
pub fn parse_tsv<R: BufRead>(reader: R) -> Result<Vec<OpeningRecord>, CatalogueError> {
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;

        if line.trim().is_empty() {
            continue;
        }
        if idx == 0 && line.starts_with("eco\t") {
            continue;
        }

        let mut cols = line.split('\t');
        let (Some(eco), Some(name), Some(pgn)) = (cols.next(), cols.next(), cols.next()) else {
            return Err(CatalogueError::Tsv {
                line: line_no,
                reason: "expected eco, name and pgn columns",
            });
        };
        if eco.trim().is_empty() || name.trim().is_empty() {
            return Err(CatalogueError::Tsv {
                line: line_no,
                reason: "empty eco or name",
            });
        }

        records.push(OpeningRecord::from_lichess(eco, name, pgn));
    }

    Ok(records)
}
