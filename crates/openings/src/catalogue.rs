//! In-memory opening catalogue and the group selector derived from it.

use std::collections::BTreeMap;
use std::io::{BufRead, Read};

use serde::Serialize;

use crate::error::CatalogueError;
use crate::lichess;
use crate::record::OpeningRecord;

/// Groups larger than this are left out of the selector.
pub const DEFAULT_MAX_GROUP_SIZE: usize = 100;

/// A selectable group and how many openings it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupOption {
    pub group: String,
    pub total: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    records: Vec<OpeningRecord>,
}

impl Catalogue {
    /// Wrap records as-is, keeping their order.
    pub fn new(records: Vec<OpeningRecord>) -> Self {
        Self { records }
    }

    /// Load the JSON export (an array of records).
    pub fn from_json<R: Read>(reader: R) -> Result<Self, CatalogueError> {
        let records: Vec<OpeningRecord> = serde_json::from_reader(reader)?;
        tracing::debug!(records = records.len(), "Loaded opening catalogue from JSON");
        Ok(Self::new(records))
    }

    /// Load and merge lichess TSV files, sorted by group, name and ECO.
    pub fn from_lichess_tsv<R: BufRead>(
        readers: impl IntoIterator<Item = R>,
    ) -> Result<Self, CatalogueError> {
        let mut records = Vec::new();
        for reader in readers {
            records.extend(lichess::parse_tsv(reader)?);
        }
        records.sort_by(|a, b| {
            (&a.group, &a.name, &a.eco).cmp(&(&b.group, &b.name, &b.eco))
        });
        tracing::debug!(records = records.len(), "Loaded opening catalogue from TSV");
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[OpeningRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize back to the JSON export format.
    pub fn to_json(&self) -> Result<String, CatalogueError> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Selector options: groups with at most `max_total` openings, smallest
    /// first, ties broken by name.
    pub fn group_options(&self, max_total: usize) -> Vec<GroupOption> {
        let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
        for record in &self.records {
            *totals.entry(record.group.as_str()).or_default() += 1;
        }

        let mut options: Vec<GroupOption> = totals
            .into_iter()
            .filter(|(_, total)| *total <= max_total)
            .map(|(group, total)| GroupOption {
                group: group.to_string(),
                total,
            })
            .collect();

        options.sort_by(|a, b| a.total.cmp(&b.total).then_with(|| a.group.cmp(&b.group)));
        options
    }

    /// Leaf lines only: drops every record whose `pgn` is a strict prefix or
    /// other substring of another record's `pgn`. Identical lines are kept.
    pub fn unique(&self) -> Catalogue {
        let records: Vec<OpeningRecord> = self
            .records
            .iter()
            .filter(|r| {
                !self
                    .records
                    .iter()
                    .any(|other| other.pgn != r.pgn && other.pgn.contains(&r.pgn))
            })
            .cloned()
            .collect();

        tracing::debug!(
            kept = records.len(),
            dropped = self.records.len() - records.len(),
            "Filtered catalogue to unique lines"
        );
        Catalogue::new(records)
    }

    /// Records of one group, in catalogue order.
    pub fn in_group(&self, group: &str) -> Vec<OpeningRecord> {
        self.records
            .iter()
            .filter(|r| r.group == group)
            .cloned()
            .collect()
    }
}
