use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::types::{MatchId, NormalizedTable, RawTable};

pub const DEFAULT_NATIONALITY_COLUMN: &str = "Nation";

/// Per-column text cleanup applied after rows are validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCleanup {
    /// "eng England" -> "England": drops everything up to the first space.
    StripLeadingToken { column: String },
}

impl FieldCleanup {
    fn column(&self) -> &str {
        match self {
            FieldCleanup::StripLeadingToken { column } => column,
        }
    }

    fn apply(&self, value: &str) -> String {
        match self {
            FieldCleanup::StripLeadingToken { .. } => strip_leading_token(value).to_string(),
        }
    }
}

pub fn strip_leading_token(value: &str) -> &str {
    value.split_once(' ').map_or(value, |(_, rest)| rest)
}

#[derive(Debug, Default)]
struct DropCounts {
    marked: usize,
    malformed: usize,
    blank: usize,
}

#[derive(Debug, Clone)]
pub struct RowNormalizer {
    cleanups: Vec<FieldCleanup>,
    positional_fallback: bool,
}

impl Default for RowNormalizer {
    fn default() -> Self {
        Self::new(Some(DEFAULT_NATIONALITY_COLUMN))
    }
}

impl RowNormalizer {
    pub fn new(nationality_column: Option<&str>) -> Self {
        Self {
            cleanups: nationality_column
                .map(|column| FieldCleanup::StripLeadingToken {
                    column: column.to_string(),
                })
                .into_iter()
                .collect(),
            positional_fallback: false,
        }
    }

    /// Name columns `col_1..col_n` when a table has no header rows, instead
    /// of dropping every row as malformed.
    pub fn with_positional_fallback(mut self, enabled: bool) -> Self {
        self.positional_fallback = enabled;
        self
    }

    pub fn normalize(&self, raw: &RawTable, match_id: &MatchId) -> NormalizedTable {
        let header = self.resolve_header(raw);
        let mut drops = DropCounts::default();
        let mut rows = Vec::new();

        for row in &raw.body_rows {
            if row.kind.is_excluded() {
                drops.marked += 1;
                continue;
            }
            if row.cells.len() != header.len() {
                drops.malformed += 1;
                continue;
            }
            if row.cells.iter().all(|cell| cell.trim().is_empty()) {
                drops.blank += 1;
                continue;
            }
            rows.push(row.cells.clone());
        }

        let columns = dedupe_columns(header);
        for cleanup in &self.cleanups {
            if let Some(idx) = columns.iter().position(|c| c == cleanup.column()) {
                for row in &mut rows {
                    row[idx] = cleanup.apply(&row[idx]);
                }
            }
        }

        debug!(
            "Normalized {}: {} rows kept, {} marked, {} malformed, {} blank",
            raw.identifier,
            rows.len(),
            drops.marked,
            drops.malformed,
            drops.blank
        );

        NormalizedTable {
            source_match_id: match_id.clone(),
            table_id: raw.identifier.clone(),
            columns,
            rows,
        }
    }

    fn resolve_header(&self, raw: &RawTable) -> Vec<String> {
        match raw.last_header() {
            Some(header) => header.to_vec(),
            None if self.positional_fallback => {
                let width = raw
                    .body_rows
                    .iter()
                    .filter(|row| !row.kind.is_excluded())
                    .map(|row| row.cells.len())
                    .max()
                    .unwrap_or(0);
                (1..=width).map(|i| format!("col_{}", i)).collect()
            }
            None => Vec::new(),
        }
    }
}

/// Later repeats of a name get `.1`, `.2`, ... appended.
pub fn dedupe_columns(header: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = header.iter().cloned().collect();
    let mut columns = Vec::with_capacity(header.len());

    for name in header {
        let count = seen.entry(name.clone()).or_insert(0);
        if *count == 0 {
            *count = 1;
            columns.push(name);
            continue;
        }
        let mut candidate = format!("{}.{}", name, count);
        while taken.contains(&candidate) {
            *count += 1;
            candidate = format!("{}.{}", name, count);
        }
        *count += 1;
        taken.insert(candidate.clone());
        columns.push(candidate);
    }
    columns
}
