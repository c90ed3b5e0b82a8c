use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

/// Sentinel written when no match identifier can be found in a source URL.
pub const UNKNOWN_MATCH_ID: &str = "unknown";

/// Sentinel written when a table caption does not name a team.
pub const UNKNOWN_GROUP_LABEL: &str = "Unknown";

/// How a body row was flagged in the source markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Data,
    /// `<tr class="thead">`: the header repeated inside the body.
    RepeatedHeader,
    /// `<tr class="sum">` or `<tr class="summary">`: a totals row.
    Summary,
}

impl RowKind {
    pub fn from_classes<'a>(mut classes: impl Iterator<Item = &'a str>) -> Self {
        classes
            .find_map(|class| match class {
                "thead" => Some(RowKind::RepeatedHeader),
                "sum" | "summary" => Some(RowKind::Summary),
                _ => None,
            })
            .unwrap_or(RowKind::Data)
    }

    pub fn is_excluded(self) -> bool {
        self != RowKind::Data
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyRow {
    pub kind: RowKind,
    pub cells: Vec<String>,
}

/// A table as found in the page, with colspans already expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub identifier: String,
    pub header_rows: Vec<Vec<String>>,
    pub body_rows: Vec<BodyRow>,
    pub caption: Option<String>,
}

impl RawTable {
    pub fn last_header(&self) -> Option<&[String]> {
        self.header_rows.last().map(Vec::as_slice)
    }
}

/// Column names that must all be present in a table's last header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSignature(BTreeSet<String>);

impl ColumnSignature {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(columns.into_iter().map(Into::into).collect())
    }

    /// The player summary signature used for FBref match reports.
    pub fn player_stats() -> Self {
        Self::new(["Player", "Min", "Gls", "Ast", "xG", "Pos"])
    }

    /// Parses a comma separated list such as `Player,Min,Gls`.
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(',').map(str::trim).filter(|c| !c.is_empty()))
    }

    pub fn matches(&self, header: &[String]) -> bool {
        self.0.iter().all(|required| header.iter().any(|h| h == required))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchId {
    Known(String),
    Unknown,
}

impl MatchId {
    pub fn as_str(&self) -> &str {
        match self {
            MatchId::Known(id) => id,
            MatchId::Unknown => UNKNOWN_MATCH_ID,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, MatchId::Known(_))
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupLabel {
    Team(String),
    Unknown,
}

impl GroupLabel {
    pub fn as_str(&self) -> &str {
        match self {
            GroupLabel::Team(name) => name,
            GroupLabel::Unknown => UNKNOWN_GROUP_LABEL,
        }
    }
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw table that passed selection, with its resolved team label.
#[derive(Debug, Clone)]
pub struct SelectedTable {
    pub raw: RawTable,
    pub group: GroupLabel,
}

/// Rows aligned to a unique set of column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTable {
    pub source_match_id: MatchId,
    pub table_id: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl NormalizedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Rows ready for a flat file: `[match_id, (team), ...columns]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedTable {
    pub match_id: MatchId,
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub source_tables: usize,
}

impl EnrichedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
