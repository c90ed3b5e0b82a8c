use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::{ColumnSignature, GroupLabel, RawTable, SelectedTable};

/// Separator between the team name and the rest of an FBref caption,
/// as in "Chelsea Player Stats Table".
pub const CAPTION_SEPARATOR: &str = " Player ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "columns", rename_all = "snake_case")]
pub enum SelectionPolicy {
    AcceptAll,
    SignatureMatch(ColumnSignature),
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::SignatureMatch(ColumnSignature::player_stats())
    }
}

impl SelectionPolicy {
    pub fn accepts(&self, table: &RawTable) -> bool {
        match self {
            SelectionPolicy::AcceptAll => true,
            SelectionPolicy::SignatureMatch(signature) => table
                .last_header()
                .is_some_and(|header| signature.matches(header)),
        }
    }

    pub fn select<I>(&self, tables: I) -> Vec<SelectedTable>
    where
        I: IntoIterator<Item = RawTable>,
    {
        tables
            .into_iter()
            .filter_map(|raw| {
                if !self.accepts(&raw) {
                    debug!("Skipping table {}", raw.identifier);
                    return None;
                }
                let group = resolve_group_label(raw.caption.as_deref());
                info!("Found matching table: {} ({})", raw.identifier, group);
                Some(SelectedTable { raw, group })
            })
            .collect()
    }
}

pub fn resolve_group_label(caption: Option<&str>) -> GroupLabel {
    caption
        .and_then(|text| text.split_once(CAPTION_SEPARATOR))
        .map(|(team, _)| team.trim())
        .filter(|team| !team.is_empty())
        .map_or(GroupLabel::Unknown, |team| GroupLabel::Team(team.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BodyRow, RowKind};

    fn table(id: &str, header: Option<&[&str]>, caption: Option<&str>) -> RawTable {
        RawTable {
            identifier: id.to_string(),
            header_rows: header
                .map(|h| vec![h.iter().map(|c| c.to_string()).collect()])
                .unwrap_or_default(),
            body_rows: vec![BodyRow {
                kind: RowKind::Data,
                cells: vec!["x".to_string()],
            }],
            caption: caption.map(str::to_string),
        }
    }

    const FULL: &[&str] = &["Player", "Min", "Gls", "Ast", "xG", "Pos"];
    const NO_XG: &[&str] = &["Player", "Min", "Gls", "Ast", "Pos"];

    #[test]
    fn test_signature_match_selects_and_rejects() {
        let policy = SelectionPolicy::default();
        assert!(policy.accepts(&table("a", Some(FULL), None)));
        assert!(!policy.accepts(&table("b", Some(NO_XG), None)));
        assert!(!policy.accepts(&table("c", None, None)));
    }

    #[test]
    fn test_signature_uses_last_header_row_only() {
        let mut raw = table("a", Some(&["Summary"]), None);
        raw.header_rows.insert(0, FULL.iter().map(|c| c.to_string()).collect());
        assert!(!SelectionPolicy::default().accepts(&raw));
    }

    #[test]
    fn test_accept_all_keeps_headerless_tables() {
        let selected = SelectionPolicy::AcceptAll.select(vec![
            table("a", None, None),
            table("b", Some(NO_XG), None),
        ]);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_group_label_from_caption() {
        let selected = SelectionPolicy::default().select(vec![
            table("home", Some(FULL), Some("Dinamo Zagreb Player Stats Table")),
            table("away", Some(FULL), Some("Match Officials")),
            table("none", Some(FULL), None),
        ]);
        let labels: Vec<_> = selected.iter().map(|t| t.group.clone()).collect();
        assert_eq!(
            labels,
            vec![
                GroupLabel::Team("Dinamo Zagreb".to_string()),
                GroupLabel::Unknown,
                GroupLabel::Unknown,
            ]
        );
    }

    #[test]
    fn test_group_label_never_empty() {
        assert_eq!(resolve_group_label(Some(" Player Stats")), GroupLabel::Unknown);
    }
}
