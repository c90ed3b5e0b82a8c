use std::collections::HashMap;

use crate::{
    normalizer::dedupe_columns,
    types::{EnrichedTable, GroupLabel, MatchId, NormalizedTable},
};

pub const MATCH_ID_COLUMN: &str = "match_id";
pub const TEAM_COLUMN: &str = "team";

/// Prepends `match_id` (and `team` when a label is given) to every row.
/// Source columns that already use one of those names get a `.N` suffix.
pub fn enrich(table: NormalizedTable, group: Option<&GroupLabel>) -> EnrichedTable {
    let match_id = table.source_match_id;
    let mut columns = vec![MATCH_ID_COLUMN.to_string()];
    if group.is_some() {
        columns.push(TEAM_COLUMN.to_string());
    }
    columns.extend(table.columns);
    let columns = dedupe_columns(columns);

    let rows = table
        .rows
        .into_iter()
        .map(|row| {
            let mut enriched = Vec::with_capacity(row.len() + 2);
            enriched.push(match_id.to_string());
            if let Some(group) = group {
                enriched.push(group.to_string());
            }
            enriched.extend(row);
            enriched
        })
        .collect();

    EnrichedTable {
        match_id,
        name: table.table_id,
        columns,
        rows,
        source_tables: 1,
    }
}

/// Stacks tables from one document into a single table. Columns are the
/// union in first-seen order; cells a table lacks are left empty.
pub fn combine(match_id: &MatchId, name: &str, tables: Vec<EnrichedTable>) -> Option<EnrichedTable> {
    if tables.is_empty() {
        return None;
    }

    let mut columns: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for table in &tables {
        for column in &table.columns {
            if !positions.contains_key(column) {
                positions.insert(column.clone(), columns.len());
                columns.push(column.clone());
            }
        }
    }

    let source_tables = tables.len();
    let mut rows = Vec::new();
    for table in tables {
        let mapping: Vec<usize> = table.columns.iter().map(|c| positions[c]).collect();
        for row in table.rows {
            let mut combined = vec![String::new(); columns.len()];
            for (cell, &idx) in row.into_iter().zip(&mapping) {
                combined[idx] = cell;
            }
            rows.push(combined);
        }
    }

    Some(EnrichedTable {
        match_id: match_id.clone(),
        name: name.to_string(),
        columns,
        rows,
        source_tables,
    })
}
