use scraper::Html;
use tracing::info;

use crate::{
    config::{OutputLayout, PipelineConfig},
    enricher::{combine, enrich},
    error::ScrapeError,
    normalizer::RowNormalizer,
    selector::SelectionPolicy,
    table_locator::locate_tables,
    types::{EnrichedTable, MatchId},
    utils::{extract_match_id, output_key},
};

pub const COMBINED_TABLE_NAME: &str = "combined";

/// Everything extracted from one match page, ready for the sink.
#[derive(Debug, Clone)]
pub struct DocumentTables {
    pub match_id: MatchId,
    /// Names this page's output files and objects.
    pub output_key: String,
    /// Tables that passed selection and were kept.
    pub table_count: usize,
    pub tables: Vec<EnrichedTable>,
}

impl DocumentTables {
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(EnrichedTable::row_count).sum()
    }
}

/// Locate, select, normalize and enrich: page HTML in, flat tables out.
pub struct MatchPipeline {
    policy: SelectionPolicy,
    normalizer: RowNormalizer,
    layout: OutputLayout,
    keep_empty_tables: bool,
}

impl MatchPipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        let accept_all = matches!(config.selection, SelectionPolicy::AcceptAll);
        Self {
            policy: config.selection.clone(),
            normalizer: RowNormalizer::new(config.nationality_column.as_deref())
                .with_positional_fallback(accept_all),
            layout: config.layout,
            keep_empty_tables: config.keep_empty_tables,
        }
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    pub fn parse_html(&self, html: &str, url: &str) -> Result<DocumentTables, ScrapeError> {
        let match_id = extract_match_id(url);
        let document = Html::parse_document(html);

        let selected = self.policy.select(locate_tables(&document));
        if selected.is_empty() {
            return Err(ScrapeError::NoMatch);
        }
        info!("Found {} matching tables for match {}", selected.len(), match_id);

        let normalized: Vec<_> = selected
            .into_iter()
            .map(|table| (self.normalizer.normalize(&table.raw, &match_id), table.group))
            .filter(|(table, _)| self.keep_empty_tables || !table.is_empty())
            .collect();
        if normalized.is_empty() {
            return Err(ScrapeError::NoRows);
        }
        let table_count = normalized.len();

        let tables = match self.layout {
            OutputLayout::Combined => {
                let enriched = normalized
                    .into_iter()
                    .map(|(table, group)| {
                        info!("Processed {} ({}) with {} rows", table.table_id, group, table.rows.len());
                        enrich(table, Some(&group))
                    })
                    .collect();
                combine(&match_id, COMBINED_TABLE_NAME, enriched)
                    .into_iter()
                    .collect()
            }
            OutputLayout::PerTable => normalized
                .into_iter()
                .map(|(table, _)| enrich(table, None))
                .collect(),
        };

        Ok(DocumentTables {
            output_key: output_key(&match_id, url),
            match_id,
            table_count,
            tables,
        })
    }
}
