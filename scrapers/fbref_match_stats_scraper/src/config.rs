use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::{Path, PathBuf}, time::Duration};

use crate::{
    normalizer::DEFAULT_NATIONALITY_COLUMN,
    selector::SelectionPolicy,
    types::ColumnSignature,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScrapingConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputLayout {
    /// One CSV per page with `match_id` and `team` leading columns.
    Combined,
    /// One CSV per table under a folder named after the match.
    PerTable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    pub selection: SelectionPolicy,
    pub layout: OutputLayout,
    /// Only output files whose name contains this are kept.
    pub keep_marker: Option<String>,
    pub keep_empty_tables: bool,
    pub nationality_column: Option<String>,
    pub inter_request_delay_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            selection: SelectionPolicy::default(),
            layout: OutputLayout::Combined,
            keep_marker: None,
            keep_empty_tables: false,
            nationality_column: Some(DEFAULT_NATIONALITY_COLUMN.to_string()),
            inter_request_delay_secs: 3,
        }
    }
}

impl PipelineConfig {
    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_secs(self.inter_request_delay_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
    pub report_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("match_data"),
            report_file: PathBuf::from("processing_report.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "match_data".to_string()
}

impl StorageConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: default_prefix(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScraperConfig {
    pub scraping: ScrapingConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
    pub storage: Option<StorageConfig>,
}

impl ScraperConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overrides fields from `SCRAPER_*`, `FBREF_*` and `GCS_*` variables.
    pub fn apply_env(&mut self) {
        if let Ok(user_agent) = env::var("SCRAPER_USER_AGENT") {
            self.scraping.user_agent = user_agent;
        }
        if let Some(timeout) = env::var("SCRAPER_TIMEOUT_SECS").ok().and_then(|t| t.parse().ok()) {
            self.scraping.request_timeout_secs = timeout;
        }
        if let Ok(signature) = env::var("FBREF_SIGNATURE") {
            let signature = ColumnSignature::parse_list(&signature);
            self.pipeline.selection = if signature.is_empty() {
                SelectionPolicy::AcceptAll
            } else {
                SelectionPolicy::SignatureMatch(signature)
            };
        }
        if let Ok(marker) = env::var("FBREF_KEEP_MARKER") {
            self.pipeline.keep_marker = Some(marker).filter(|m| !m.is_empty());
        }
        if let Some(delay) = env::var("FBREF_DELAY_SECS").ok().and_then(|d| d.parse().ok()) {
            self.pipeline.inter_request_delay_secs = delay;
        }
        if let Ok(dir) = env::var("FBREF_OUTPUT_DIR") {
            self.output.output_dir = PathBuf::from(dir);
        }
        if let Ok(bucket) = env::var("GCS_BUCKET") {
            if bucket.is_empty() {
                self.storage = None;
            } else {
                let storage = self.storage.get_or_insert_with(|| StorageConfig::new(""));
                storage.bucket = bucket;
            }
        }
        if let (Ok(prefix), Some(storage)) = (env::var("GCS_PREFIX"), self.storage.as_mut()) {
            storage.prefix = prefix;
        }
    }
}
