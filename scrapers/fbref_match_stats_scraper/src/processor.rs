use std::{
    path::{Path, PathBuf},
    thread,
};
use tracing::{error, info, warn};

use crate::{
    config::{OutputConfig, PipelineConfig, StorageConfig},
    error::ScrapeError,
    fetch::HtmlFetcher,
    pipeline::{DocumentTables, MatchPipeline},
    report::{write_report, MatchResult, MatchStatus},
    sink::{output_path, prune_outputs, write_table},
    upload::{upload_files, ObjectStore, UploadStatus},
    utils::extract_match_id,
};

/// Object prefix for the batch report.
pub const REPORT_PREFIX: &str = "reports";

/// Optional upload target: a store plus where to put things in it.
pub struct Upload<'a> {
    pub store: &'a dyn ObjectStore,
    pub storage: &'a StorageConfig,
}

/// One written output file and what it holds.
struct WrittenFile {
    path: PathBuf,
    source_tables: usize,
    rows: usize,
}

/// Drives pages through pipeline, sink, prune and upload, one URL at a time.
/// A failing URL becomes a report row and never stops the batch.
pub struct MatchProcessor<'a> {
    pipeline: MatchPipeline,
    config: PipelineConfig,
    output_dir: PathBuf,
    upload: Option<Upload<'a>>,
}

impl<'a> MatchProcessor<'a> {
    pub fn new(config: &PipelineConfig, output: &OutputConfig) -> Self {
        Self {
            pipeline: MatchPipeline::new(config),
            config: config.clone(),
            output_dir: output.output_dir.clone(),
            upload: None,
        }
    }

    pub fn with_upload(mut self, store: &'a dyn ObjectStore, storage: &'a StorageConfig) -> Self {
        self.upload = Some(Upload { store, storage });
        self
    }

    pub fn process_url(&self, fetcher: &dyn HtmlFetcher, url: &str) -> MatchResult {
        info!("Processing: {}", url);
        if !extract_match_id(url).is_known() {
            warn!("Could not extract match ID from {}", url);
        }

        let html = match fetcher.fetch_html(url) {
            Ok(html) => html,
            Err(e) => return failed(url, ScrapeError::from(e)),
        };
        self.process_html(&html, url)
    }

    /// Runs everything after the fetch on HTML that is already in hand.
    pub fn process_html(&self, html: &str, url: &str) -> MatchResult {
        let document = match self.pipeline.parse_html(html, url) {
            Ok(document) => document,
            Err(e) => return failed(url, e),
        };

        let written = match self.write_outputs(&document) {
            Ok(written) => written,
            Err(e) => return failed(url, e),
        };

        let files: Vec<PathBuf> = written.iter().map(|w| w.path.clone()).collect();
        let mut result = MatchResult::success(
            url,
            &document.match_id,
            written.iter().map(|w| w.source_tables).sum(),
            written.iter().map(|w| w.rows).sum(),
            &files,
        );

        if let Some(upload) = &self.upload {
            let summary = upload_files(upload.store, upload.storage, &document.output_key, &files);
            result.set_upload(summary.status(), &summary.uploaded);
        }

        info!(
            "Match {}: {} tables, {} rows, upload {}",
            result.match_id, result.tables, result.rows, result.upload
        );
        result
    }

    /// Writes every table, then prunes by marker. Only retained files are
    /// returned.
    fn write_outputs(&self, document: &DocumentTables) -> Result<Vec<WrittenFile>, ScrapeError> {
        let mut written = Vec::with_capacity(document.tables.len());
        for table in &document.tables {
            let path = output_path(&self.output_dir, self.pipeline.layout(), &document.output_key, table);
            write_table(&path, table)?;
            written.push(WrittenFile {
                path,
                source_tables: table.source_tables,
                rows: table.row_count(),
            });
        }

        let Some(marker) = &self.config.keep_marker else {
            return Ok(written);
        };
        let kept = prune_outputs(written.iter().map(|w| w.path.clone()).collect(), marker);
        written.retain(|w| kept.contains(&w.path));
        if written.is_empty() {
            return Err(ScrapeError::AllPruned {
                marker: marker.clone(),
            });
        }
        Ok(written)
    }

    /// Processes every URL in order, pausing between requests.
    pub fn run_batch(
        &self,
        fetcher: &dyn HtmlFetcher,
        urls: &[String],
        mut on_done: impl FnMut(&MatchResult),
    ) -> Vec<MatchResult> {
        let delay = self.config.inter_request_delay();
        let mut results = Vec::with_capacity(urls.len());

        for (i, url) in urls.iter().enumerate() {
            info!("Processing URL {}/{}", i + 1, urls.len());
            let result = self.process_url(fetcher, url);
            on_done(&result);
            results.push(result);

            if i + 1 < urls.len() && !delay.is_zero() {
                info!("Waiting {} seconds before next request...", delay.as_secs());
                thread::sleep(delay);
            }
        }

        results
    }

    /// Writes the batch report and uploads it under `reports/` when storage
    /// is configured. Returns the report's URI if it was uploaded.
    pub fn finish_batch(&self, report_path: &Path, results: &[MatchResult]) -> anyhow::Result<Option<String>> {
        write_report(report_path, results)?;
        info!("Processing report saved to {}", report_path.display());

        let success_count = results.iter().filter(|r| r.is_success()).count();
        info!("{}/{} URLs successfully processed", success_count, results.len());

        let Some(upload) = &self.upload else {
            return Ok(None);
        };
        let upload_count = results
            .iter()
            .filter(|r| r.upload == UploadStatus::Success)
            .count();
        info!("{}/{} files successfully uploaded to {}", upload_count, success_count, upload.storage.bucket);

        let file_name = report_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "processing_report.csv".to_string());
        match upload.store.upload(report_path, &format!("{}/{}", REPORT_PREFIX, file_name)) {
            Ok(uri) => Ok(Some(uri)),
            Err(e) => {
                warn!("Error uploading report: {}", e);
                Ok(None)
            }
        }
    }
}

fn failed(url: &str, e: ScrapeError) -> MatchResult {
    error!("Error processing {}: {}", url, e);
    let status = if e.is_failure() {
        MatchStatus::Failed
    } else {
        MatchStatus::Error
    };
    MatchResult::unsuccessful(url, &extract_match_id(url), status, e.to_string())
}
