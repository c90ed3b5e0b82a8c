use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use std::{fs, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fbref_match_stats_scraper::{
    config::{OutputLayout, ScraperConfig, StorageConfig},
    discovery::{discover_match_urls, write_url_list, DEFAULT_SCHEDULE_TABLE_ID},
    fetch::WebHtmlFetcher,
    processor::MatchProcessor,
    report::{read_urls, MatchResult},
    selector::SelectionPolicy,
    types::ColumnSignature,
    upload::{GcsStore, ObjectStore},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Scrape per-player match statistics from FBref match reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Process every match report URL listed in a CSV file
    Run {
        /// CSV file with one match report URL per row
        #[arg(short, long)]
        input: PathBuf,
        /// Column holding the URLs (defaults to the first column)
        #[arg(long)]
        url_column: Option<String>,
        /// Where to write the processing report
        #[arg(long)]
        report: Option<PathBuf>,
        /// Only process the first N URLs
        #[arg(short, long)]
        limit: Option<usize>,
        #[command(flatten)]
        options: PipelineArgs,
    },
    /// Process a single match report URL
    Scrape {
        #[arg(short, long)]
        url: String,
        #[command(flatten)]
        options: PipelineArgs,
    },
    /// Process a saved match report page
    ProcessFile {
        /// Path to the HTML file to process
        #[arg(short, long)]
        file: PathBuf,
        /// URL the page was saved from, used for the match id
        #[arg(short, long)]
        url: String,
        #[command(flatten)]
        options: PipelineArgs,
    },
    /// Collect match report URLs from a competition schedule page
    Discover {
        #[arg(short, long)]
        url: String,
        #[arg(long, default_value = DEFAULT_SCHEDULE_TABLE_ID)]
        table_id: String,
        #[arg(short, long, default_value = "match_report_urls.csv")]
        output: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct PipelineArgs {
    /// JSON config file, applied before environment variables and flags
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// GCS bucket to upload results to
    #[arg(long)]
    bucket: Option<String>,
    #[arg(long)]
    prefix: Option<String>,
    /// Keep every table on the page instead of matching a column signature
    #[arg(long, conflicts_with = "signature")]
    accept_all: bool,
    /// Comma-separated columns a table must contain to be kept
    #[arg(long)]
    signature: Option<String>,
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,
    /// Only keep output files whose name contains this marker
    #[arg(long)]
    keep_marker: Option<String>,
    /// Write tables even when they have no data rows
    #[arg(long)]
    keep_empty: bool,
    /// Seconds to wait between requests
    #[arg(long)]
    delay_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LayoutArg {
    Combined,
    PerTable,
}

impl From<LayoutArg> for OutputLayout {
    fn from(layout: LayoutArg) -> Self {
        match layout {
            LayoutArg::Combined => OutputLayout::Combined,
            LayoutArg::PerTable => OutputLayout::PerTable,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ScraperConfig> {
    let mut config = match path {
        Some(path) => ScraperConfig::from_file(path)?,
        None => ScraperConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

impl PipelineArgs {
    fn into_config(self) -> Result<ScraperConfig> {
        let mut config = load_config(self.config.as_ref())?;

        if let Some(dir) = self.output_dir {
            config.output.output_dir = dir;
        }
        if let Some(bucket) = self.bucket {
            config.storage.get_or_insert_with(|| StorageConfig::new("")).bucket = bucket;
        }
        if let (Some(prefix), Some(storage)) = (self.prefix, config.storage.as_mut()) {
            storage.prefix = prefix;
        }
        if self.accept_all {
            config.pipeline.selection = SelectionPolicy::AcceptAll;
        } else if let Some(signature) = self.signature {
            config.pipeline.selection = SelectionPolicy::SignatureMatch(ColumnSignature::parse_list(&signature));
        }
        if let Some(layout) = self.layout {
            config.pipeline.layout = layout.into();
        }
        if let Some(marker) = self.keep_marker {
            config.pipeline.keep_marker = Some(marker);
        }
        if self.keep_empty {
            config.pipeline.keep_empty_tables = true;
        }
        if let Some(delay) = self.delay_secs {
            config.pipeline.inter_request_delay_secs = delay;
        }

        Ok(config)
    }
}

fn connect_store(config: &ScraperConfig) -> Result<Option<GcsStore>> {
    match &config.storage {
        Some(storage) => {
            info!("Uploading results to gs://{}/{}", storage.bucket, storage.prefix);
            Ok(Some(GcsStore::new(&storage.bucket)?))
        }
        None => Ok(None),
    }
}

fn processor<'a>(store: Option<&'a GcsStore>, config: &'a ScraperConfig) -> MatchProcessor<'a> {
    let processor = MatchProcessor::new(&config.pipeline, &config.output);
    match (store, &config.storage) {
        (Some(store), Some(storage)) => processor.with_upload(store as &dyn ObjectStore, storage),
        _ => processor,
    }
}

fn log_result(result: &MatchResult) {
    match &result.reason {
        Some(reason) => warn!("{} {:?}: {}", result.url, result.status, reason),
        None => info!("{} processed: {} rows in {}", result.url, result.rows, result.output_files),
    }
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            url_column,
            report,
            limit,
            options,
        } => {
            let config = options.into_config()?;
            let mut urls = read_urls(&input, url_column.as_deref())?;
            if let Some(limit) = limit {
                urls.truncate(limit);
            }
            info!("Found {} URLs to process", urls.len());

            let fetcher = WebHtmlFetcher::new(&config.scraping)?;
            let store = connect_store(&config)?;
            let processor = processor(store.as_ref(), &config);

            let pb = ProgressBar::new(urls.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} matches ({eta}) {msg}")?,
            );
            let results = processor.run_batch(&fetcher, &urls, |result| {
                pb.set_message(result.match_id.clone());
                pb.inc(1);
            });
            pb.finish();

            let report_path = report.unwrap_or_else(|| config.output.report_file.clone());
            if let Some(uri) = processor.finish_batch(&report_path, &results)? {
                info!("Report uploaded to {}", uri);
            }
        }
        Commands::Scrape { url, options } => {
            let config = options.into_config()?;
            let fetcher = WebHtmlFetcher::new(&config.scraping)?;
            let store = connect_store(&config)?;
            let result = processor(store.as_ref(), &config).process_url(&fetcher, &url);
            log_result(&result);
        }
        Commands::ProcessFile { file, url, options } => {
            let config = options.into_config()?;
            let html = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let store = connect_store(&config)?;
            let result = processor(store.as_ref(), &config).process_html(&html, &url);
            log_result(&result);
        }
        Commands::Discover {
            url,
            table_id,
            output,
            config,
        } => {
            let config = load_config(config.as_ref())?;
            let fetcher = WebHtmlFetcher::new(&config.scraping)?;
            let urls = discover_match_urls(&fetcher, &url, &table_id)?;
            write_url_list(&output, &urls)?;
        }
    }

    Ok(())
}
