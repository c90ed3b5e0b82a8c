use anyhow::{anyhow, Context, Result};
use scraper::{Html, Selector};
use std::path::Path;
use tracing::info;
use url::Url;

use crate::fetch::HtmlFetcher;

pub const DEFAULT_SCHEDULE_TABLE_ID: &str = "sched_all";
pub const URL_COLUMN_HEADER: &str = "Match Report URL";

/// Collects the "Match Report" links from a competition schedule page.
pub fn scrape_match_report_urls(html: &str, page_url: &str, table_id: &str) -> Result<Vec<String>> {
    let base = Url::parse(page_url).with_context(|| format!("Invalid page URL {}", page_url))?;
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let link_selector = Selector::parse(r#"td[data-stat="match_report"] a[href]"#).unwrap();

    let table = document
        .select(&table_selector)
        .find(|t| t.value().attr("id") == Some(table_id))
        .ok_or_else(|| anyhow!("Could not find the schedule table '{}' on the page", table_id))?;

    let mut urls = Vec::new();
    for row in table.select(&row_selector) {
        let href = row
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"));
        if let Some(href) = href {
            match base.join(href) {
                Ok(url) => urls.push(url.to_string()),
                Err(e) => info!("Skipping unparseable match report link {}: {}", href, e),
            }
        }
    }

    info!("Found {} match report URLs", urls.len());
    Ok(urls)
}

pub fn discover_match_urls(fetcher: &dyn HtmlFetcher, page_url: &str, table_id: &str) -> Result<Vec<String>> {
    info!("Sending request to {}...", page_url);
    let html = fetcher.fetch_html(page_url)?;
    scrape_match_report_urls(&html, page_url, table_id)
}

pub fn write_url_list(path: &Path, urls: &[String]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    wtr.write_record([URL_COLUMN_HEADER])?;
    for url in urls {
        wtr.write_record([url])?;
    }
    wtr.flush()?;
    info!("URLs have been saved to {}", path.display());
    Ok(())
}
