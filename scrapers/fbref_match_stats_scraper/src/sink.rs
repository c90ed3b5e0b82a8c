use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::{
    config::OutputLayout,
    error::ScrapeError,
    types::EnrichedTable,
    utils::sanitize_file_stem,
};

pub const COMBINED_FILE_SUFFIX: &str = "player_stats";

/// Where a table is written under `output_dir` for the given layout. `key`
/// names the page, see [`crate::utils::output_key`].
pub fn output_path(output_dir: &Path, layout: OutputLayout, key: &str, table: &EnrichedTable) -> PathBuf {
    match layout {
        OutputLayout::Combined => combined_path(output_dir, key),
        OutputLayout::PerTable => output_dir
            .join(sanitize_file_stem(key))
            .join(format!("{}.csv", sanitize_file_stem(&table.name))),
    }
}

pub fn combined_path(output_dir: &Path, key: &str) -> PathBuf {
    output_dir.join(format!(
        "match_{}_{}.csv",
        sanitize_file_stem(key),
        COMBINED_FILE_SUFFIX
    ))
}

pub fn write_table(path: &Path, table: &EnrichedTable) -> Result<(), ScrapeError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;

    info!("Saved {} rows to {}", table.row_count(), path.display());
    Ok(())
}

/// Reads back a file written by [`write_table`] as `(columns, rows)`.
pub fn read_table(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>), ScrapeError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let columns = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok((columns, rows))
}

/// Deletes every file whose name does not contain `marker` and returns the
/// ones that were kept.
pub fn prune_outputs(files: Vec<PathBuf>, marker: &str) -> Vec<PathBuf> {
    let mut kept = Vec::new();
    for path in files {
        let name_matches = path
            .file_name()
            .map(|name| name.to_string_lossy().contains(marker))
            .unwrap_or(false);
        if name_matches {
            kept.push(path);
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => debug!("Removed {} (no '{}' in name)", path.display(), marker),
            Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
        }
    }
    kept
}
