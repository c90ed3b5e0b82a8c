use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{types::MatchId, upload::UploadStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Success,
    /// The page was processed but yielded nothing usable.
    Failed,
    /// Something went wrong locally while handling the page.
    Error,
}

/// One row of the batch report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub url: String,
    pub match_id: String,
    pub status: MatchStatus,
    pub reason: Option<String>,
    pub tables: usize,
    pub rows: usize,
    pub output_files: String,
    pub upload: UploadStatus,
    pub uploaded_paths: String,
    pub processed_at: DateTime<Utc>,
}

impl MatchResult {
    pub fn success(url: &str, match_id: &MatchId, tables: usize, rows: usize, output_files: &[PathBuf]) -> Self {
        Self {
            url: url.to_string(),
            match_id: match_id.to_string(),
            status: MatchStatus::Success,
            reason: None,
            tables,
            rows,
            output_files: join_paths(output_files),
            upload: UploadStatus::NotAttempted,
            uploaded_paths: String::new(),
            processed_at: Utc::now(),
        }
    }

    pub fn unsuccessful(url: &str, match_id: &MatchId, status: MatchStatus, reason: String) -> Self {
        Self {
            url: url.to_string(),
            match_id: match_id.to_string(),
            status,
            reason: Some(reason),
            tables: 0,
            rows: 0,
            output_files: String::new(),
            upload: UploadStatus::NotAttempted,
            uploaded_paths: String::new(),
            processed_at: Utc::now(),
        }
    }

    pub fn set_upload(&mut self, status: UploadStatus, uploaded: &[String]) {
        self.upload = status;
        self.uploaded_paths = uploaded.join(";");
    }

    pub fn is_success(&self) -> bool {
        self.status == MatchStatus::Success
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(";")
}

pub fn write_report(path: &Path, results: &[MatchResult]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create report {}", path.display()))?;
    for result in results {
        wtr.serialize(result)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Reads URLs from `column` (matched case-insensitively) or, when no column
/// is given, from the first column. Blank cells are skipped.
pub fn read_urls(path: &Path, column: Option<&str>) -> Result<Vec<String>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Input file '{}' not found", path.display()))?;
    let headers = rdr.headers()?.clone();
    let idx = match column {
        Some(name) => headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| anyhow!("Column {} not found in {}", name, path.display()))?,
        None => 0,
    };

    let mut urls = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(url) = record.get(idx).map(str::trim).filter(|u| !u.is_empty()) {
            urls.push(url.to_string());
        }
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_urls_first_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fbref_urls.csv");
        fs::write(
            &path,
            "Match Report URL,Note\nhttps://fbref.com/en/matches/a/x,first\n,blank\n  https://fbref.com/en/matches/b/y  ,second\n",
        )
        .unwrap();

        let urls = read_urls(&path, None).unwrap();
        assert_eq!(urls, vec!["https://fbref.com/en/matches/a/x", "https://fbref.com/en/matches/b/y"]);
    }

    #[test]
    fn test_read_urls_named_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.csv");
        fs::write(&path, "id,url\n1,https://fbref.com/en/matches/a/x\n").unwrap();

        assert_eq!(read_urls(&path, Some("URL")).unwrap(), vec!["https://fbref.com/en/matches/a/x"]);
        assert!(read_urls(&path, Some("link")).is_err());
        assert!(read_urls(&dir.path().join("missing.csv"), None).is_err());
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processing_report.csv");
        let id = MatchId::Known("07f058d4".to_string());
        let mut ok = MatchResult::success("u1", &id, 2, 30, &[PathBuf::from("match_data/a.csv")]);
        ok.set_upload(UploadStatus::Success, &["gs://b/match_data/07f058d4/a.csv".to_string()]);
        let failed = MatchResult::unsuccessful("u2", &MatchId::Unknown, MatchStatus::Failed, "no matching tables found".to_string());

        write_report(&path, &[ok, failed]).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(
            headers,
            vec!["url", "match_id", "status", "reason", "tables", "rows", "output_files", "upload", "uploaded_paths", "processed_at"]
        );
        let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&records[0][2], "Success");
        assert_eq!(&records[0][7], "Success");
        assert_eq!(&records[0][8], "gs://b/match_data/07f058d4/a.csv");
        assert_eq!(&records[1][1], "unknown");
        assert_eq!(&records[1][2], "Failed");
        assert_eq!(&records[1][3], "no matching tables found");
        assert_eq!(&records[1][7], "Not attempted");
    }
}
