use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to retrieve {url}: HTTP {status}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("no matching tables found")]
    NoMatch,
    #[error("matching tables contained no data rows")]
    NoRows,
    #[error("all outputs pruned by marker '{marker}'")]
    AllPruned { marker: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ScrapeError {
    /// Expected outcomes of scraping a page, as opposed to local faults.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ScrapeError::Fetch(_) | ScrapeError::NoMatch | ScrapeError::NoRows | ScrapeError::AllPruned { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to upload to {uri}: {message}")]
    Storage { uri: String, message: String },
}
