use anyhow::{Context, Result};
use google_cloud_storage::{
    client::{Client, ClientConfig},
    http::objects::upload::{Media, UploadObjectRequest, UploadType},
};
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path};
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::{config::StorageConfig, error::UploadError};

pub trait ObjectStore {
    /// Uploads a local file and returns the URI of the stored object.
    fn upload(&self, local_path: &Path, object_name: &str) -> Result<String, UploadError>;
}

/// Google Cloud Storage backed by application default credentials.
/// Owns a runtime so callers stay synchronous.
pub struct GcsStore {
    runtime: Runtime,
    client: Client,
    bucket: String,
}

impl GcsStore {
    pub fn new(bucket: &str) -> Result<Self> {
        let runtime = Runtime::new().context("Failed to create runtime for GCS uploads")?;
        let config = runtime
            .block_on(ClientConfig::default().with_auth())
            .context("authenticating to GCS")?;

        Ok(Self {
            runtime,
            client: Client::new(config),
            bucket: bucket.to_string(),
        })
    }
}

impl ObjectStore for GcsStore {
    fn upload(&self, local_path: &Path, object_name: &str) -> Result<String, UploadError> {
        let uri = gcs_uri(&self.bucket, object_name);
        let data = fs::read(local_path).map_err(|source| UploadError::Read {
            path: local_path.display().to_string(),
            source,
        })?;

        let request = UploadObjectRequest {
            bucket: self.bucket.clone(),
            ..Default::default()
        };
        let upload_type = UploadType::Simple(Media::new(object_name.to_string()));

        self.runtime
            .block_on(self.client.upload_object(&request, data, &upload_type))
            .map_err(|e| UploadError::Storage {
                uri: uri.clone(),
                message: e.to_string(),
            })?;

        info!("File {} uploaded to {}", local_path.display(), uri);
        Ok(uri)
    }
}

pub fn gcs_uri(bucket: &str, object_name: &str) -> String {
    format!("gs://{}/{}", bucket, object_name)
}

/// `<prefix>/<key>/<file name>`, where `key` names the page as in the
/// local output paths.
pub fn object_name_for(storage: &StorageConfig, key: &str, local_path: &Path) -> String {
    let file_name = local_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = storage.prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}/{}", key, file_name)
    } else {
        format!("{}/{}/{}", prefix, key, file_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    #[serde(rename = "Not attempted")]
    NotAttempted,
    Success,
    Partial,
    Failed,
}

impl UploadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadStatus::NotAttempted => "Not attempted",
            UploadStatus::Success => "Success",
            UploadStatus::Partial => "Partial",
            UploadStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file upload results for one URL.
#[derive(Debug, Default)]
pub struct UploadSummary {
    pub uploaded: Vec<String>,
    pub errors: Vec<UploadError>,
}

impl UploadSummary {
    pub fn status(&self) -> UploadStatus {
        match (self.uploaded.is_empty(), self.errors.is_empty()) {
            (true, true) => UploadStatus::NotAttempted,
            (false, true) => UploadStatus::Success,
            (false, false) => UploadStatus::Partial,
            (true, false) => UploadStatus::Failed,
        }
    }
}

/// Uploads each file, collecting failures instead of stopping.
pub fn upload_files(
    store: &dyn ObjectStore,
    storage: &StorageConfig,
    key: &str,
    files: &[impl AsRef<Path>],
) -> UploadSummary {
    let mut summary = UploadSummary::default();
    for file in files {
        let path = file.as_ref();
        let object_name = object_name_for(storage, key, path);
        match store.upload(path, &object_name) {
            Ok(uri) => summary.uploaded.push(uri),
            Err(e) => {
                warn!("Error uploading {}: {}", path.display(), e);
                summary.errors.push(e);
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, path::PathBuf};

    struct RecordingStore {
        fail_on: Option<&'static str>,
        objects: RefCell<Vec<String>>,
    }

    impl ObjectStore for RecordingStore {
        fn upload(&self, _local_path: &Path, object_name: &str) -> Result<String, UploadError> {
            let uri = gcs_uri("striker-project", object_name);
            if self.fail_on.is_some_and(|f| object_name.contains(f)) {
                return Err(UploadError::Storage {
                    uri,
                    message: "403 Forbidden".to_string(),
                });
            }
            self.objects.borrow_mut().push(object_name.to_string());
            Ok(uri)
        }
    }

    #[test]
    fn test_object_name_uses_output_key() {
        let storage = StorageConfig::new("striker-project");
        assert_eq!(
            object_name_for(&storage, "07f058d4", Path::new("match_data/match_07f058d4_player_stats.csv")),
            "match_data/07f058d4/match_07f058d4_player_stats.csv"
        );

        let storage = StorageConfig {
            bucket: "b".to_string(),
            prefix: "/".to_string(),
        };
        assert_eq!(object_name_for(&storage, "07f058d4", Path::new("x.csv")), "07f058d4/x.csv");
    }

    #[test]
    fn test_upload_failures_are_collected_per_file() {
        let store = RecordingStore {
            fail_on: Some("passing"),
            objects: RefCell::new(Vec::new()),
        };
        let files = vec![PathBuf::from("out/summary.csv"), PathBuf::from("out/passing.csv")];

        let summary = upload_files(
            &store,
            &StorageConfig::new("striker-project"),
            "07f058d4",
            &files,
        );

        assert_eq!(summary.uploaded, vec!["gs://striker-project/match_data/07f058d4/summary.csv"]);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.status(), UploadStatus::Partial);
        assert_eq!(store.objects.borrow().len(), 1);
    }

    #[test]
    fn test_upload_status() {
        assert_eq!(UploadSummary::default().status(), UploadStatus::NotAttempted);
        assert_eq!(UploadStatus::NotAttempted.to_string(), "Not attempted");
    }
}
