use crate::config::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, HttpConfig};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// What to do with the body of a non-success response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Skip the write and report [`FetchError::RemoteStatus`].
    #[default]
    Reject,
    /// Write whatever body came back, as the old download script did.
    WriteBody,
}

#[derive(Clone, Debug)]
pub struct FetchOptions {
    pub user_agent: String,
    pub timeout: Duration,
    pub status_policy: StatusPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            status_policy: StatusPolicy::default(),
        }
    }
}

impl From<&HttpConfig> for FetchOptions {
    fn from(http: &HttpConfig) -> Self {
        Self {
            user_agent: http.user_agent.clone(),
            timeout: Duration::from_secs(http.timeout_secs),
            status_policy: http.status_policy,
        }
    }
}

/// A single file transfer: where to get it and where it lands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadTask {
    pub source_url: Url,
    pub destination_dir: PathBuf,
    pub file_name: String,
}

impl DownloadTask {
    pub fn output_path(&self) -> PathBuf {
        self.destination_dir.join(&self.file_name)
    }
}

#[derive(Clone, Debug)]
pub struct FetchReport {
    pub path: PathBuf,
    pub status: StatusCode,
    pub bytes: u64,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid asset URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Transfer of {url} failed: {source}")]
    Transfer {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with {status}")]
    RemoteStatus { url: Url, status: StatusCode },

    #[error("Filesystem operation on {path} failed: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
