use crate::fetch::{FetchError, FetchReport};
use crate::listing::{ListingError, RepositoryId};
use reqwest::Url;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MirrorRequest {
    pub repository: RepositoryId,
    /// Root of the remote subtree, without leading or trailing slashes. Empty means the
    /// repository root.
    pub remote_subdir: String,
    pub git_ref: Option<String>,
    pub local_root: PathBuf,
}

impl MirrorRequest {
    pub fn new(
        repository: RepositoryId,
        remote_subdir: impl AsRef<str>,
        local_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repository,
            remote_subdir: remote_subdir.as_ref().trim_matches('/').to_string(),
            git_ref: None,
            local_root: local_root.into(),
        }
    }

    pub fn with_ref(mut self, git_ref: Option<String>) -> Self {
        self.git_ref = git_ref;
        self
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RemapError {
    #[error("{path} is not under {root:?}")]
    OutsideRoot { path: String, root: String },

    #[error("{path} has no file name below {root:?}")]
    MissingFileName { path: String, root: String },

    #[error("{path} contains a relative segment")]
    UnsafeSegment { path: String },
}

#[derive(Error, Debug)]
pub enum MirrorFailure {
    #[error("Listing {subdir:?} failed: {source}")]
    Listing {
        subdir: String,
        #[source]
        source: ListingError,
    },

    #[error("Fetching {url} failed: {source}")]
    Fetch {
        url: Url,
        #[source]
        source: FetchError,
    },

    #[error("Cannot place {path}: {source}")]
    Remap {
        path: String,
        #[source]
        source: RemapError,
    },
}

/// Outcome of one mirror run. Failures are per branch or per file; everything else that
/// could be mirrored has been.
#[derive(Debug, Default)]
pub struct MirrorReport {
    pub files: Vec<PathBuf>,
    pub bytes: u64,
    pub directories_listed: usize,
    /// Jobs not started because the run was cancelled.
    pub skipped: usize,
    pub failures: Vec<MirrorFailure>,
}

impl MirrorReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.skipped == 0
    }

    pub fn task_count(&self) -> usize {
        self.files.len() + self.directories_listed + self.skipped + self.failures.len()
    }

    pub(crate) fn record_fetch(&mut self, report: FetchReport) {
        self.bytes += report.bytes;
        self.files.push(report.path);
    }

    pub fn merge(&mut self, other: MirrorReport) {
        self.files.extend(other.files);
        self.bytes += other.bytes;
        self.directories_listed += other.directories_listed;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }
}
