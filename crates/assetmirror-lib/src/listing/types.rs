use reqwest::{StatusCode, Url};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use thiserror::Error;

/// One item of a remote directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Full remote path, including the queried directory.
    pub path: String,
    /// Present for files only.
    pub download_url: Option<Url>,
}

impl RemoteEntry {
    pub fn file(path: impl Into<String>, download_url: Url) -> Self {
        Self {
            path: path.into(),
            download_url: Some(download_url),
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            download_url: None,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.download_url.is_none()
    }
}

/// `owner/name` identifier of a hosted repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepositoryId {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepositoryId {
    type Err = ListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ListingError::InvalidRepository {
            repository: s.to_string(),
        };
        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Invalid repository identifier {repository:?}, expected owner/name")]
    InvalidRepository { repository: String },

    #[error("Invalid listing API URL {url}: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("Listing request to {url} failed: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with {status}: {message}")]
    Status {
        url: Url,
        status: StatusCode,
        message: String,
    },

    #[error("Malformed listing from {url}: {reason}")]
    Malformed { url: Url, reason: String },

    /// Submodules and symlinks have no download URL but cannot be listed either.
    #[error("Remote path {path} is not a listable directory")]
    NotADirectory { path: String },
}

/// A service that lists the immediate children of a remote directory.
pub trait ListingSource: Send + Sync {
    fn list(
        &self,
        repository: &RepositoryId,
        git_ref: Option<&str>,
        path: &str,
    ) -> impl Future<Output = Result<Vec<RemoteEntry>, ListingError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_id_parses_owner_and_name() {
        let repo: RepositoryId = "KhronosGroup/glTF-Sample-Models".parse().unwrap();
        assert_eq!(repo.owner, "KhronosGroup");
        assert_eq!(repo.name, "glTF-Sample-Models");
        assert_eq!(repo.to_string(), "KhronosGroup/glTF-Sample-Models");
    }

    #[test]
    fn test_repository_id_rejects_malformed() {
        for value in ["", "org", "org/", "/repo", "org/repo/extra"] {
            assert!(
                value.parse::<RepositoryId>().is_err(),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_entry_without_download_url_is_directory() {
        assert!(RemoteEntry::directory("2.0/Sample/textures").is_directory());
        let url = Url::parse("https://raw.example.com/2.0/Sample/model.gltf").unwrap();
        assert!(!RemoteEntry::file("2.0/Sample/model.gltf", url).is_directory());
    }
}
