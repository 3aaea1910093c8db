use crate::fetch::StatusPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_USER_AGENT: &str = "XY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PARALLELISM: usize = 8;
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub assets: Vec<AssetDef>,
    #[serde(default)]
    pub mirrors: Vec<MirrorDef>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub parallelism: usize,
    pub status_policy: StatusPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            parallelism: DEFAULT_PARALLELISM,
            status_policy: StatusPolicy::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct GithubConfig {
    pub api_url: String,
    /// Falls back to `GITHUB_TOKEN` when unset.
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            token: None,
        }
    }
}

/// A single file downloaded into a directory, named after the last URL segment.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssetDef {
    pub url: String,
    pub destination: PathBuf,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MirrorDef {
    /// `owner/repo`
    pub repository: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    pub destination: PathBuf,
}
