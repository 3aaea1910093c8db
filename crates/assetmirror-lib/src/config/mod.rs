mod loader;
mod model;

pub use loader::load_config;
pub use model::{
    AssetDef, Config, DEFAULT_GITHUB_API_URL, DEFAULT_PARALLELISM, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT, GithubConfig, HttpConfig, MirrorDef,
};
