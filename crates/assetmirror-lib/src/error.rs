use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetMirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to fetch asset: {0}")]
    Fetch(#[from] crate::fetch::FetchError),

    #[error("Failed to list remote directory: {0}")]
    Listing(#[from] crate::listing::ListingError),

    #[error("Invalid command line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("Nothing to do: {path} defines no assets and no mirrors")]
    EmptyConfig { path: PathBuf },

    #[error("{failed} of {total} mirror tasks failed")]
    MirrorIncomplete { failed: usize, total: usize },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
