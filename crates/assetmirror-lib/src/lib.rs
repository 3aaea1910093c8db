pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod listing;
pub mod mirror;

pub use config::Config;
pub use error::AssetMirrorError;
