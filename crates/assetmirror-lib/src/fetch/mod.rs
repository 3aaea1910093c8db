mod fetcher;
mod types;

pub use fetcher::{AssetFetcher, build_http_client, file_name_from_url, parse_asset_url};
pub use types::{DownloadTask, FetchError, FetchOptions, FetchReport, StatusPolicy};
