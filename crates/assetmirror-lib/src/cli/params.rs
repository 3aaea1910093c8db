use crate::fetch::FetchOptions;
use crate::mirror::MirrorRequest;
use reqwest::Url;
use std::path::PathBuf;

/// HTTP and listing settings shared by every network-facing command.
#[derive(Debug, Clone)]
pub struct NetworkParams {
    pub fetch_options: FetchOptions,
    pub parallelism: usize,
    pub api_url: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FetchParams {
    pub url: Url,
    pub output_dir: PathBuf,
    pub network: NetworkParams,
}

#[derive(Debug, Clone)]
pub struct MirrorParams {
    pub request: MirrorRequest,
    pub network: NetworkParams,
}

#[derive(Debug, Clone)]
pub struct AssetParams {
    pub url: Url,
    pub destination: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SyncParams {
    pub assets: Vec<AssetParams>,
    pub mirrors: Vec<MirrorRequest>,
    pub network: NetworkParams,
}
