use crate::cli::FetchParams;
use crate::error::AssetMirrorError;
use crate::fetch::AssetFetcher;
use tracing;

pub async fn run_fetch(params: FetchParams) -> Result<(), AssetMirrorError> {
    let FetchParams {
        url,
        output_dir,
        network,
    } = params;

    let fetcher = AssetFetcher::new(network.fetch_options)?;
    let report = fetcher.fetch(url.as_str(), &output_dir).await?;

    tracing::info!(
        "Wrote {} bytes to {} (HTTP {})",
        report.bytes,
        report.path.display(),
        report.status
    );
    Ok(())
}
