use crate::cli::{MirrorParams, NetworkParams};
use crate::error::AssetMirrorError;
use crate::fetch::AssetFetcher;
use crate::listing::GithubContentsClient;
use crate::mirror::{CancellationHandle, MirrorReport, RemoteTreeWalker};
use tracing;

pub(crate) fn build_walker(
    network: NetworkParams,
    cancellation: CancellationHandle,
) -> Result<RemoteTreeWalker<GithubContentsClient>, AssetMirrorError> {
    let fetcher = AssetFetcher::new(network.fetch_options)?;
    let listing =
        GithubContentsClient::new(fetcher.client().clone(), &network.api_url, network.token)?;

    Ok(RemoteTreeWalker::new(listing, fetcher)
        .with_parallelism(network.parallelism)
        .with_cancellation(cancellation))
}

/// Turns a finished report into the command result, logging each failure.
pub(crate) fn conclude(
    report: &MirrorReport,
    cancellation: &CancellationHandle,
) -> Result<(), AssetMirrorError> {
    for failure in &report.failures {
        tracing::error!("{}", failure);
    }

    if cancellation.is_cancelled() && report.skipped > 0 {
        tracing::warn!(
            "Cancelled with {} tasks not started, {} files written",
            report.skipped,
            report.files.len()
        );
        return Err(AssetMirrorError::Cancelled);
    }

    if !report.failures.is_empty() {
        return Err(AssetMirrorError::MirrorIncomplete {
            failed: report.failures.len(),
            total: report.task_count(),
        });
    }

    tracing::info!(
        "Mirrored {} files ({} bytes)",
        report.files.len(),
        report.bytes
    );
    Ok(())
}

pub async fn run_mirror(
    params: MirrorParams,
    cancellation: CancellationHandle,
) -> Result<MirrorReport, AssetMirrorError> {
    let MirrorParams { request, network } = params;

    let walker = build_walker(network, cancellation.clone())?;
    let report = walker.mirror(&request).await;

    conclude(&report, &cancellation)?;
    Ok(report)
}
