use crate::cli::SyncParams;
use crate::cli::mirror::{build_walker, conclude};
use crate::error::AssetMirrorError;
use crate::mirror::{CancellationHandle, MirrorFailure, MirrorReport};
use tracing;

/// Fetches the configured single assets, then mirrors each configured directory.
pub async fn run_sync(
    params: SyncParams,
    cancellation: CancellationHandle,
) -> Result<MirrorReport, AssetMirrorError> {
    let SyncParams {
        assets,
        mirrors,
        network,
    } = params;

    let walker = build_walker(network, cancellation.clone())?;
    let mut report = MirrorReport::default();

    tracing::info!("Fetching {} assets...", assets.len());
    for asset in assets {
        if cancellation.is_cancelled() {
            report.skipped += 1;
            continue;
        }
        match walker
            .fetcher()
            .fetch(asset.url.as_str(), &asset.destination)
            .await
        {
            Ok(fetched) => report.record_fetch(fetched),
            Err(source) => report.failures.push(MirrorFailure::Fetch {
                url: asset.url,
                source,
            }),
        }
    }

    tracing::info!("Mirroring {} directories...", mirrors.len());
    for request in mirrors {
        report.merge(walker.mirror(&request).await);
    }

    conclude(&report, &cancellation)?;
    Ok(report)
}
