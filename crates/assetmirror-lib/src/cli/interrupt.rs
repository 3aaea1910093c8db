use crate::mirror::CancellationHandle;
use tracing;

/// Cancels `cancellation` on the first Ctrl-C. Downloads already in flight still finish.
pub fn cancel_on_ctrl_c(cancellation: CancellationHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, waiting for in-flight downloads to finish...");
            cancellation.cancel();
        }
    });
}
