use assetmirror_lib::cli::{
    ResolvedCommand, cancel_on_ctrl_c, parse_args, resolve_command, run_fetch, run_mirror,
    run_sync,
};
use assetmirror_lib::error::AssetMirrorError;
use assetmirror_lib::mirror::CancellationHandle;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), AssetMirrorError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command, args.http)?;

    let cancellation = CancellationHandle::new();
    cancel_on_ctrl_c(cancellation.clone());

    match command {
        ResolvedCommand::Fetch(params) => run_fetch(params).await?,
        ResolvedCommand::Mirror(params) => {
            run_mirror(params, cancellation).await?;
        }
        ResolvedCommand::Sync(params) => {
            run_sync(params, cancellation).await?;
        }
    }

    Ok(())
}
