mod cancel;
mod remap;
mod types;
mod walker;

pub use cancel::CancellationHandle;
pub use remap::{download_task, remap_entry_path};
pub use types::{MirrorFailure, MirrorReport, MirrorRequest, RemapError};
pub use walker::RemoteTreeWalker;
