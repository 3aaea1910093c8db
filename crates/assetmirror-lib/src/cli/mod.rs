mod args;
mod fetch;
mod interrupt;
mod mirror;
mod params;
mod resolved_command;
mod sync;

pub use args::{Args, Command, HttpOverrides, parse_args};
pub use fetch::run_fetch;
pub use interrupt::cancel_on_ctrl_c;
pub use mirror::run_mirror;
pub use params::{AssetParams, FetchParams, MirrorParams, NetworkParams, SyncParams};
pub use resolved_command::{ResolvedCommand, resolve_command};
pub use sync::run_sync;
