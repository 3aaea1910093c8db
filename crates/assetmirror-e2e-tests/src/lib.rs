mod test_utils;

pub use test_utils::{FixtureServer, FixtureTree, RecordedRequest, collect_files};

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("assetmirror_lib=debug,assetmirror_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
