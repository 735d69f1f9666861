//! Test logging bootstrap.
//!
//! Call [`init_test_logging`] once per test binary to see the harness's
//! `tracing` output under `cargo test`:
//!
//! ```ignore
//! #[ctor::ctor]
//! fn setup() {
//!     u6fs_harness::testing::init_test_logging();
//! }
//! ```
//!
//! Safe to call multiple times. The filter defaults to `info` and can be
//! overridden through `U6FS_HARNESS_TEST_LOG`.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("U6FS_HARNESS_TEST_LOG")
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
