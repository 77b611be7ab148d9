/*! Integration tests for Gymdex.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - account: register / authenticate / change-password / delete / list flows
 * - session: session lifecycle against the SQLite store
 * - local: the SQLite backend itself (round trips, unique index, corrupt rows)
 * - remote: the document-API backend against a stub HTTP server
 * - hybrid: remote-preferring fallback behavior
 * - sync_flow: offline registration followed by reconciliation
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("gymdex=debug".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod account;
mod hybrid;
mod local;
mod session;
mod sync_flow;
