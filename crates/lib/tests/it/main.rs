/*! Integration tests for Tessera.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - keys: Key material shared between server instances
 * - token: Credentials minted by one key ring and read by another
 * - auth: Issuer and gate working together over real key stores
 * - server: The HTTP surface, driven with a plain reqwest client
 * - client: Session renewal and coalescing against a live server
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("tessera=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod auth;
mod client;
mod helpers;
mod token;
