//! Serve command - runs the Tessera session server.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use signal_hook::flag as signal_flag;
use tracing_subscriber::EnvFilter;

use tessera::{
    SystemClock,
    config::AuthConfig,
    constants::DEFAULT_ADMIN_USERNAME,
    keys::{KeyRing, ensure_keys},
    server::{AppState, router},
    user::{InMemoryUserDirectory, SeedOutcome, UserDirectory, seed_admin},
};

use crate::backend::create_key_store;
use crate::cli::ServeArgs;

/// Run the Tessera server
pub async fn run(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tessera=info".parse()?))
        .init();

    let store = create_key_store(args).await?;

    // Serving without keys would reject every session; refuse to start instead.
    let report = ensure_keys(store.as_ref()).await.map_err(|e| {
        tracing::error!("Key initialization failed: {e}");
        e
    })?;
    tracing::info!(
        generated_local_key = report.generated_local_key,
        generated_refresh_pair = report.generated_refresh_pair,
        "Key material ready"
    );

    let users: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::new());
    if let Some(password) = &args.admin_password {
        match seed_admin(users.as_ref(), DEFAULT_ADMIN_USERNAME, password).await? {
            SeedOutcome::Created(identity) => {
                tracing::info!(id = identity.id, "Seeded admin account")
            }
            SeedOutcome::Skipped => tracing::info!("Admin account already present"),
        }
    }

    let config = AuthConfig {
        dev_mode: args.dev_mode,
        secure_cookies: args.secure_cookies,
        ..AuthConfig::default()
    };
    if config.dev_mode {
        tracing::warn!("Dev mode enabled: /dev/init-admin is reachable");
    }

    let mut state = AppState::new(users, KeyRing::new(store), Arc::new(SystemClock), config);
    if let Some(password) = &args.admin_password {
        state = state.with_bootstrap_password(password.clone());
    }
    let app = router(state);

    // Set up graceful shutdown signal handling
    let term_signal = Arc::new(AtomicBool::new(false));
    for signal in signal_hook::consts::TERM_SIGNALS {
        signal_flag::register(*signal, Arc::clone(&term_signal))?;
    }

    // Bind server
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    println!("Tessera server listening on http://{local_addr}");
    println!();
    println!("Available endpoints:");
    println!("  POST  /auth/login           - Password login, sets session cookies");
    println!("  POST  /auth/refresh         - Renew the access cookie");
    println!("  POST  /auth/logout          - Clear session cookies");
    println!("  GET   /auth/me              - Current identity");
    println!("  PATCH /auth/change-password - Change own password");
    println!("  GET   /admin/whoami         - Current identity (admins only)");
    println!("  POST  /dev/init-admin       - Seed admin account (dev mode only)");
    println!("  GET   /health               - Health check");
    println!();
    println!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !term_signal.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    println!("Server shut down");
    Ok(())
}
