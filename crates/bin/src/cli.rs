//! CLI argument definitions for the Tessera binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Key store backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KeyStoreKind {
    /// SQLite database (default)
    Sqlite,
    /// PostgreSQL database (shared by replicated servers)
    Postgres,
    /// In-memory; keys are lost on restart, invalidating every session
    Inmemory,
}

/// Tessera session server
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(about = "Tessera: password sessions with encrypted access and signed refresh cookies")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Tessera server
    Serve(ServeArgs),
    /// Check health of a running Tessera server
    Health(HealthArgs),
    /// Log in to a running server and print the session identity
    Whoami(WhoamiArgs),
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "TESSERA_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "TESSERA_HOST")]
    pub host: String,

    /// Key store backend to use
    #[arg(short, long, default_value = "sqlite", env = "TESSERA_KEYSTORE")]
    pub keystore: KeyStoreKind,

    /// Data directory for storage files.
    /// For SQLite: stores tessera-keys.db
    #[arg(short = 'D', long, env = "TESSERA_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when keystore=postgres)
    #[arg(long, env = "TESSERA_POSTGRES_URL")]
    pub postgres_url: Option<String>,

    /// Enable the /dev/init-admin bootstrap route
    #[arg(long, env = "TESSERA_DEV_MODE")]
    pub dev_mode: bool,

    /// Create the `admin` account at startup with this password if it does not exist
    #[arg(long, env = "TESSERA_ADMIN_PASSWORD")]
    pub admin_password: Option<String>,

    /// Mark credential cookies `Secure` (serve behind HTTPS)
    #[arg(long, env = "TESSERA_SECURE_COOKIES")]
    pub secure_cookies: bool,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Base URL of the server to check
    #[arg(short, long, default_value = "http://127.0.0.1:3000", env = "TESSERA_URL")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}

/// Arguments for the whoami command
#[derive(clap::Args, Debug)]
pub struct WhoamiArgs {
    /// Base URL of the server
    #[arg(short, long, default_value = "http://127.0.0.1:3000", env = "TESSERA_URL")]
    pub url: String,

    /// Username to log in as
    #[arg(short = 'U', long, default_value = "admin")]
    pub username: String,

    /// Password to log in with
    #[arg(short = 'P', long, env = "TESSERA_PASSWORD")]
    pub password: String,
}
