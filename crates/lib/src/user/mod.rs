//! Accounts as seen by the session layer.
//!
//! Provides the [`Identity`] model, Argon2id password hashing, and the
//! [`UserDirectory`] collaborator used for every identity lookup.

pub mod crypto;
pub mod directory;
pub mod errors;
pub mod types;

pub use directory::{InMemoryUserDirectory, SeedOutcome, UserDirectory, seed_admin};
pub use errors::UserError;
pub use types::{Identity, NewUser, Role, UserRecord};
