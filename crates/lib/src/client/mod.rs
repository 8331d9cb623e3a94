//! Client side of the session protocol.
//!
//! [`ApiClient`] keeps the credential cookies in a shared jar and replays
//! requests after a coalesced renewal ([`RenewalCoordinator`]).
//! [`SessionStore`] tracks the identity those cookies belong to.

mod api;
mod errors;
mod renewal;
mod session;

pub use api::{ApiClient, ApiRequest};
pub use errors::ClientError;
pub use renewal::{RenewalCoordinator, RenewalError, RenewalOutcome};
pub use session::{SessionState, SessionStore};
