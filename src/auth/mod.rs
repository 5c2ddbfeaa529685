//! Request gate and role gate.
//!
//! The request gate verifies the bearer access token on every request that is
//! not on the public allow-list and attaches the caller's identity to the
//! request. The role gate admits a route group only for a fixed set of roles.
//! Neither gate touches the database.

mod bearer;
mod errors;
mod middleware;
mod types;

pub use bearer::bearer_token;
pub use errors::GateError;
pub use middleware::{is_public_path, require_bearer, require_role};
pub use types::{AuthenticatedUser, Caller};
