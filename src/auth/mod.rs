//! Credential checks for the HTTP layer.
//!
//! Two token kinds: short-lived access tokens (signed JWTs, stateless) and
//! long-lived refresh tokens (opaque, database-tracked, revocable). The
//! payment provider's webhook authenticates with a static API key instead.

mod errors;
mod extractors;
mod gateway;
mod header;
mod state;

pub use errors::{ApiAuthError, AuthError};
pub use extractors::{ApiKeyAuth, Auth, AuthenticatedUser};
pub use gateway::{AuthGateway, LoginOutcome};
pub use header::{
    API_KEY_SCHEME, BEARER_SCHEME, CredentialError, api_key_from_headers, bearer_from_headers,
    extract_api_key, extract_bearer,
};
pub use state::HasAuthGateway;
