//! Menu management API for drinks, protected by [JSON Web Token](https://datatracker.ietf.org/doc/html/rfc7519)
//! bearer authorization.
//!
//! ## Overview
//!
//! Reading the menu is public. Seeing full recipes and changing the menu requires an access token issued by a
//! trusted signing authority (e.g. an Auth0 tenant) that grants the matching permission:
//!
//! | Route | Permission |
//! |---|---|
//! | `GET /drinks` | none |
//! | `GET /drinks-detail` | `get:drinks-detail` |
//! | `POST /drinks` | `post:drinks` |
//! | `PATCH /drinks/{id}` | `patch:drinks` |
//! | `DELETE /drinks/{id}` | `delete:drinks` |
//!
//! Every protected request runs the same pipeline before its handler sees it:
//!
//! 1. The bearer token is taken from the `Authorization` header.
//! 2. The token header's `kid` selects a key from the authority's
//!    [JWK set](https://datatracker.ietf.org/doc/html/rfc7517), fetched from `/.well-known/jwks.json`.
//! 3. The RS256 signature, expiry, audience and issuer are checked.
//! 4. The required permission must be listed in the token's `permissions` claim.
//!
//! The first failing step answers the request with an [`AuthError`], whose code and status tell the client
//! whether to fix the request (400) or to get a new token (401).
//!
//! ## Quickstart
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use drinks_api::{api, AuthConfig, Authorizer, InMemoryDrinkStore, RemoteJwkSet, TokenVerifier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AuthConfig::for_domain("your.tenant.auth0.com", "your.api.audience")?;
//!     let remote_jwk_set = RemoteJwkSet::builder(config.jwks_url()?)
//!         .with_timeout(Duration::from_secs(5))
//!         .build();
//!     let authorizer = Authorizer::new(TokenVerifier::new(remote_jwk_set, &config));
//!
//!     let router = api::router(Arc::new(InMemoryDrinkStore::new()), &authorizer);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```
//!
//! Other routers can be protected the same way with [`Authorizer::require`], and handlers receive the verified
//! claims through the [`Claims`] extractor.

pub mod api;
pub mod authorization;
pub mod claims;
pub mod config;
pub mod drinks;
pub mod token;

pub use authorization::{AuthorizationLayer, Authorizer, Claims};
pub use claims::ClaimSet;
pub use config::AuthConfig;
pub use drinks::{DrinkStore, InMemoryDrinkStore};
pub use error::{AuthError, ErrorBody, JwkSetError};
pub use jwk_set::JwkSet;
pub use remote_jwk_set::{RemoteJwkSet, RemoteJwkSetBuilder};
pub use token::TokenVerifier;

mod error;
mod jwk_set;
mod jwks_cache;
mod remote_jwk_set;

#[cfg(test)]
mod test_support;
