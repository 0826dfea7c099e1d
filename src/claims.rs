use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Decoded payload of a verified access token.
///
/// Only produced by [`TokenVerifier::verify`](crate::token::TokenVerifier::verify).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSet {
    pub iss: String,
    pub sub: String,
    pub aud: Audience,
    /// Authorized party, the client the token was issued to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    /// Grant type, present on machine-to-machine tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gty: Option<String>,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// Claims without a dedicated field, e.g. `scope`.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ClaimSet {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// The `aud` claim, which the token format allows to be a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(single) => single == audience,
            Audience::Multiple(multiple) => multiple.iter().any(|a| a == audience),
        }
    }
}

/// Checks that `claims` grant `permission`.
///
/// An empty `permission` only requires the caller to be authenticated. Otherwise the permission must appear
/// verbatim in the `permissions` claim.
pub fn check_permission(permission: &str, claims: &ClaimSet) -> Result<(), AuthError> {
    if permission.is_empty() || claims.has_permission(permission) {
        return Ok(());
    }
    Err(AuthError::UnauthorizedAction)
}
