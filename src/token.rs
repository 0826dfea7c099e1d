use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use http::HeaderMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::AlgorithmParameters;
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

use crate::claims::ClaimSet;
use crate::config::AuthConfig;
use crate::jwk_set::JwkSet;
use crate::AuthError;

/// Extracts the bearer token from the `Authorization` header.
///
/// The header must start with the `Bearer` scheme followed by a single space; the scheme name is matched
/// case-insensitively as HTTP requires. Everything after it is the token.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let authorization = headers
        .typed_try_get::<Authorization<Bearer>>()
        .map_err(|_| AuthError::MalformedHeader)?
        .ok_or(AuthError::NoTokenHeader)?;

    let token = authorization.token().trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token.to_string())
}

/// Verifies access tokens against the signing authority's key set.
#[derive(Clone)]
pub struct TokenVerifier {
    jwk_set: JwkSet,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(jwk_set: impl Into<JwkSet>, config: &AuthConfig) -> Self {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);
        validation.algorithms = config.algorithms.clone();
        validation.leeway = config.leeway;
        validation.set_audience(&[&config.audience]);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        Self {
            jwk_set: jwk_set.into(),
            validation,
        }
    }

    /// Checks the token's signature with the key named by its `kid` and validates expiry, audience and issuer.
    pub async fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        // Read the kid from the header before anything is trusted.
        let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
        let kid = header.kid.ok_or(AuthError::KeyNotFound)?;

        let jwk = self
            .jwk_set
            .find(&kid)
            .await
            .map_err(|error| {
                tracing::warn!(%error, "failed to fetch JWK set");
                AuthError::KeySetUnavailable(error)
            })?
            .ok_or(AuthError::KeyNotFound)?;

        let decoding_key = match jwk.algorithm {
            AlgorithmParameters::RSA(ref rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|_| AuthError::InvalidHeader),
            _ => Err(AuthError::InvalidHeader),
        }?;

        let token = decode::<serde_json::Value>(token, &decoding_key, &self.validation)
            .map_err(classify_decode_error)?;

        // Signature and standard claims are fine at this point, so a payload of the wrong shape is a claims problem.
        serde_json::from_value(token.claims).map_err(|_| AuthError::InvalidClaims)
    }
}

fn classify_decode_error(error: jsonwebtoken::errors::Error) -> AuthError {
    match error.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAudience
        | ErrorKind::InvalidIssuer
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidClaims,
        _ => AuthError::InvalidHeader,
    }
}
