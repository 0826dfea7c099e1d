use jsonwebtoken::Algorithm;
use url::Url;

/// Conventional location of a signing authority's public keys, relative to its issuer URL.
pub const JWKS_ENDPOINT: &str = ".well-known/jwks.json";

/// Static description of the trusted signing authority and of the API that tokens must be issued for.
///
/// Built once at start-up and handed to the [`TokenVerifier`](crate::token::TokenVerifier); nothing in the crate
/// reads authority settings from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Expected `iss` claim. Also the base URL of the key set endpoint.
    pub issuer: Url,
    /// Expected `aud` claim.
    pub audience: String,
    /// Signature algorithms a token header may declare.
    pub algorithms: Vec<Algorithm>,
    /// Clock skew tolerated when checking `exp` and `nbf`, in seconds.
    pub leeway: u64,
}

impl AuthConfig {
    pub fn new(issuer: Url, audience: impl Into<String>) -> Self {
        Self {
            issuer,
            audience: audience.into(),
            algorithms: vec![Algorithm::RS256],
            leeway: 0,
        }
    }

    /// Configuration for an authority hosted at `https://<domain>/`, e.g. an Auth0 tenant.
    pub fn for_domain(domain: &str, audience: impl Into<String>) -> Result<Self, url::ParseError> {
        let issuer = Url::parse(&format!("https://{domain}/"))?;
        Ok(Self::new(issuer, audience))
    }

    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    /// URL of the authority's JWK set.
    pub fn jwks_url(&self) -> Result<Url, url::ParseError> {
        self.issuer.join(JWKS_ENDPOINT)
    }
}
