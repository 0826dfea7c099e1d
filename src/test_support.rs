//! A local signing authority for tests: an RSA key, the JWKS endpoint publishing it and a token minter.

use std::time::SystemTime;

use jsonwebtoken::jwk::{
    AlgorithmParameters, CommonParameters, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse, RSAKeyParameters,
    RSAKeyType,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use openssl::pkey::Private;
use openssl::rsa::Rsa;
use serde_json::json;
use url::Url;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::authorization::Authorizer;
use crate::config::AuthConfig;
use crate::remote_jwk_set::RemoteJwkSet;
use crate::token::TokenVerifier;

pub(crate) const JWKS_PATH: &str = "/.well-known/jwks.json";
pub(crate) const KID: &str = "42";
pub(crate) const AUDIENCE: &str = "drinks-api";

pub(crate) fn generate_rsa_key() -> Rsa<Private> {
    Rsa::generate(2048).unwrap()
}

pub(crate) fn rsa_jwk(kid: &str, key: &Rsa<Private>) -> Jwk {
    Jwk {
        common: CommonParameters {
            public_key_use: Some(PublicKeyUse::Signature),
            key_algorithm: Some(KeyAlgorithm::RS256),
            key_id: Some(kid.to_string()),
            ..CommonParameters::default()
        },
        algorithm: AlgorithmParameters::RSA(RSAKeyParameters {
            key_type: RSAKeyType::RSA,
            n: base64_url::encode(&key.n().to_vec()),
            e: base64_url::encode(&key.e().to_vec()),
        }),
    }
}

pub(crate) fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Signs `claims` with RS256, declaring `kid` in the header when given.
pub(crate) fn sign(key: &Rsa<Private>, kid: Option<&str>, claims: &serde_json::Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    jsonwebtoken::encode(
        &header,
        claims,
        &EncodingKey::from_rsa_der(&key.private_key_to_der().unwrap()),
    )
    .unwrap()
}

pub(crate) struct MockAuthServer {
    _inner_server: MockServer,
    signing_key: Rsa<Private>,
    config: AuthConfig,
}

impl MockAuthServer {
    /// Serves a JWKS containing the signing key under [`KID`].
    pub async fn start() -> MockAuthServer {
        let signing_key = generate_rsa_key();
        let jwks = JwkSet {
            keys: vec![rsa_jwk(KID, &signing_key)],
        };
        Self::start_with(signing_key, ResponseTemplate::new(200).set_body_json(jwks)).await
    }

    /// An authority whose JWKS endpoint always fails.
    pub async fn start_failing() -> MockAuthServer {
        Self::start_with(generate_rsa_key(), ResponseTemplate::new(500)).await
    }

    async fn start_with(signing_key: Rsa<Private>, jwks_response: ResponseTemplate) -> MockAuthServer {
        let mock_auth_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(jwks_response)
            .mount(&mock_auth_server)
            .await;

        let issuer = Url::parse(&mock_auth_server.uri()).unwrap();
        MockAuthServer {
            _inner_server: mock_auth_server,
            signing_key,
            config: AuthConfig::new(issuer, AUDIENCE),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn signing_key(&self) -> &Rsa<Private> {
        &self.signing_key
    }

    pub fn remote_jwk_set(&self) -> RemoteJwkSet {
        RemoteJwkSet::builder(self.config.jwks_url().unwrap()).build()
    }

    pub fn local_jwk_set(&self) -> JwkSet {
        JwkSet {
            keys: vec![rsa_jwk(KID, &self.signing_key)],
        }
    }

    pub fn verifier(&self) -> TokenVerifier {
        TokenVerifier::new(self.remote_jwk_set(), &self.config)
    }

    pub fn authorizer(&self) -> Authorizer {
        Authorizer::new(self.verifier())
    }

    /// Claims of a valid token granting `permissions`, valid for an hour.
    pub fn claims(&self, permissions: &[&str]) -> serde_json::Value {
        let issued_at = now();
        json!({
            "iss": self.config.issuer.as_str(),
            "sub": "auth0|5f0c1b2a",
            "aud": self.config.audience,
            "azp": "drinks-frontend",
            "gty": "client-credentials",
            "iat": issued_at,
            "exp": issued_at + 3600,
            "permissions": permissions,
        })
    }

    pub fn sign(&self, claims: &serde_json::Value) -> String {
        sign(&self.signing_key, Some(KID), claims)
    }

    pub fn token(&self, permissions: &[&str]) -> String {
        self.sign(&self.claims(permissions))
    }
}
