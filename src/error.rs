use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::Serialize;
use serde_json::json;

/// Failure to obtain the signing authority's key set.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum JwkSetError {
    #[error("failed to fetch JWK set")]
    FailedRequest(#[from] reqwest::Error),
    #[error("received error response when fetching JWK set: {status_code}")]
    ErrorResponse { status_code: StatusCode },
}

/// The single error type raised while authorizing a request.
///
/// Every variant maps to a machine-readable [`code`](AuthError::code) and an HTTP
/// [`status_code`](AuthError::status_code). The `Display` output is the human-readable description.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("No authorization token provided.")]
    NoTokenHeader,
    #[error("Malformed authorization token.")]
    MalformedHeader,
    #[error("Incorrect token provided.")]
    InvalidToken,
    #[error("Unable to find the appropriate key.")]
    KeyNotFound,
    #[error("Unable to fetch the signing keys.")]
    KeySetUnavailable(#[source] JwkSetError),
    #[error("Unable to parse authentication token.")]
    InvalidHeader,
    #[error("Token expired.")]
    TokenExpired,
    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims,
    #[error("Action is not authorized.")]
    UnauthorizedAction,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::NoTokenHeader => "no_token_header",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::InvalidToken => "invalid_token",
            AuthError::KeyNotFound | AuthError::KeySetUnavailable(_) | AuthError::InvalidHeader => {
                "invalid_header"
            }
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims => "invalid_claims",
            AuthError::UnauthorizedAction => "unauthorized_action",
        }
    }

    /// 401 for tokens that were genuine but are stale or insufficient, 400 for everything the caller has to fix.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::TokenExpired | AuthError::InvalidClaims | AuthError::UnauthorizedAction => {
                StatusCode::UNAUTHORIZED
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn description(&self) -> String {
        self.to_string()
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            description: self.description(),
        }
    }
}

/// Machine-readable view of an [`AuthError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub description: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), &self.description())
    }
}

/// Renders the JSON error envelope shared by every failing endpoint.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    let body = Json(json!({
        "success": false,
        "error": status.as_u16(),
        "message": message,
    }));
    (status, body).into_response()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        let cases = [
            (AuthError::NoTokenHeader, "no_token_header", 400),
            (AuthError::MalformedHeader, "malformed_header", 400),
            (AuthError::InvalidToken, "invalid_token", 400),
            (AuthError::KeyNotFound, "invalid_header", 400),
            (AuthError::InvalidHeader, "invalid_header", 400),
            (AuthError::TokenExpired, "token_expired", 401),
            (AuthError::InvalidClaims, "invalid_claims", 401),
            (AuthError::UnauthorizedAction, "unauthorized_action", 401),
        ];

        for (error, code, status) in cases {
            assert_eq!(error.code(), code);
            assert_eq!(error.status_code().as_u16(), status, "{code}");
        }
    }

    #[test]
    fn test_body_carries_code_and_description() {
        let body = AuthError::KeyNotFound.body();

        assert_eq!(body.code, "invalid_header");
        assert_eq!(body.description, "Unable to find the appropriate key.");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"code": "invalid_header", "description": "Unable to find the appropriate key."})
        );
    }

    #[tokio::test]
    async fn test_into_response_renders_envelope() {
        let response = AuthError::UnauthorizedAction.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({"success": false, "error": 401, "message": "Action is not authorized."})
        );
    }
}
