use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use http::{HeaderMap, StatusCode};
use tower::Layer;
use tower_service::Service;

use crate::claims::{check_permission, ClaimSet};
use crate::token::{bearer_token, TokenVerifier};
use crate::AuthError;

/// Runs the whole authorization pipeline for a request: bearer token extraction, token verification and the
/// permission check. The first failing step ends the pipeline.
#[derive(Clone)]
pub struct Authorizer {
    verifier: Arc<TokenVerifier>,
}

impl Authorizer {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    pub async fn authorize(&self, headers: &HeaderMap, permission: &str) -> Result<ClaimSet, AuthError> {
        let token = bearer_token(headers)?;
        let claims = self.verifier.verify(&token).await?;
        check_permission(permission, &claims)?;
        Ok(claims)
    }

    /// Layer protecting a route with `permission`. An empty permission admits any authenticated caller.
    pub fn require(&self, permission: impl Into<String>) -> AuthorizationLayer {
        let permission: String = permission.into();
        AuthorizationLayer {
            authorizer: self.clone(),
            permission: permission.into(),
        }
    }
}

#[derive(Clone)]
pub struct AuthorizationLayer {
    authorizer: Authorizer,
    permission: Arc<str>,
}

impl<S> Layer<S> for AuthorizationLayer {
    type Service = AuthorizationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthorizationService {
            inner,
            authorizer: self.authorizer.clone(),
            permission: self.permission.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthorizationService<S> {
    inner: S,
    authorizer: Authorizer,
    permission: Arc<str>,
}

/// Verified claims of the current request, available to handlers behind an [`AuthorizationLayer`].
///
/// Put it first in a handler's argument list:
///
/// ```rust,ignore
/// async fn drinks_detail(Claims(claims): Claims, State(state): State<AppState>) -> ApiResult<..> { .. }
/// ```
#[derive(Clone, Debug)]
pub struct Claims(pub ClaimSet);

impl<S> Service<Request> for AuthorizationService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        // Move the original service into the closure instead of its clone. This makes sure that the original service is
        // `call`ed instead of the cloned one, which might not be ready yet (`poll_ready` hasn't been called on the
        // clone yet).
        // See [docs](https://docs.rs/tower/latest/tower/trait.Service.html#be-careful-when-cloning-inner-services).
        let inner_clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, inner_clone);

        let authorizer = self.authorizer.clone();
        let permission = self.permission.clone();
        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            match authorizer.authorize(&parts.headers, &permission).await {
                Ok(claims) => {
                    parts.extensions.insert(Claims(claims));
                    inner.call(Request::from_parts(parts, body)).await
                }
                Err(auth_error) => {
                    tracing::debug!(
                        code = auth_error.code(),
                        permission = %permission,
                        uri = %parts.uri,
                        "rejected request"
                    );
                    Ok(auth_error.into_response())
                }
            }
        })
    }
}

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Claims>().cloned().ok_or_else(|| {
            tracing::error!(uri = %parts.uri, "handler expects claims but the route has no AuthorizationLayer");
            StatusCode::INTERNAL_SERVER_ERROR
        })
    }
}
