//! Bearer token gate applied in front of every API route.

use std::sync::Arc;

use poem::http::header::AUTHORIZATION;
use poem::{Endpoint, Middleware, Request, Result};

use crate::error::{ApiError, AuthError};
use crate::token::{Identity, TokenVerifier};

/// Paths reachable without a credential. Matched by exact equality.
pub const PUBLIC_PATHS: [&str; 3] = ["/post/get", "/user/signup", "/user/login"];

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// Pull the token out of an `Authorization` header value.
///
/// The token is the second space-separated segment; the scheme word is not
/// inspected. An empty header counts as missing.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingHeader)?;
    header
        .split(' ')
        .nth(1)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// Middleware that requires a valid Bearer token unless the path is in
/// [`PUBLIC_PATHS`].
///
/// On success the caller's [`Identity`] is stored in the request data, where
/// handlers read it with `Data<&Identity>`.
pub struct AuthGate {
    verifier: Arc<TokenVerifier>,
}

impl AuthGate {
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }
}

impl<E: Endpoint> Middleware<E> for AuthGate {
    type Output = AuthGateEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        AuthGateEndpoint {
            inner: ep,
            verifier: self.verifier.clone(),
        }
    }
}

pub struct AuthGateEndpoint<E> {
    inner: E,
    verifier: Arc<TokenVerifier>,
}

impl<E: Endpoint> AuthGateEndpoint<E> {
    fn authenticate(&self, req: &Request) -> Result<Identity, AuthError> {
        let header = match req.headers().get(AUTHORIZATION) {
            // A header that is not valid text cannot hold a valid token.
            Some(value) => Some(value.to_str().map_err(|_| AuthError::InvalidToken)?),
            None => None,
        };
        let token = bearer_token(header)?;
        self.verifier.verify(token)
    }
}

impl<E: Endpoint> Endpoint for AuthGateEndpoint<E> {
    type Output = E::Output;

    async fn call(&self, mut req: Request) -> Result<Self::Output> {
        if is_public(req.uri().path()) {
            return self.inner.call(req).await;
        }

        match self.authenticate(&req) {
            Ok(identity) => {
                req.set_data(identity);
                self.inner.call(req).await
            }
            Err(err) => {
                tracing::debug!(
                    path = %req.uri().path(),
                    reason = %err,
                    "request rejected by auth gate"
                );
                Err(ApiError::from(err).into())
            }
        }
    }
}
