use std::{
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    extract::FromRequestParts,
    response::{IntoResponse, Response},
};
use futures::future::{ready, Either, Ready};
use http::{header, request::Parts, HeaderMap, Request, StatusCode};
use snapspot_types::claim::{ApiClaim, Authorization as _, Role};
use tower::{Layer, Service};
use tracing::debug;

use super::TOKEN_COOKIE_NAME;
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(cookie::Cookie::split_parse)
        .filter_map(|c| c.ok())
        .find(|c| c.name() == TOKEN_COOKIE_NAME)
        .map(|c| c.value().to_string())
}

fn claim_from_headers(state: &AppState, headers: &HeaderMap) -> Option<ApiClaim> {
    let token = bearer_token(headers).or_else(|| cookie_token(headers))?;
    match state.tokens().validate::<ApiClaim>(&token) {
        Ok(claim) => Some(claim),
        Err(e) => {
            debug!("Failed to validate token: {e}");
            None
        }
    }
}

impl FromRequestParts<AppState> for ApiClaim {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claim) = parts.extensions.get::<ApiClaim>() {
            return Ok(claim.clone());
        }
        match claim_from_headers(state, &parts.headers) {
            Some(claim) => Ok(claim),
            None => {
                debug!("No token found");
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}

/// Validates the bearer/cookie token and stores the claim as a request
/// extension; requests without a valid token are rejected with 401.
#[derive(Clone)]
pub struct TokenLayer {
    state: AppState,
}

impl TokenLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for TokenLayer {
    type Service = TokenMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TokenMiddleware {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct TokenMiddleware<S> {
    inner: S,
    state: AppState,
}

impl<S> Service<Request<Body>> for TokenMiddleware<S>
where
    S: Service<Request<Body>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        match claim_from_headers(&self.state, request.headers()) {
            Some(claim) => {
                request.extensions_mut().insert(claim);
                Either::Right(self.inner.call(request))
            }
            None => {
                debug!("Rejecting request without valid token");
                Either::Left(ready(Ok(StatusCode::UNAUTHORIZED.into_response())))
            }
        }
    }
}

/// Guards routes with a role check against the claim stored by [`TokenLayer`].
#[derive(Clone)]
pub struct RequiredRolesLayer {
    roles: Arc<Vec<Role>>,
}

impl RequiredRolesLayer {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: Arc::new(roles.into_iter().collect()),
        }
    }
}

impl<S> Layer<S> for RequiredRolesLayer {
    type Service = RequiredRolesMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequiredRolesMiddleware {
            inner,
            roles: self.roles.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequiredRolesMiddleware<S> {
    inner: S,
    roles: Arc<Vec<Role>>,
}

impl<S> Service<Request<Body>> for RequiredRolesMiddleware<S>
where
    S: Service<Request<Body>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let status = match request.extensions().get::<ApiClaim>() {
            None => Some(StatusCode::UNAUTHORIZED),
            Some(claim) if !claim.has_any_role(self.roles.iter().copied()) => {
                debug!(sub = %claim.sub, "Missing required role");
                Some(StatusCode::FORBIDDEN)
            }
            Some(_) => None,
        };
        match status {
            Some(status) => Either::Left(ready(Ok(status.into_response()))),
            None => Either::Right(self.inner.call(request)),
        }
    }
}
