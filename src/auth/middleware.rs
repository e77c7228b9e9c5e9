use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::extractors::Caller;
use crate::auth::token::TokenService;
use crate::error::AppError;
use crate::state::AppState;

/// Classifies an `Authorization` header value.
///
/// A header without a token part counts as no credentials at all; any other
/// scheme or a token that fails verification is `InvalidToken`.
fn identify(header: Option<&str>, tokens: &TokenService) -> Caller {
    let mut parts = header.unwrap_or_default().split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("Bearer"), Some(token)) => match tokens.verify(token) {
            Ok(claims) => Caller::Verified(claims),
            Err(_) => Caller::InvalidToken,
        },
        (Some(_), Some(_)) => Caller::InvalidToken,
        _ => Caller::Anonymous,
    }
}

/// Verifies the bearer token, if any, and records the resulting [`Caller`] in the
/// request extensions.
///
/// The middleware never rejects a request by itself: whether a missing or invalid
/// token matters is decided per operation by the access policy.
pub struct TokenMiddleware;

impl<S, B> Transform<S, ServiceRequest> for TokenMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = TokenMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TokenMiddlewareService { service }))
    }
}

pub struct TokenMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TokenMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let state = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state.clone(),
            None => {
                let app_err =
                    AppError::InternalServerError("AppState is not registered".into());
                return Box::pin(async move { Err(app_err.into()) });
            }
        };

        let caller = match req.headers().get(header::AUTHORIZATION) {
            None => Caller::Anonymous,
            Some(value) => match value.to_str() {
                Ok(value) => identify(Some(value), &state.tokens),
                Err(_) => Caller::InvalidToken,
            },
        };

        req.extensions_mut().insert(caller);
        Box::pin(self.service.call(req))
    }
}
