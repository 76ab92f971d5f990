use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use super::guard::bearer_token;
use super::token::Claims;
use crate::error::AppError;
use crate::state::AppState;

/// Rejects requests without a valid bearer token before they reach a handler.
///
/// Wrap the protected scopes with it. On success the verified `Claims` are
/// stored in the request extensions, where the `Identity` extractor picks them up.
/// Failures are answered directly with the `AppError` response (401).
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            match verify_bearer(&req).await {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req
                    .into_response(err.error_response())
                    .map_into_right_body()),
            }
        })
    }
}

async fn verify_bearer(req: &ServiceRequest) -> Result<Claims, AppError> {
    let token = bearer_token(req.headers())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("Application state not configured".into()))?;

    state.tokens.validate(&token).await
}
