use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use super::guard::{authenticate, Identity};

/// Resolves the authenticated caller for a handler.
///
/// Intended for routes behind `AuthMiddleware`, which has already verified the
/// token; the extractor then loads the caller's user record. It also works on
/// unwrapped routes by validating the bearer token itself. Either way a failure
/// is an `AppError::Unauthorized`.
impl FromRequest for Identity {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { authenticate(&req).await.map_err(ActixError::from) })
    }
}
