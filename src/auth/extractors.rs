use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::AppError;

/// Who is making the request, as established by `TokenMiddleware`.
///
/// Extracting a `Caller` never fails; handlers hand it to the access policy,
/// which decides whether an anonymous or badly authenticated caller is acceptable
/// for the operation at hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// No `Authorization` header was sent.
    Anonymous,
    /// A header was sent but it did not carry a valid bearer token.
    InvalidToken,
    /// The bearer token verified; these are its claims.
    Verified(Claims),
}

impl Caller {
    /// Returns the verified claims, or the 401 matching why there are none.
    pub fn claims(&self) -> Result<&Claims, AppError> {
        match self {
            Caller::Verified(claims) => Ok(claims),
            Caller::Anonymous => Err(AppError::Unauthorized("Authentication required".into())),
            Caller::InvalidToken => Err(AppError::Unauthorized("Invalid token".into())),
        }
    }
}

impl FromRequest for Caller {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Without the middleware nothing was verified, so the caller is anonymous.
        let caller = req
            .extensions()
            .get::<Caller>()
            .cloned()
            .unwrap_or(Caller::Anonymous);
        ready(Ok(caller))
    }
}
