//! Session token middleware.
//!
//! Wrap a scope with [`JwtMiddlewareFactory`] to require a valid session token on every route in it. Requests without
//! a token, or with one that is forged or expired, are refused with a 401. Otherwise the token's claims are placed in
//! the request extensions for the [`AclMiddlewareFactory`](super::AclMiddlewareFactory) and the handlers.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{debug, trace};

use crate::{
    auth::{token_from_headers, TokenIssuer},
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    issuer: TokenIssuer,
}

impl JwtMiddlewareFactory {
    pub fn new(issuer: TokenIssuer) -> Self {
        JwtMiddlewareFactory { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareService { issuer: self.issuer.clone(), service: Rc::new(service) }))
    }
}

pub struct JwtMiddlewareService<S> {
    issuer: TokenIssuer,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let claims = match token_from_headers(req.headers()) {
            Some(token) => self.issuer.validate(token),
            None => Err(AuthError::MissingToken),
        };
        Box::pin(async move {
            match claims {
                Ok(claims) => {
                    trace!("🔑️ Request to {} by {} ({})", req.path(), claims.email, claims.role);
                    req.extensions_mut().insert(claims);
                    service.call(req).await
                },
                Err(e) => {
                    debug!("🔑️ Refused request to {}. {e}", req.path());
                    Err(ServerError::AuthenticationError(e).into())
                },
            }
        })
    }
}
