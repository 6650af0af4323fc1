//! Access control list middleware.
//!
//! This middleware can be placed on any route or service that sits behind the
//! [`JwtMiddlewareFactory`](super::JwtMiddlewareFactory). It reads the caller's claims from the request extensions and
//! lets the request through if the caller holds *any* of the roles the route allows. Otherwise a 403 Forbidden
//! response is returned.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use cafe_engine::db_types::Role;
use futures::future::LocalBoxFuture;
use log::{debug, warn};

use crate::{
    auth::JwtClaims,
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    allowed_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(allowed_roles: &[Role]) -> Self {
        AclMiddlewareFactory { allowed_roles: allowed_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AclMiddlewareService { allowed_roles: self.allowed_roles.clone(), service: Rc::new(service) }))
    }
}

pub struct AclMiddlewareService<S> {
    allowed_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
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
        let allowed_roles = self.allowed_roles.clone();
        Box::pin(async move {
            let role = req.extensions().get::<JwtClaims>().map(|c| c.role);
            match role {
                Some(role) if allowed_roles.contains(&role) => service.call(req).await,
                Some(role) => {
                    debug!("🔑️ {role} may not access {}", req.path());
                    let msg = format!("The {role} role may not do this.");
                    Err(ServerError::AuthenticationError(AuthError::InsufficientPermissions(msg)).into())
                },
                None => {
                    warn!("🔑️ No JWT claims found in request extensions for {}", req.path());
                    Err(ServerError::AuthenticationError(AuthError::MissingToken).into())
                },
            }
        })
    }
}
