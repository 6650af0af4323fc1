//! Session tokens.
//!
//! Staff log in with their email and password and receive an HS256 JWT. The token is sent back on every `/api` call,
//! either as `Authorization: Bearer <jwt>` or in the `cafe_access_token` header. The [`JwtMiddlewareFactory`]
//! validates it and stores the [`JwtClaims`] in the request extensions, from where handlers pick them up by taking a
//! `JwtClaims` argument.
//!
//! [`JwtMiddlewareFactory`]: crate::middleware::JwtMiddlewareFactory
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpMessage, HttpRequest};
use cafe_engine::db_types::{Profile, Role};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const ACCESS_TOKEN_HEADER: &str = "cafe_access_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Profile id
    pub sub: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl JwtClaims {
    pub fn for_profile(profile: &Profile, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: profile.id,
            email: profile.email.clone(),
            name: profile.name.clone(),
            role: profile.role,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or(AuthError::MissingToken.into());
        ready(claims)
    }
}

/// Pulls the raw session token out of the request headers.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    bearer
        .or_else(|| headers.get(ACCESS_TOKEN_HEADER).and_then(|v| v.to_str().ok()).map(str::trim))
        .filter(|t| !t.is_empty())
}

/// Signs and checks session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime: config.token_lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues a new access token for the given profile.
    ///
    /// The caller is responsible for having authenticated the profile first.
    pub fn issue_token(&self, profile: &Profile) -> Result<String, AuthError> {
        let claims = JwtClaims::for_profile(profile, self.lifetime);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenIssueError(e.to_string()))?;
        trace!("🔑️ Issued access token for {}", profile.email);
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;
        Ok(data.claims)
    }
}
