use actix_web::{
    body::to_bytes,
    http::{Method, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use cafe_engine::db_types::{Profile, Role};
use chrono::{Duration, TimeZone, Utc};
use log::debug;

use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    middleware::JwtMiddlewareFactory,
    server::{path_error_handlers, query_error_handlers, request_error_handlers},
};

// A test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("5e0a2bfc7dd94c0fa1c86e0ae1d7a3b3f0c4b8d2e6a15c97", Duration::hours(1))
}

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(&get_auth_config())
}

pub fn profile(id: i64, role: Role) -> Profile {
    Profile {
        id,
        email: format!("{role}@starcafe.id"),
        password_hash: String::default(),
        name: format!("Test {role}"),
        role,
        avatar_url: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
    }
}

pub fn issue_token(role: Role) -> String {
    token_issuer().issue_token(&profile(1, role)).expect("Failed to sign token")
}

pub fn expired_token(role: Role) -> String {
    let config = AuthConfig::new(get_auth_config().jwt_secret.reveal(), Duration::hours(-2));
    TokenIssuer::new(&config).issue_token(&profile(1, role)).expect("Failed to sign token")
}

/// Sends a request through an app whose routes all sit behind the session token middleware.
pub async fn api_request<F>(
    method: Method,
    token: &str,
    path: &str,
    body: Option<serde_json::Value>,
    configure: F,
) -> (StatusCode, String)
where
    F: FnOnce(&mut ServiceConfig) + 'static,
{
    let protected = move |cfg: &mut ServiceConfig| {
        cfg.service(web::scope("").wrap(JwtMiddlewareFactory::new(token_issuer())).configure(configure));
    };
    public_request(method, token, path, body, protected).await
}

/// Sends a request through an app without the session token middleware.
pub async fn public_request<F>(
    method: Method,
    token: &str,
    path: &str,
    body: Option<serde_json::Value>,
    configure: F,
) -> (StatusCode, String)
where
    F: FnOnce(&mut ServiceConfig),
{
    let mut req = TestRequest::default().method(method).uri(path);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    if let Some(body) = body {
        req = req.set_json(body);
    }
    let app = App::new()
        .app_data(request_error_handlers())
        .app_data(query_error_handlers())
        .app_data(path_error_handlers())
        .app_data(web::Data::new(token_issuer()))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request to {path}");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        // Errors raised by middleware surface here rather than as a response
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let bytes = to_bytes(res.into_body()).await.map_err(|e| e.to_string()).expect("Could not read response body");
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

/// Bodies of failed requests hold the messages under `errors.<field>`.
pub fn first_error(body: &str, field: &str) -> String {
    let value: serde_json::Value = serde_json::from_str(body).expect("Error body is not JSON");
    value["errors"][field][0].as_str().unwrap_or_default().to_string()
}
