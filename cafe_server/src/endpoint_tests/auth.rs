use actix_web::{
    http::{Method, StatusCode},
    web,
    web::ServiceConfig,
};
use cafe_engine::{db_types::Role, hash_password, traits::AuthApiError, AuthApi};
use serde_json::{json, Value};

use super::{
    helpers::{api_request, first_error, issue_token, profile, public_request, token_issuer},
    mocks::MockProfileManager,
};
use crate::routes::{AuthRoute, CreateUserRoute, MeRoute, UserListRoute};

const PASSWORD: &str = "kopi-susu-42";

#[actix_web::test]
async fn login() {
    let _ = env_logger::try_init();
    let mut db = MockProfileManager::new();
    db.expect_fetch_profile_by_email().withf(|email| email.to_string() == "cashier@starcafe.id").times(1).returning(|_| {
        let mut p = profile(4, Role::Cashier);
        p.password_hash = hash_password(PASSWORD).unwrap();
        Ok(Some(p))
    });
    let body = json!({"email": " Cashier@StarCafe.id", "password": PASSWORD});
    let (status, body) = public_request(Method::POST, "", "/auth", Some(body), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["profile"]["role"], "cashier");
    assert!(response["profile"].get("password_hash").is_none(), "password hash leaked: {body}");
    let claims = token_issuer().validate(response["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub, 4);
    assert_eq!(claims.role, Role::Cashier);
}

#[actix_web::test]
async fn login_with_wrong_password() {
    let _ = env_logger::try_init();
    let mut db = MockProfileManager::new();
    db.expect_fetch_profile_by_email().returning(|_| {
        let mut p = profile(4, Role::Cashier);
        p.password_hash = hash_password(PASSWORD).unwrap();
        Ok(Some(p))
    });
    let body = json!({"email": "cashier@starcafe.id", "password": "teh-manis-42"});
    let (status, body) = public_request(Method::POST, "", "/auth", Some(body), configure(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(first_error(&body, "_form"), "Invalid email or password");
}

#[actix_web::test]
async fn login_with_unknown_email() {
    let _ = env_logger::try_init();
    let mut db = MockProfileManager::new();
    db.expect_fetch_profile_by_email().returning(|_| Ok(None));
    let body = json!({"email": "nobody@starcafe.id", "password": PASSWORD});
    let (status, body) = public_request(Method::POST, "", "/auth", Some(body), configure(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(first_error(&body, "_form"), "Invalid email or password");
}

#[actix_web::test]
async fn login_form_errors() {
    let _ = env_logger::try_init();
    let body = json!({"email": "", "password": "abc"});
    let (status, body) = public_request(Method::POST, "", "/auth", Some(body), configure(MockProfileManager::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(first_error(&body, "email"), "Email is required");
    assert_eq!(first_error(&body, "password"), "Password must be at least 6 characters");
}

#[actix_web::test]
async fn refresh_session() {
    let _ = env_logger::try_init();
    let mut db = MockProfileManager::new();
    db.expect_fetch_profile().withf(|id| *id == 1).times(1).returning(|id| Ok(Some(profile(id, Role::Kitchen))));
    let token = issue_token(Role::Kitchen);
    let (status, body) = public_request(Method::POST, &token, "/auth", None, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    let claims = token_issuer().validate(response["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.role, Role::Kitchen);
}

#[actix_web::test]
async fn refresh_for_deleted_account() {
    let _ = env_logger::try_init();
    let mut db = MockProfileManager::new();
    db.expect_fetch_profile().returning(|_| Ok(None));
    let token = issue_token(Role::Kitchen);
    let (status, body) = public_request(Method::POST, &token, "/auth", None, configure(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(first_error(&body, "_form"), "User account not found.");
}

#[actix_web::test]
async fn auth_without_credentials_or_token() {
    let _ = env_logger::try_init();
    let (status, body) = public_request(Method::POST, "", "/auth", None, configure(MockProfileManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(first_error(&body, "_form"), "You must be logged in to do that.");
}

#[actix_web::test]
async fn my_profile() {
    let _ = env_logger::try_init();
    let mut db = MockProfileManager::new();
    db.expect_fetch_profile().returning(|id| Ok(Some(profile(id, Role::Kitchen))));
    let token = issue_token(Role::Kitchen);
    let (status, body) = api_request(Method::GET, &token, "/me", None, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let me: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(me["email"], "kitchen@starcafe.id");
}

#[actix_web::test]
async fn only_admins_list_users() {
    let _ = env_logger::try_init();
    let token = issue_token(Role::Cashier);
    let (status, _) = api_request(Method::GET, &token, "/users", None, configure(MockProfileManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut db = MockProfileManager::new();
    db.expect_fetch_profiles().returning(|| Ok(vec![profile(1, Role::Admin), profile(2, Role::Kitchen)]));
    let token = issue_token(Role::Admin);
    let (status, body) = api_request(Method::GET, &token, "/users", None, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let users: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(users.len(), 2);
}

#[actix_web::test]
async fn admin_creates_account() {
    let _ = env_logger::try_init();
    let mut db = MockProfileManager::new();
    db.expect_fetch_profile_by_email().returning(|_| Ok(None));
    db.expect_insert_profile()
        .withf(|p| p.role == Role::Kitchen && p.password_hash.starts_with("$argon2"))
        .times(1)
        .returning(|p| {
            let mut profile = profile(9, p.role);
            profile.email = p.email;
            Ok(profile)
        });
    let token = issue_token(Role::Admin);
    let body = json!({"email": "dapur@starcafe.id", "password": PASSWORD, "name": "Dapur", "role": "kitchen"});
    let (status, body) = api_request(Method::POST, &token, "/users", Some(body), configure(db)).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["email"], "dapur@starcafe.id");
}

#[actix_web::test]
async fn duplicate_email() {
    let _ = env_logger::try_init();
    let mut db = MockProfileManager::new();
    db.expect_fetch_profile_by_email().returning(|_| Ok(None));
    db.expect_insert_profile().returning(|_| Err(AuthApiError::EmailAlreadyRegistered));
    let token = issue_token(Role::Admin);
    let body = json!({"email": "dapur@starcafe.id", "password": PASSWORD, "name": "Dapur", "role": "kitchen"});
    let (status, body) = api_request(Method::POST, &token, "/users", Some(body), configure(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(first_error(&body, "_form"), "Email is already registered");
}

fn configure(db: MockProfileManager) -> impl FnOnce(&mut ServiceConfig) + 'static {
    move |cfg| {
        let api = AuthApi::new(db);
        cfg.service(AuthRoute::<MockProfileManager>::new())
            .service(MeRoute::<MockProfileManager>::new())
            .service(UserListRoute::<MockProfileManager>::new())
            .service(CreateUserRoute::<MockProfileManager>::new())
            .app_data(web::Data::new(api));
    }
}
