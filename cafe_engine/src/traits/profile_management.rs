use thiserror::Error;

use crate::{
    db_types::{NewProfile, Profile, Role},
    validation::FormErrors,
};

/// Staff profiles. Password hashing happens above this layer; backends only ever see the hash.
#[allow(async_fn_in_trait)]
pub trait ProfileManagement: Clone {
    /// Fails with [`AuthApiError::EmailAlreadyRegistered`] if a profile with the same email exists.
    async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, AuthApiError>;

    async fn fetch_profile_by_email(&self, email: &str) -> Result<Option<Profile>, AuthApiError>;

    async fn fetch_profile(&self, id: i64) -> Result<Option<Profile>, AuthApiError>;

    /// All profiles, ordered by name.
    async fn fetch_profiles(&self) -> Result<Vec<Profile>, AuthApiError>;

    async fn count_profiles_with_role(&self, role: Role) -> Result<i64, AuthApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Email is already registered")]
    EmailAlreadyRegistered,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Profile {0} does not exist")]
    ProfileNotFound(i64),
    #[error("{0}")]
    ValidationError(#[from] FormErrors),
    #[error("Could not hash the password. {0}")]
    PasswordHashError(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AuthApiError::EmailAlreadyRegistered,
            e => AuthApiError::DatabaseError(e.to_string()),
        }
    }
}
