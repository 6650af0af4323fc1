use std::fmt::Debug;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2,
    PasswordHash,
    PasswordHasher,
    PasswordVerifier,
};
use log::*;

use crate::{
    db_types::{NewProfile, Profile, Role},
    traits::{AuthApiError, ProfileManagement},
    validation::{LoginForm, NewUserForm},
};

pub fn hash_password(password: &str) -> Result<String, AuthApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

/// Staff accounts and logins.
pub struct AuthApi<B> {
    db: B,
}

impl<B> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi")
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AuthApi<B>
where B: ProfileManagement
{
    pub async fn create_user(&self, form: NewUserForm) -> Result<Profile, AuthApiError> {
        let user = form.validate()?;
        if self.db.fetch_profile_by_email(&user.email).await?.is_some() {
            return Err(AuthApiError::EmailAlreadyRegistered);
        }
        let profile = NewProfile {
            email: user.email,
            password_hash: hash_password(&user.password)?,
            name: user.name,
            role: user.role,
            avatar_url: user.avatar_url,
        };
        let profile = self.db.insert_profile(profile).await?;
        info!("🔑️ New {} account created for {}", profile.role, profile.email);
        Ok(profile)
    }

    /// Checks the credentials and returns the matching profile.
    ///
    /// An unknown email and a wrong password produce the same error.
    pub async fn authenticate(&self, form: LoginForm) -> Result<Profile, AuthApiError> {
        let email = form.validate()?;
        let profile = self.db.fetch_profile_by_email(&email).await?.ok_or_else(|| {
            debug!("🔑️ Login attempt for unknown email {email}");
            AuthApiError::InvalidCredentials
        })?;
        if !verify_password(&form.password, &profile.password_hash) {
            warn!("🔑️ Wrong password for {email}");
            return Err(AuthApiError::InvalidCredentials);
        }
        debug!("🔑️ {email} logged in");
        Ok(profile)
    }

    pub async fn profiles(&self) -> Result<Vec<Profile>, AuthApiError> {
        self.db.fetch_profiles().await
    }

    pub async fn profile(&self, id: i64) -> Result<Profile, AuthApiError> {
        self.db.fetch_profile(id).await?.ok_or(AuthApiError::ProfileNotFound(id))
    }

    /// Creates an admin account with the given credentials, unless an admin already exists.
    ///
    /// Returns the new profile if one was created.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<Option<Profile>, AuthApiError> {
        if self.db.count_profiles_with_role(Role::Admin).await? > 0 {
            debug!("🔑️ An admin account already exists");
            return Ok(None);
        }
        let form = NewUserForm {
            email: email.to_string(),
            password: password.to_string(),
            name: "Administrator".to_string(),
            role: Role::Admin.to_string(),
            avatar_url: None,
        };
        let profile = self.create_user(form).await?;
        warn!("🔑️ Bootstrap admin account {} created. Change its password after logging in.", profile.email);
        Ok(Some(profile))
    }
}
