//! Domain service for authentication and account management.
//!
//! Covers signup, login, session authentication (with stale-password
//! rejection), the two-phase password-reset flow, and profile operations.

use serde::Serialize;
use thiserror::Error;

use crate::entities::users::{self, UserRole};

/// Errors specific to authentication and account operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already in use")]
    EmailTaken,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("You are not logged in")]
    MissingCredential,

    #[error("Invalid or expired session token")]
    InvalidToken,

    #[error("Password was changed after this token was issued")]
    StalePassword,

    #[error("The user belonging to this token no longer exists")]
    UserGone,

    #[error("Token is invalid or has expired")]
    InvalidOrExpiredToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Failed to send notification: {0}")]
    NotificationFailed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// The authenticated caller, resolved from a session token. Inserted as a
/// request extension by the auth middleware.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<users::Model> for CurrentUser {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
        }
    }
}

/// Account profile DTO; never carries password material.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for UserProfile {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A fresh session: token plus the user it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: CurrentUser,
}

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Domain service trait for authentication and account management.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a customer account and logs it in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailTaken`] for duplicate emails and
    /// [`AuthError::Validation`] for malformed input.
    async fn signup(&self, request: SignupRequest) -> Result<AuthSession, AuthError>;

    /// Verifies credentials and returns a fresh session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on any mismatch; whether
    /// the email exists is not distinguishable from the outside.
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Resolves a session token to the user behind it.
    ///
    /// Checks run in order: signature/expiry, user existence and active
    /// flag, then token freshness against `password_changed_at`.
    async fn authenticate(&self, token: &str) -> Result<CurrentUser, AuthError>;

    /// Like [`AuthService::authenticate`] but failures yield `None`.
    async fn authenticate_optional(&self, token: Option<&str>) -> Option<CurrentUser>;

    /// Phase one of password reset: generate a token, persist its digest,
    /// and email the plaintext inside `reset_url_base/{token}`.
    ///
    /// Unknown emails succeed silently so the endpoint cannot be used to
    /// enumerate accounts.
    async fn forgot_password(&self, email: &str, reset_url_base: &str) -> Result<(), AuthError>;

    /// Phase two: consume the token and set the new password. Returns a
    /// fresh session so the caller is logged in immediately.
    async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        password_confirm: &str,
    ) -> Result<AuthSession, AuthError>;

    /// Authenticated password change; verifies the current password first.
    async fn update_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
        password_confirm: &str,
    ) -> Result<AuthSession, AuthError>;

    /// Profile of the given account.
    async fn get_profile(&self, user_id: i32) -> Result<UserProfile, AuthError>;

    /// Update name and/or email. Password fields are not accepted here.
    async fn update_profile(
        &self,
        user_id: i32,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<UserProfile, AuthError>;

    /// Soft-delete the account (`active = false`).
    async fn deactivate(&self, user_id: i32) -> Result<(), AuthError>;

    /// Admin: list all active accounts.
    async fn list_users(&self) -> Result<Vec<UserProfile>, AuthError>;
}
