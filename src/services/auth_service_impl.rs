//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::db::Store;
use crate::db::repositories::user::verify_password;
use crate::services::auth_service::{
    AuthError, AuthService, AuthSession, CurrentUser, SignupRequest, UserProfile,
};
use crate::services::notifier::{Notifier, messages};
use crate::services::tokens::TokenService;

const MIN_PASSWORD_LEN: usize = 8;

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenService>,
    notifier: Arc<dyn Notifier>,
    auth_config: AuthConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        tokens: Arc<TokenService>,
        notifier: Arc<dyn Notifier>,
        auth_config: AuthConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            notifier,
            auth_config,
        }
    }

    fn session_for(&self, user: crate::entities::users::Model) -> Result<AuthSession, AuthError> {
        let token = self
            .tokens
            .issue_session(user.id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(AuthSession {
            token,
            user: CurrentUser::from(user),
        })
    }
}

fn validate_new_password(password: &str, confirm: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password != confirm {
        return Err(AuthError::Validation(
            "Passwords do not match".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') || trimmed.starts_with('@') {
        return Err(AuthError::Validation(
            "A valid email address is required".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn signup(&self, request: SignupRequest) -> Result<AuthSession, AuthError> {
        if request.name.trim().is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }
        validate_email(&request.email)?;
        validate_new_password(&request.password, &request.password_confirm)?;

        if self
            .store
            .get_user_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(AuthError::EmailTaken);
        }

        // Role is never client-assignable; every signup is a customer.
        let user = self
            .store
            .create_user(
                request.name.trim(),
                request.email.trim(),
                &request.password,
                Some(&self.auth_config),
            )
            .await?;

        self.session_for(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Please provide email and password".to_string(),
            ));
        }

        // One error for both unknown email and wrong password.
        let Some(user) = self.store.get_user_by_email(email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&user.password_hash, password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        self.session_for(user)
    }

    async fn authenticate(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let claims = self
            .tokens
            .verify_session(token)
            .map_err(|_| AuthError::InvalidToken)?;

        let Some(user) = self.store.get_user_by_id(claims.sub).await? else {
            return Err(AuthError::UserGone);
        };
        if !user.active {
            return Err(AuthError::UserGone);
        }

        // A token minted before the last password change is dead forever.
        if let Some(changed_at) = &user.password_changed_at {
            let changed_at = chrono::DateTime::parse_from_rfc3339(changed_at)
                .map_err(|e| AuthError::Internal(format!("Bad password_changed_at: {e}")))?;
            if claims.iat < changed_at.timestamp() {
                return Err(AuthError::StalePassword);
            }
        }

        Ok(CurrentUser::from(user))
    }

    async fn authenticate_optional(&self, token: Option<&str>) -> Option<CurrentUser> {
        let token = token?;
        self.authenticate(token).await.ok()
    }

    async fn forgot_password(&self, email: &str, reset_url_base: &str) -> Result<(), AuthError> {
        validate_email(email)?;

        // Unknown emails get the same outward result as known ones.
        let Some(user) = self.store.get_user_by_email(email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let reset = self.tokens.issue_reset();
        let user = self
            .store
            .set_user_reset_token(user, &reset.hashed, &reset.expires_at)
            .await?;

        let reset_url = format!("{}/{}", reset_url_base.trim_end_matches('/'), reset.plain);
        let (subject, body) = messages::password_reset(&reset_url);

        if let Err(e) = self.notifier.send(&user.email, &subject, &body).await {
            // Roll the token back so a half-issued reset cannot linger.
            warn!("Reset email dispatch failed: {e}");
            self.store.clear_user_reset_token(user).await?;
            return Err(AuthError::NotificationFailed(e.to_string()));
        }

        Ok(())
    }

    async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        password_confirm: &str,
    ) -> Result<AuthSession, AuthError> {
        validate_new_password(new_password, password_confirm)?;

        let digest = crate::services::tokens::hash_reset(token);
        let Some(user) = self.store.get_user_by_reset_digest(&digest).await? else {
            return Err(AuthError::InvalidOrExpiredToken);
        };

        let Some(expires_at) = &user.password_reset_expires else {
            return Err(AuthError::InvalidOrExpiredToken);
        };
        let expires_at = chrono::DateTime::parse_from_rfc3339(expires_at)
            .map_err(|e| AuthError::Internal(format!("Bad reset expiry: {e}")))?;
        if chrono::Utc::now().timestamp() >= expires_at.timestamp() {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        // Password write and token consumption are a single update; replay
        // finds no matching digest.
        let user = self
            .store
            .set_user_password(user, new_password, Some(&self.auth_config))
            .await?;

        self.session_for(user)
    }

    async fn update_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
        password_confirm: &str,
    ) -> Result<AuthSession, AuthError> {
        validate_new_password(new_password, password_confirm)?;
        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let Some(user) = self.store.get_user_by_id(user_id).await? else {
            return Err(AuthError::UserNotFound);
        };

        if !verify_password(&user.password_hash, current_password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .store
            .set_user_password(user, new_password, Some(&self.auth_config))
            .await?;

        self.session_for(user)
    }

    async fn get_profile(&self, user_id: i32) -> Result<UserProfile, AuthError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(UserProfile::from(user))
    }

    async fn update_profile(
        &self,
        user_id: i32,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<UserProfile, AuthError> {
        if name.is_none() && email.is_none() {
            return Err(AuthError::Validation("Nothing to update".to_string()));
        }
        if let Some(name) = &name
            && name.trim().is_empty()
        {
            return Err(AuthError::Validation("Name cannot be empty".to_string()));
        }

        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(email) = &email {
            validate_email(email)?;
            if let Some(existing) = self.store.get_user_by_email(email).await?
                && existing.id != user.id
            {
                return Err(AuthError::EmailTaken);
            }
        }

        let user = self.store.update_user_profile(user, name, email).await?;
        Ok(UserProfile::from(user))
    }

    async fn deactivate(&self, user_id: i32) -> Result<(), AuthError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        self.store.deactivate_user(user).await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, AuthError> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }
}
