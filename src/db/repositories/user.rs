use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};
use tokio::task;

use crate::config::AuthConfig;
use crate::entities::users::{self, UserRole};

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a customer account. The password is hashed on the blocking
    /// pool before the row is written.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password: &str,
        config: Option<&AuthConfig>,
    ) -> Result<users::Model> {
        let password = password.to_string();
        let config = config.cloned();
        let password_hash =
            task::spawn_blocking(move || hash_password(&password, config.as_ref()))
                .await
                .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let user = users::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            email: Set(email.to_lowercase()),
            password_hash: Set(password_hash),
            role: Set(UserRole::Customer),
            password_changed_at: Set(None),
            password_reset_token: Set(None),
            password_reset_expires: Set(None),
            active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        user.insert(&self.conn)
            .await
            .context("Failed to insert user")
    }

    /// Active-account lookup by email. Deactivated accounts are invisible
    /// to login and password reset.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .filter(users::Column::Active.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    pub async fn list_active(&self) -> Result<Vec<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Active.eq(true))
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }

    pub async fn update_profile(
        &self,
        user: users::Model,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<users::Model> {
        let mut active: users::ActiveModel = user.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(email) = email {
            active.email = Set(email.to_lowercase());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        active
            .update(&self.conn)
            .await
            .context("Failed to update user profile")
    }

    /// Soft delete. The row stays for order history; the account can no
    /// longer log in.
    pub async fn deactivate(&self, user: users::Model) -> Result<()> {
        let mut active: users::ActiveModel = user.into();
        active.active = Set(false);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active
            .update(&self.conn)
            .await
            .context("Failed to deactivate user")?;
        Ok(())
    }

    /// Replace the password, stamp `password_changed_at`, and clear any
    /// outstanding reset token in the same write.
    ///
    /// The change stamp is back-dated one second so a session token issued
    /// in the same second as the change does not oscillate between valid
    /// and stale.
    pub async fn set_password(
        &self,
        user: users::Model,
        new_password: &str,
        config: Option<&AuthConfig>,
    ) -> Result<users::Model> {
        let password = new_password.to_string();
        let config = config.cloned();
        let new_hash = task::spawn_blocking(move || hash_password(&password, config.as_ref()))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now();
        let changed_at = now - chrono::Duration::seconds(1);

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.password_changed_at = Set(Some(changed_at.to_rfc3339()));
        active.password_reset_token = Set(None);
        active.password_reset_expires = Set(None);
        active.updated_at = Set(now.to_rfc3339());

        active
            .update(&self.conn)
            .await
            .context("Failed to update password")
    }

    pub async fn set_reset_token(
        &self,
        user: users::Model,
        token_digest: &str,
        expires_at: &str,
    ) -> Result<users::Model> {
        let mut active: users::ActiveModel = user.into();
        active.password_reset_token = Set(Some(token_digest.to_string()));
        active.password_reset_expires = Set(Some(expires_at.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        active
            .update(&self.conn)
            .await
            .context("Failed to store reset token")
    }

    pub async fn clear_reset_token(&self, user: users::Model) -> Result<()> {
        let mut active: users::ActiveModel = user.into();
        active.password_reset_token = Set(None);
        active.password_reset_expires = Set(None);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active
            .update(&self.conn)
            .await
            .context("Failed to clear reset token")?;
        Ok(())
    }

    pub async fn find_by_reset_digest(&self, digest: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::PasswordResetToken.eq(digest))
            .filter(users::Column::Active.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query user by reset token")
    }
}

/// Verify a password against a stored Argon2id hash.
/// Runs on the blocking pool because Argon2 is CPU-intensive and would
/// stall the async runtime if run inline.
pub async fn verify_password(password_hash: &str, password: &str) -> Result<bool> {
    let password_hash = password_hash.to_string();
    let password = password.to_string();

    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        let argon2 = Argon2::default();
        Ok::<bool, anyhow::Error>(
            argon2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")?
}

/// Hash a password using Argon2id with optional tuned params.
pub fn hash_password(password: &str, config: Option<&AuthConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
