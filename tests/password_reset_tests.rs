use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use platter::config::AuthConfig;
use platter::db::Store;
use platter::services::{
    AuthError, AuthService, Notifier, NotifyError, SeaOrmAuthService, SignupRequest, TokenService,
    tokens,
};

/// Captures outgoing mail so tests can read the reset link.
#[derive(Default)]
struct CapturingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl CapturingNotifier {
    fn last_body(&self) -> String {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|(_, _, body)| body.clone())
            .expect("no email captured")
    }

    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-test-secret-0123456789abcdef".to_string(),
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        ..AuthConfig::default()
    }
}

async fn spawn_service() -> (SeaOrmAuthService, Arc<CapturingNotifier>, Store) {
    let store = Store::with_pool_options("sqlite::memory:", 5, 1)
        .await
        .expect("Failed to open store");
    let auth_config = test_auth_config();
    let notifier = Arc::new(CapturingNotifier::default());
    let service = SeaOrmAuthService::new(
        store.clone(),
        Arc::new(TokenService::new(&auth_config)),
        notifier.clone(),
        auth_config,
    );
    (service, notifier, store)
}

fn extract_reset_token(body: &str) -> String {
    let url = body
        .split_whitespace()
        .find(|word| word.starts_with("http"))
        .expect("reset email should contain a link");
    url.rsplit('/').next().unwrap().to_string()
}

#[tokio::test]
async fn reset_flow_end_to_end() {
    let (service, notifier, _store) = spawn_service().await;

    service
        .signup(SignupRequest {
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            password: "password123".to_string(),
            password_confirm: "password123".to_string(),
        })
        .await
        .unwrap();

    service
        .forgot_password("sam@example.com", "https://food.example/reset")
        .await
        .unwrap();
    assert_eq!(notifier.count(), 1);

    let token = extract_reset_token(&notifier.last_body());
    assert_eq!(token.len(), 64);

    let session = service
        .reset_password(&token, "freshstart99", "freshstart99")
        .await
        .unwrap();
    assert_eq!(session.user.email, "sam@example.com");

    // New credentials work, old ones do not.
    service.login("sam@example.com", "freshstart99").await.unwrap();
    assert!(matches!(
        service.login("sam@example.com", "password123").await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn reset_token_is_single_use() {
    let (service, notifier, _store) = spawn_service().await;

    service
        .signup(SignupRequest {
            name: "Tess".to_string(),
            email: "tess@example.com".to_string(),
            password: "password123".to_string(),
            password_confirm: "password123".to_string(),
        })
        .await
        .unwrap();

    service
        .forgot_password("tess@example.com", "https://food.example/reset")
        .await
        .unwrap();
    let token = extract_reset_token(&notifier.last_body());

    service
        .reset_password(&token, "firstchange1", "firstchange1")
        .await
        .unwrap();

    assert!(matches!(
        service.reset_password(&token, "secondtry22", "secondtry22").await,
        Err(AuthError::InvalidOrExpiredToken)
    ));
}

#[tokio::test]
async fn expired_reset_token_is_rejected() {
    let (service, _notifier, store) = spawn_service().await;

    service
        .signup(SignupRequest {
            name: "Uma".to_string(),
            email: "uma@example.com".to_string(),
            password: "password123".to_string(),
            password_confirm: "password123".to_string(),
        })
        .await
        .unwrap();

    // Plant a token that timed out a minute ago.
    let plain = "a".repeat(64);
    let digest = tokens::hash_reset(&plain);
    let expired_at = (Utc::now() - Duration::minutes(1)).to_rfc3339();
    let user = store
        .get_user_by_email("uma@example.com")
        .await
        .unwrap()
        .unwrap();
    store
        .set_user_reset_token(user, &digest, &expired_at)
        .await
        .unwrap();

    assert!(matches!(
        service.reset_password(&plain, "newpassword1", "newpassword1").await,
        Err(AuthError::InvalidOrExpiredToken)
    ));
}

#[tokio::test]
async fn unknown_email_sends_nothing_but_succeeds() {
    let (service, notifier, _store) = spawn_service().await;

    service
        .forgot_password("ghost@example.com", "https://food.example/reset")
        .await
        .unwrap();

    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn failed_delivery_rolls_the_token_back() {
    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, to: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
            Err(NotifyError::InvalidAddress(to.to_string()))
        }
    }

    let store = Store::with_pool_options("sqlite::memory:", 5, 1)
        .await
        .expect("Failed to open store");
    let auth_config = test_auth_config();
    let service = SeaOrmAuthService::new(
        store.clone(),
        Arc::new(TokenService::new(&auth_config)),
        Arc::new(FailingNotifier),
        auth_config,
    );

    service
        .signup(SignupRequest {
            name: "Vik".to_string(),
            email: "vik@example.com".to_string(),
            password: "password123".to_string(),
            password_confirm: "password123".to_string(),
        })
        .await
        .unwrap();

    let result = service
        .forgot_password("vik@example.com", "https://food.example/reset")
        .await;
    assert!(matches!(result, Err(AuthError::NotificationFailed(_))));

    // No dangling digest is left behind.
    let user = store
        .get_user_by_email("vik@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(user.password_reset_token.is_none());
    assert!(user.password_reset_expires.is_none());
}
