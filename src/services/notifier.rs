//! Outbound email behind a `Notifier` trait.
//!
//! `SmtpNotifier` delivers over async SMTP; `LogNotifier` only traces,
//! for deployments without an SMTP relay and for tests.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use thiserror::Error;
use tracing::info;

use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotifier {
    /// # Errors
    ///
    /// Returns an error if the relay address cannot be resolved.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotifyError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.mailer.send(email).await?;

        info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

/// Trace-only stand-in used when `email.enabled = false`.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(to = %to, subject = %subject, body = %body, "Email delivery disabled, logging instead");
        Ok(())
    }
}

/// Message bodies. Plain text only; HTML templating is out of scope.
pub mod messages {
    pub fn password_reset(reset_url: &str) -> (String, String) {
        (
            "Your password reset token (valid for 10 minutes)".to_string(),
            format!(
                "Forgot your password? Submit a PATCH request with your new password to:\n\n{reset_url}\n\nIf you didn't forget your password, please ignore this email."
            ),
        )
    }

    pub fn order_received(order_id: i32, total_price: f64) -> (String, String) {
        (
            format!("Order #{order_id} received"),
            format!(
                "Thanks for your order!\n\nOrder #{order_id} has been received and is being prepared. Total: {total_price:.2}."
            ),
        )
    }

    pub fn order_updated(order_id: i32) -> (String, String) {
        (
            format!("Order #{order_id} updated"),
            format!("Your order #{order_id} has been updated. Check your account for details."),
        )
    }

    pub fn order_completed(order_id: i32) -> (String, String) {
        (
            format!("Order #{order_id} completed"),
            format!("Good news: your order #{order_id} is done and on its way."),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_message_embeds_url() {
        let (subject, body) = messages::password_reset("https://example.com/reset/abc");
        assert!(subject.contains("10 minutes"));
        assert!(body.contains("https://example.com/reset/abc"));
    }

    #[test]
    fn order_messages_name_the_order() {
        let (subject, body) = messages::order_received(7, 65.0);
        assert!(subject.contains('7'));
        assert!(body.contains("65.00"));

        let (subject, _) = messages::order_completed(7);
        assert!(subject.contains("completed"));
    }
}
