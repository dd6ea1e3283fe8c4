use std::sync::Arc;

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

use super::models::Notification;
use crate::config::SmtpConfig;
use crate::utils::AppError;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("smtp credentials are not configured")]
    NotConfigured,
    #[error("Failed to parse {what} email: {source}")]
    Address {
        what: &'static str,
        source: lettre::address::AddressError,
    },
    #[error("Failed to build a message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("Wrong smtp transport: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("Mail task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        AppError::Mail(err.to_string())
    }
}

/// SMTP relay for outgoing notifications. Without credentials every send fails
/// with [`MailError::NotConfigured`].
#[derive(Clone)]
pub struct Mailer {
    transport: Option<Arc<SmtpTransport>>,
    from: String,
}

impl Mailer {
    pub fn from_config(cfg: &SmtpConfig) -> Result<Self, MailError> {
        let transport = match (&cfg.username, &cfg.password) {
            (Some(username), Some(password)) => {
                let creds = Credentials::new(username.clone(), password.clone());
                let mailer = SmtpTransport::relay(&cfg.host)?.credentials(creds).build();
                Some(Arc::new(mailer))
            }
            _ => {
                tracing::warn!("SMTP_USERNAME/SMTP_PASSWORD not set, outgoing mail is disabled");
                None
            }
        };

        Ok(Mailer {
            transport,
            from: cfg.from.clone(),
        })
    }

    pub fn disabled() -> Self {
        Mailer {
            transport: None,
            from: "no-reply@localhost".to_owned(),
        }
    }

    pub async fn send(&self, notification: Notification) -> Result<(), MailError> {
        let transport = self.transport.clone().ok_or(MailError::NotConfigured)?;
        let email = build_email(&self.from, &notification)?;

        tokio::task::spawn_blocking(move || transport.send(&email)).await??;

        tracing::info!(to = notification.recipient(), subject = notification.subject(), "email has been sent");
        Ok(())
    }
}

fn build_email(from: &str, notification: &Notification) -> Result<Message, MailError> {
    let email = Message::builder()
        .from(Mailbox::new(
            Some("Course Shop".to_owned()),
            from.parse().map_err(|source| MailError::Address {
                what: "sender",
                source,
            })?,
        ))
        .to(Mailbox::new(
            None,
            notification
                .recipient()
                .parse()
                .map_err(|source| MailError::Address {
                    what: "receiver",
                    source,
                })?,
        ))
        .subject(notification.subject())
        .header(ContentType::TEXT_PLAIN)
        .body(notification.body())?;

    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::models::PasswordResetNotification;

    fn reset(email: &str) -> Notification {
        Notification::PasswordReset(PasswordResetNotification {
            email: email.to_owned(),
            otp: "482913".to_owned(),
        })
    }

    #[test]
    fn reset_mail_carries_the_code() {
        let n = reset("buyer@example.com");
        assert_eq!(n.subject(), "Password Reset OTP");
        assert_eq!(n.body(), "Your OTP for password reset is 482913");
        assert!(build_email("shop@example.com", &n).is_ok());
    }

    #[test]
    fn bad_recipient_is_reported() {
        let err = build_email("shop@example.com", &reset("not-an-address")).unwrap_err();
        assert!(matches!(err, MailError::Address { what: "receiver", .. }));
    }

    #[tokio::test]
    async fn disabled_mailer_fails_to_send() {
        let err = Mailer::disabled().send(reset("buyer@example.com")).await.unwrap_err();
        assert!(matches!(err, MailError::NotConfigured));
    }
}
