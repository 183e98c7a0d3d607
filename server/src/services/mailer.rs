// baattak/server/src/services/mailer.rs

use crate::config::{AppConfig, SmtpConfig};
use crate::errors::{AppError, Result as AppResult};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const OTP_SUBJECT: &str = "Your OTP Code";

/// Delivers one-time registration codes.
#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send_otp(&self, to: &str, code: &str) -> AppResult<()>;
}

/// Writes deliveries to the log instead of an SMTP relay.
#[derive(Debug, Clone)]
pub struct LogMailer {
  sender: String,
}

impl LogMailer {
  pub fn new(sender: impl Into<String>) -> Self {
    Self { sender: sender.into() }
  }
}

#[async_trait]
impl Mailer for LogMailer {
  #[instrument(name = "mailer::send_otp", skip(self, code))]
  async fn send_otp(&self, to: &str, code: &str) -> AppResult<()> {
    let message_id = format!("otp_{}", uuid::Uuid::new_v4());
    info!(from = %self.sender, %to, %message_id, subject = OTP_SUBJECT, "OTP email dispatched.");
    debug!(%message_id, code, "OTP email body.");
    Ok(())
  }
}

/// Sends OTP mail through an SMTP relay over a pooled async connection.
pub struct SmtpMailer {
  sender: Mailbox,
  transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
  pub fn new(smtp: &SmtpConfig, sender: &str) -> AppResult<Self> {
    let sender = sender
      .parse::<Mailbox>()
      .map_err(|e| AppError::Config(format!("Invalid mail sender '{}': {}", sender, e)))?;

    let builder = if smtp.secure {
      AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
    } else {
      AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
    }
    .map_err(|e| AppError::Config(format!("Invalid SMTP_HOST '{}': {}", smtp.host, e)))?;

    let builder = match (&smtp.username, &smtp.password) {
      (Some(user), Some(pass)) => builder.credentials(Credentials::new(user.clone(), pass.clone())),
      (Some(_), None) | (None, Some(_)) => {
        warn!("Only one of SMTP_USER and SMTP_PASS is set; connecting without authentication.");
        builder
      }
      (None, None) => builder,
    };

    Ok(Self {
      sender,
      transport: builder.port(smtp.port).build(),
    })
  }
}

#[async_trait]
impl Mailer for SmtpMailer {
  #[instrument(name = "mailer::send_otp", skip(self, code))]
  async fn send_otp(&self, to: &str, code: &str) -> AppResult<()> {
    let recipient = to
      .parse::<Mailbox>()
      .map_err(|e| AppError::Validation(format!("Cannot send email to '{}': {}", to, e)))?;
    let message = Message::builder()
      .from(self.sender.clone())
      .to(recipient)
      .subject(OTP_SUBJECT)
      .header(ContentType::TEXT_PLAIN)
      .body(format!("Your OTP code is: {}", code))
      .map_err(|e| AppError::Internal(format!("Failed to build OTP email: {}", e)))?;

    let response = self.transport.send(message).await?;
    info!(from = %self.sender, %to, smtp_code = %response.code(), "OTP email relayed.");
    Ok(())
  }
}

/// Picks the SMTP relay when one is configured, the log otherwise.
pub fn build_mailer(config: &AppConfig) -> AppResult<Arc<dyn Mailer>> {
  match &config.smtp {
    Some(smtp) => {
      info!(host = %smtp.host, port = smtp.port, secure = smtp.secure, "Sending OTP mail via SMTP.");
      Ok(Arc::new(SmtpMailer::new(smtp, &config.mail_sender)?))
    }
    None => {
      warn!("SMTP_HOST is not set; OTP codes are written to the log.");
      Ok(Arc::new(LogMailer::new(config.mail_sender.clone())))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn relay() -> SmtpConfig {
    SmtpConfig {
      host: "smtp.mail.test".to_string(),
      port: 2525,
      secure: false,
      username: Some("kitchen@baattak.test".to_string()),
      password: Some("hunter2".to_string()),
    }
  }

  #[tokio::test]
  async fn smtp_mailer_rejects_a_malformed_recipient_before_connecting() {
    let mailer = SmtpMailer::new(&relay(), "Baattak <orders@baattak.test>").unwrap();
    let err = mailer.send_otp("not an address", "123456").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg.contains("not an address")));
  }

  #[test]
  fn smtp_mailer_needs_a_valid_sender() {
    let err = SmtpMailer::new(&relay(), "orders at baattak").err().unwrap();
    assert!(matches!(err, AppError::Config(msg) if msg.contains("sender")));
  }

  #[tokio::test]
  async fn log_mailer_accepts_any_recipient() {
    let mailer = LogMailer::new("noreply@baattak.local");
    mailer.send_otp("asha@example.com", "654321").await.unwrap();
  }
}
