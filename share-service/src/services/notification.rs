use crate::config::SmtpConfig;
use crate::services::error::ShareError;
use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use std::time::Duration;

/// Outbound recipient notification. Fire-and-forget from the issuer's point
/// of view: failures are logged and never fail issuance.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), ShareError>;
}

#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: SmtpTransport,
    from_email: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, ShareError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| ShareError::Internal(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "SMTP notifier initialized");

        Ok(Self {
            mailer,
            from_email: config.user.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), ShareError> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| {
                        ShareError::Internal(e.into())
                    })?,
            )
            .to(recipient
                .parse()
                .map_err(|e: lettre::address::AddressError| ShareError::Internal(e.into()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| ShareError::Internal(e.into()))?;

        // SmtpTransport is blocking; keep it off the async runtime.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| ShareError::Internal(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %recipient, subject = %subject, "Notification sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e.to_string(), to = %recipient, "Failed to send notification");
                Err(ShareError::Internal(anyhow::anyhow!(e.to_string())))
            }
        }
    }
}

/// Used when no SMTP transport is configured, and in tests.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, recipient: &str, subject: &str, _body: &str) -> Result<(), ShareError> {
        tracing::debug!(to = %recipient, subject = %subject, "notification skipped (no transport configured)");
        Ok(())
    }
}

/// Compose the recipient e-mail for a freshly issued share link.
pub fn share_invite_email(
    owner_name: &str,
    share_url: &str,
    expires_at: &chrono::DateTime<chrono::Utc>,
    purpose: Option<&str>,
) -> (String, String) {
    let subject = format!("{} shared health records with you", owner_name);

    let mut body = format!(
        "{} has shared part of their health records with you.\n\n\
         View them here: {}\n\n\
         This link expires on {}.",
        owner_name,
        share_url,
        expires_at.format("%Y-%m-%d %H:%M UTC"),
    );
    if let Some(purpose) = purpose {
        body.push_str(&format!("\n\nReason for sharing: {}", purpose));
    }

    (subject, body)
}
