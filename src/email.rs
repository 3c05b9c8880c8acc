use axum::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use crate::config::SmtpConfig;

/// Outbound transactional email. Injected into handlers so tests can
/// substitute a recording fake.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .build();
        let from = cfg.from.parse::<Mailbox>()?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse::<Mailbox>()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;
        self.transport.send(message).await?;
        debug!(%to, subject, "email sent");
        Ok(())
    }
}

pub fn verification_email_body(name: &str, code: &str) -> String {
    format!(
        "Hello,\n\n\
         Thank you for registering with us {name}! To complete your registration, \
         please verify your email address by entering the following verification code:\n\n\
         Verification Code: {code}\n\n\
         If you did not sign up for this account, please ignore this email.\n\n\
         Best regards,\n\
         The Movies Team\n"
    )
}

pub fn reset_email_body(reset_url: &str) -> String {
    format!(
        "Hello,\n\n\
         You have requested to reset your password. Please click the link below or copy \
         and paste it into your browser to reset your password:\n\n\
         {reset_url}\n\n\
         This link will expire in 1 hour.\n\n\
         If you did not request a password reset, please ignore this email.\n\n\
         Best regards,\n\
         The Movies Team\n"
    )
}
