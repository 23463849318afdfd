use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::PoolConfig;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::config::MailConfig;

/// Outbound mail seam. Only verification mail goes through it today.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, verification_link: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let transport = SmtpTransport::relay(&config.server)
            .context("build smtp transport")?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .port(config.port)
            .pool_config(PoolConfig::new().max_size(4))
            .timeout(Some(Duration::from_secs(10)))
            .build();
        let from = config.from.parse().context("invalid MAIL_FROM address")?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, verification_link: &str) -> anyhow::Result<()> {
        let body = format!(
            "Welcome to Contactbook!\n\
            \n\
            Please confirm your email address by opening the link below:\n\
            \n\
            {verification_link}\n\
            \n\
            If you did not create an account, you can safely ignore this message.\n"
        );
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("invalid recipient address")?)
            .subject("Email Verification")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .context("build verification email")?;

        // lettre's SMTP transport is blocking
        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .context("mail worker panicked")?
            .context("send verification email")?;
        Ok(())
    }
}

/// Used when no SMTP settings are configured: the verification link is only
/// written to the log so local setups stay usable.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, verification_link: &str) -> anyhow::Result<()> {
        info!(%to, link = %verification_link, "mail transport not configured; logging verification link");
        Ok(())
    }
}

/// Records outgoing mail instead of sending it; backs `AppState::fake()`
/// and the service tests.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl MemoryMailer {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("mailer lock poisoned").clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, to: &str, verification_link: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .expect("mailer lock poisoned")
            .push((to.to_string(), verification_link.to_string()));
        Ok(())
    }
}
