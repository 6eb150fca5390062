use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::models::referrals::Referral;
use crate::settings;

/// Outbound mail contract. Injected into the referral service so tests can
/// substitute a fake; delivery failures are the caller's to swallow.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send_referral_invite(&self, referral: &Referral) -> Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    frontend_url: String,
}

impl SmtpMailer {
    pub fn new(smtp: &settings::Smtp, frontend_url: String) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .context("Could not build SMTP transport")?
            .port(smtp.port)
            .credentials(Credentials::new(smtp.user.clone(), smtp.pass.clone()))
            .build();

        let sender = smtp
            .user
            .parse::<Mailbox>()
            .context("SMTP user is not a valid sender address")?;

        Ok(Self {
            transport,
            sender,
            frontend_url,
        })
    }
}

#[async_trait]
impl NotificationGateway for SmtpMailer {
    async fn send_referral_invite(&self, referral: &Referral) -> Result<()> {
        let subject = format!("{} has referred you to Accredian!", referral.referrer_name);
        let body = format!(
            "<h1>Hello {referee}!</h1>\n\
             <p>{referrer} thinks you'd be interested in Accredian's programs.</p>\n\
             <p>Check out our courses and get up to ₹15,000 in referral bonus!</p>\n\
             <a href=\"{url}\">Explore Programs</a>",
            referee = referral.referee_name,
            referrer = referral.referrer_name,
            url = self.frontend_url,
        );

        let message = Message::builder()
            .from(self.sender.clone())
            .to(referral
                .referee_email
                .parse()
                .context("Invalid recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)
            .context("Could not build referral invite")?;

        self.transport
            .send(message)
            .await
            .context("SMTP send failed")?;

        Ok(())
    }
}
