use std::sync::Arc;

use sqlx::PgPool;

use crate::repositories::mailer::SmtpMailer;
use crate::repositories::referrals::PgReferralRepository;
use crate::settings::Settings;

pub mod http;
pub mod referrals;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Repository error: {0}")]
    Repository(String),
}

pub async fn start_services(pool: PgPool, settings: Settings) -> Result<(), anyhow::Error> {
    let repository = Arc::new(PgReferralRepository::new(pool));
    repository.ensure_schema().await?;

    let mailer = Arc::new(SmtpMailer::new(
        &settings.smtp,
        settings.frontend.url.clone(),
    )?);

    let referral_service = referrals::ReferralService::new(repository, mailer);

    log::info!("Starting HTTP server.");
    http::start_http_server(referral_service, &settings.server).await
}
