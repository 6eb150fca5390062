use std::sync::Arc;

use super::ServiceError;
use crate::models::referrals::{NewReferral, Referral, ReferralStats, ReferralStatus};
use crate::repositories::mailer::NotificationGateway;
use crate::repositories::referrals::ReferralStore;

#[derive(Clone)]
pub struct ReferralService {
    store: Arc<dyn ReferralStore>,
    mailer: Arc<dyn NotificationGateway>,
}

impl ReferralService {
    pub fn new(store: Arc<dyn ReferralStore>, mailer: Arc<dyn NotificationGateway>) -> Self {
        Self { store, mailer }
    }

    /// Validates and persists a new referral, then notifies the referee.
    /// The notification is best-effort: a delivery failure is logged and
    /// discarded, never propagated, and the created record stands.
    pub async fn submit(&self, new_referral: NewReferral) -> Result<Referral, ServiceError> {
        validate_submission(&new_referral)?;

        let referral = self
            .store
            .insert_referral(&new_referral)
            .await
            .map_err(|e| ServiceError::Repository(e.to_string()))?;

        if let Err(e) = self.mailer.send_referral_invite(&referral).await {
            log::error!(
                "Failed to send referral invite to {}: {e:#}",
                referral.referee_email
            );
        }

        Ok(referral)
    }

    pub async fn list(&self) -> Result<Vec<Referral>, ServiceError> {
        self.store
            .list_referrals()
            .await
            .map_err(|e| ServiceError::Repository(e.to_string()))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Referral, ServiceError> {
        self.store
            .get_referral_by_id(id)
            .await
            .map_err(|e| ServiceError::Repository(e.to_string()))?
            .ok_or_else(|| ServiceError::NotFound("Referral not found".to_string()))
    }

    /// Any status may move to any status, including back to `PENDING`;
    /// only membership in the enum is enforced.
    pub async fn update_status(&self, id: &str, status: &str) -> Result<Referral, ServiceError> {
        let status = ReferralStatus::parse(status)
            .ok_or_else(|| ServiceError::Validation("Invalid status".to_string()))?;

        self.store
            .update_referral_status(id, status)
            .await
            .map_err(|e| ServiceError::Repository(e.to_string()))?
            .ok_or_else(|| ServiceError::NotFound("Referral not found".to_string()))
    }

    pub async fn list_by_referrer(&self, email: &str) -> Result<Vec<Referral>, ServiceError> {
        self.store
            .list_referrals_by_referrer(email)
            .await
            .map_err(|e| ServiceError::Repository(e.to_string()))
    }

    pub async fn stats(&self) -> Result<ReferralStats, ServiceError> {
        self.store
            .referral_stats()
            .await
            .map_err(|e| ServiceError::Repository(e.to_string()))
    }
}

fn validate_submission(new_referral: &NewReferral) -> Result<(), ServiceError> {
    if new_referral.referrer_name.is_empty()
        || new_referral.referrer_email.is_empty()
        || new_referral.referee_name.is_empty()
        || new_referral.referee_email.is_empty()
    {
        return Err(ServiceError::Validation(
            "All fields are required".to_string(),
        ));
    }

    if !is_valid_email(&new_referral.referrer_email) || !is_valid_email(&new_referral.referee_email)
    {
        return Err(ServiceError::Validation(
            "Invalid email format".to_string(),
        ));
    }

    Ok(())
}

/// Basic syntactic check: no whitespace, a single `@` with a non-empty local
/// part, and a dot somewhere inside the domain (not first or last character).
fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain
        .bytes()
        .enumerate()
        .any(|(i, b)| b == b'.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use std::sync::Mutex;

    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDateTime};
    use uuid::Uuid;

    use crate::models::referrals::{NewReferral, Referral, ReferralStats, ReferralStatus};
    use crate::repositories::mailer::NotificationGateway;
    use crate::repositories::referrals::ReferralStore;

    /// In-memory stand-in for the Postgres repository. Creation timestamps
    /// come from a counter so listing order is deterministic.
    #[derive(Default)]
    pub struct MemoryReferralStore {
        rows: Mutex<Vec<Referral>>,
        clock: AtomicI64,
    }

    impl MemoryReferralStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    fn timestamp(offset: i64) -> NaiveDateTime {
        DateTime::from_timestamp(1_700_000_000 + offset, 0)
            .unwrap()
            .naive_utc()
    }

    #[async_trait]
    impl ReferralStore for MemoryReferralStore {
        async fn insert_referral(&self, new_referral: &NewReferral) -> Result<Referral> {
            let referral = Referral {
                id: Uuid::new_v4().hyphenated().to_string(),
                referrer_name: new_referral.referrer_name.clone(),
                referrer_email: new_referral.referrer_email.clone(),
                referee_name: new_referral.referee_name.clone(),
                referee_email: new_referral.referee_email.clone(),
                status: ReferralStatus::Pending,
                created_at: timestamp(self.clock.fetch_add(1, Ordering::SeqCst)),
            };

            self.rows.lock().unwrap().push(referral.clone());
            Ok(referral)
        }

        async fn list_referrals(&self) -> Result<Vec<Referral>> {
            let mut rows = self.rows.lock().unwrap().clone();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        }

        async fn get_referral_by_id(&self, id: &str) -> Result<Option<Referral>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == id)
                .cloned())
        }

        async fn update_referral_status(
            &self,
            id: &str,
            status: ReferralStatus,
        ) -> Result<Option<Referral>> {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|r| r.id == id) {
                Some(row) => {
                    row.status = status;
                    Ok(Some(row.clone()))
                }
                None => Ok(None),
            }
        }

        async fn list_referrals_by_referrer(&self, email: &str) -> Result<Vec<Referral>> {
            let mut rows: Vec<Referral> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.referrer_email == email)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        }

        async fn referral_stats(&self) -> Result<ReferralStats> {
            let rows = self.rows.lock().unwrap();
            Ok(ReferralStats {
                total: rows.len() as i64,
                completed: rows
                    .iter()
                    .filter(|r| r.status == ReferralStatus::Completed)
                    .count() as i64,
                pending: rows
                    .iter()
                    .filter(|r| r.status == ReferralStatus::Pending)
                    .count() as i64,
            })
        }
    }

    /// Records recipients of sent invites; flips to failing when asked.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            let mailer = Self::default();
            mailer.fail.store(true, Ordering::SeqCst);
            mailer
        }
    }

    #[async_trait]
    impl NotificationGateway for RecordingMailer {
        async fn send_referral_invite(&self, referral: &Referral) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                bail!("SMTP relay unreachable");
            }

            self.sent
                .lock()
                .unwrap()
                .push(referral.referee_email.clone());
            Ok(())
        }
    }
}
