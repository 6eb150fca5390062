use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::referrals::{NewReferral, Referral, ReferralStats, ReferralStatus};

/// Persistence contract for referral records. The service layer only depends
/// on this trait so tests can swap in an in-memory store.
#[async_trait]
pub trait ReferralStore: Send + Sync {
    /// Persist a new referral with a freshly assigned id and `PENDING` status.
    async fn insert_referral(&self, new_referral: &NewReferral) -> Result<Referral>;

    /// All referrals, newest first.
    async fn list_referrals(&self) -> Result<Vec<Referral>>;

    async fn get_referral_by_id(&self, id: &str) -> Result<Option<Referral>>;

    /// Returns the updated record, or `None` if the id does not exist.
    async fn update_referral_status(
        &self,
        id: &str,
        status: ReferralStatus,
    ) -> Result<Option<Referral>>;

    /// Referrals whose referrer email matches exactly, newest first.
    async fn list_referrals_by_referrer(&self, email: &str) -> Result<Vec<Referral>>;

    /// Total/completed/pending counts from a single snapshot.
    async fn referral_stats(&self) -> Result<ReferralStats>;
}

pub struct PgReferralRepository {
    conn: PgPool,
}

impl PgReferralRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            DO $$ BEGIN
                CREATE TYPE referral_status AS ENUM
                    ('PENDING', 'ACCEPTED', 'COMPLETED', 'REJECTED');
            EXCEPTION
                WHEN duplicate_object THEN NULL;
            END $$
            "#,
        )
        .execute(&self.conn)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS referrals (
                id TEXT PRIMARY KEY,
                referrer_name TEXT NOT NULL,
                referrer_email TEXT NOT NULL,
                referee_name TEXT NOT NULL,
                referee_email TEXT NOT NULL,
                status referral_status NOT NULL DEFAULT 'PENDING',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.conn)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ReferralStore for PgReferralRepository {
    async fn insert_referral(&self, new_referral: &NewReferral) -> Result<Referral> {
        let referral_id = Uuid::new_v4().hyphenated().to_string();

        let referral = sqlx::query_as::<_, Referral>(
            r#"
            INSERT INTO referrals
            (id, referrer_name, referrer_email, referee_name, referee_email, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&referral_id)
        .bind(&new_referral.referrer_name)
        .bind(&new_referral.referrer_email)
        .bind(&new_referral.referee_name)
        .bind(&new_referral.referee_email)
        .bind(ReferralStatus::Pending)
        .fetch_one(&self.conn)
        .await?;

        Ok(referral)
    }

    async fn list_referrals(&self) -> Result<Vec<Referral>> {
        let referrals = sqlx::query_as::<_, Referral>(
            "SELECT * FROM referrals ORDER BY created_at DESC",
        )
        .fetch_all(&self.conn)
        .await?;

        Ok(referrals)
    }

    async fn get_referral_by_id(&self, id: &str) -> Result<Option<Referral>> {
        let referral = sqlx::query_as::<_, Referral>("SELECT * FROM referrals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(referral)
    }

    async fn update_referral_status(
        &self,
        id: &str,
        status: ReferralStatus,
    ) -> Result<Option<Referral>> {
        let referral = sqlx::query_as::<_, Referral>(
            "UPDATE referrals SET status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(id)
        .fetch_optional(&self.conn)
        .await?;

        Ok(referral)
    }

    async fn list_referrals_by_referrer(&self, email: &str) -> Result<Vec<Referral>> {
        // Postgres TEXT equality, so the match is case-sensitive.
        let referrals = sqlx::query_as::<_, Referral>(
            "SELECT * FROM referrals WHERE referrer_email = $1 ORDER BY created_at DESC",
        )
        .bind(email)
        .fetch_all(&self.conn)
        .await?;

        Ok(referrals)
    }

    async fn referral_stats(&self) -> Result<ReferralStats> {
        // One statement so the three counts come from the same snapshot.
        let stats = sqlx::query_as::<_, ReferralStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'COMPLETED') AS completed,
                   COUNT(*) FILTER (WHERE status = 'PENDING') AS pending
            FROM referrals
            "#,
        )
        .fetch_one(&self.conn)
        .await?;

        Ok(stats)
    }
}
