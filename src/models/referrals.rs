use serde::{Deserialize, Serialize};

/// Lifecycle status of a referral. New referrals always start out `Pending`;
/// every other value is set through the status-update endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "referral_status", rename_all = "UPPERCASE")]
pub enum ReferralStatus {
    Pending,
    Accepted,
    Completed,
    Rejected,
}

impl ReferralStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "ACCEPTED" => Some(Self::Accepted),
            "COMPLETED" => Some(Self::Completed),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub id: String,
    pub referrer_name: String,
    pub referrer_email: String,
    pub referee_name: String,
    pub referee_email: String,
    pub status: ReferralStatus,
    pub created_at: chrono::NaiveDateTime,
}

/// Submission payload. Fields default to empty strings so that missing keys
/// reach the service layer and fail validation there with a 400, instead of
/// being rejected by the JSON extractor.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewReferral {
    pub referrer_name: String,
    pub referrer_email: String,
    pub referee_name: String,
    pub referee_email: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: String,
}

#[derive(Clone, Copy, Debug, Serialize, sqlx::FromRow)]
pub struct ReferralStats {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
}
