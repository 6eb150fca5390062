pub mod mailer;
pub mod referrals;
