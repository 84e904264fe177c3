//! Whitelist application record model for persistence.
//!
//! Maps to the `applications` table and is used by ApplicationRepository.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an application. Pending is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ApplicationStatus::Pending),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated submission input used to construct a record.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub chat_id: String,
    pub game_id: String,
    pub character_name: String,
    pub birth_date: NaiveDate,
    pub backstory: String,
    pub reason: String,
    /// Request origin, audit only; never exposed externally.
    pub ip_address: Option<String>,
    /// Client string, audit only; never exposed externally.
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApplicationRecord {
    pub id: String,
    pub chat_id: String,
    pub game_id: String,
    pub character_name: String,
    pub birth_date: NaiveDate,
    pub backstory: String,
    pub reason: String,
    pub status: ApplicationStatus,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewer_id: Option<String>,
    pub reviewer_name: Option<String>,
    pub feedback: String,
    pub notification_message_id: Option<String>,
    pub notification_channel_id: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Full years between `birth` and `on`. Saturates at 0 when `birth` is in the future.
pub fn age_on(birth: NaiveDate, on: NaiveDate) -> u32 {
    let mut age = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age.max(0) as u32
}

impl ApplicationRecord {
    /// Creates a pending record with a generated UUID and current timestamp.
    /// Review fields stay empty and notification linkage unset until later
    /// lifecycle steps fill them.
    pub fn new(input: NewApplication) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            chat_id: input.chat_id,
            game_id: input.game_id,
            character_name: input.character_name,
            birth_date: input.birth_date,
            backstory: input.backstory,
            reason: input.reason,
            status: ApplicationStatus::Pending,
            reviewed_at: None,
            reviewer_id: None,
            reviewer_name: None,
            feedback: String::new(),
            notification_message_id: None,
            notification_channel_id: None,
            submitted_at: Utc::now(),
            ip_address: input.ip_address,
            user_agent: input.user_agent,
        }
    }

    /// Age derived from birth_date at read time; not stored.
    pub fn age(&self) -> u32 {
        age_on(self.birth_date, Utc::now().date_naive())
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }

    /// Public projection: everything an applicant or reviewer may see.
    /// Audit metadata and notification linkage ids are deliberately absent.
    pub fn to_public(&self) -> PublicApplication {
        PublicApplication {
            id: self.id.clone(),
            chat_id: self.chat_id.clone(),
            game_id: self.game_id.clone(),
            character_name: self.character_name.clone(),
            birth_date: self.birth_date,
            age: self.age(),
            backstory: self.backstory.clone(),
            reason: self.reason.clone(),
            status: self.status,
            feedback: self.feedback.clone(),
            reviewed_at: self.reviewed_at,
            reviewer_id: self.reviewer_id.clone(),
            reviewer_name: self.reviewer_name.clone(),
            submitted_at: self.submitted_at,
        }
    }
}

/// Externally visible view of an [`ApplicationRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicApplication {
    pub id: String,
    pub chat_id: String,
    pub game_id: String,
    pub character_name: String,
    pub birth_date: NaiveDate,
    pub age: u32,
    pub backstory: String,
    pub reason: String,
    pub status: ApplicationStatus,
    pub feedback: String,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewer_id: Option<String>,
    pub reviewer_name: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_on_before_and_after_birthday() {
        let birth = date(2000, 6, 15);
        assert_eq!(age_on(birth, date(2026, 6, 14)), 25);
        assert_eq!(age_on(birth, date(2026, 6, 15)), 26);
        assert_eq!(age_on(birth, date(2026, 6, 16)), 26);
    }

    #[test]
    fn test_age_on_future_birth_saturates_to_zero() {
        assert_eq!(age_on(date(2030, 1, 1), date(2026, 1, 1)), 0);
    }

    #[test]
    fn test_new_record_is_pending_with_empty_review_fields() {
        let record = ApplicationRecord::new(NewApplication {
            chat_id: "u1".to_string(),
            game_id: "steam_1".to_string(),
            character_name: "Anna".to_string(),
            birth_date: date(2000, 1, 1),
            backstory: "b".repeat(120),
            reason: "r".repeat(20),
            ip_address: None,
            user_agent: None,
        });

        assert_eq!(record.status, ApplicationStatus::Pending);
        assert!(record.reviewed_at.is_none());
        assert!(record.reviewer_id.is_none());
        assert_eq!(record.feedback, "");
        assert!(record.notification_message_id.is_none());
    }

    #[test]
    fn test_public_projection_omits_audit_fields() {
        let mut record = ApplicationRecord::new(NewApplication {
            chat_id: "u1".to_string(),
            game_id: "steam_1".to_string(),
            character_name: "Anna".to_string(),
            birth_date: date(2000, 1, 1),
            backstory: "b".repeat(120),
            reason: "r".repeat(20),
            ip_address: Some("10.0.0.1".to_string()),
            user_agent: Some("curl/8".to_string()),
        });
        record.notification_message_id = Some("m1".to_string());
        record.notification_channel_id = Some("c1".to_string());

        let json = serde_json::to_value(record.to_public()).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        for hidden in ["ip_address", "user_agent", "notification_message_id", "notification_channel_id"] {
            assert!(!keys.contains(&hidden), "{} leaked into public view", hidden);
        }
    }
}
