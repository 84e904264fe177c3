//! Renders an application record into notification content and controls.
//!
//! Backstory and reason are capped for display; the full text stays on the
//! record. Buttons are present only while the record is pending.

use review::control;
use storage::{ApplicationRecord, ApplicationStatus};

use crate::client::{ActionRow, Button, MessagePayload};

/// Display caps, not validation limits.
const BACKSTORY_DISPLAY_CAP: usize = 1000;
const REASON_DISPLAY_CAP: usize = 500;

/// Truncates to `max` characters, marking the cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut)
}

fn status_line(record: &ApplicationRecord) -> String {
    match record.status {
        ApplicationStatus::Pending => "⏳ Pending review".to_string(),
        ApplicationStatus::Approved => {
            let reviewer = record.reviewer_name.as_deref().unwrap_or("unknown");
            format!("✅ Approved by {}", reviewer)
        }
        ApplicationStatus::Rejected => {
            let reviewer = record.reviewer_name.as_deref().unwrap_or("unknown");
            if record.feedback.is_empty() {
                format!("❌ Rejected by {}", reviewer)
            } else {
                format!("❌ Rejected by {}: {}", reviewer, record.feedback)
            }
        }
    }
}

/// Notification body for both the interactive post and later edits.
pub fn render_content(record: &ApplicationRecord) -> String {
    format!(
        "**Whitelist application** `{id}`\n\
         Applicant: <@{chat_id}> (game id: `{game_id}`)\n\
         Character: **{name}** ({age} years old)\n\
         Submitted: {submitted}\n\n\
         **Backstory**\n{backstory}\n\n\
         **Reason**\n{reason}\n\n\
         {status}",
        id = record.id,
        chat_id = record.chat_id,
        game_id = record.game_id,
        name = record.character_name,
        age = record.age(),
        submitted = record.submitted_at.format("%Y-%m-%d %H:%M UTC"),
        backstory = truncate(&record.backstory, BACKSTORY_DISPLAY_CAP),
        reason = truncate(&record.reason, REASON_DISPLAY_CAP),
        status = status_line(record),
    )
}

/// Approve/reject buttons while pending; nothing once terminal, so an edit
/// with this payload strips the controls from the message.
pub fn render_components(record: &ApplicationRecord) -> Vec<ActionRow> {
    if !record.is_pending() {
        return Vec::new();
    }
    vec![ActionRow::new(vec![
        Button::new(
            Button::STYLE_SUCCESS,
            "Approve",
            control::approve_id(&record.id),
        ),
        Button::new(
            Button::STYLE_DANGER,
            "Reject",
            control::reject_id(&record.id),
        ),
    ])]
}

pub fn render_payload(record: &ApplicationRecord) -> MessagePayload {
    MessagePayload {
        content: render_content(record),
        components: render_components(record),
    }
}

/// Fallback content when the interactive post could not be delivered.
pub fn render_degraded_content(record: &ApplicationRecord) -> String {
    format!(
        "⚠️ Interactive controls unavailable - use the manual `/review` command \
         (`/review action:approve id:{id}` or `/review action:reject id:{id}`).\n\n{content}",
        id = record.id,
        content = render_content(record),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use storage::NewApplication;

    fn record() -> ApplicationRecord {
        ApplicationRecord::new(NewApplication {
            chat_id: "u1".to_string(),
            game_id: "game_1".to_string(),
            character_name: "Anna".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            backstory: "b".repeat(1500),
            reason: "r".repeat(600),
            ip_address: None,
            user_agent: None,
        })
    }

    #[test]
    fn test_truncate_caps_long_text() {
        assert_eq!(truncate("hello", 10), "hello");
        let capped = truncate(&"x".repeat(20), 10);
        assert_eq!(capped.chars().count(), 11);
        assert!(capped.ends_with('…'));
    }

    #[test]
    fn test_pending_record_renders_buttons() {
        let record = record();
        let rows = render_components(&record);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].components.len(), 2);
        assert_eq!(
            rows[0].components[0].custom_id,
            review::control::approve_id(&record.id)
        );
    }

    #[test]
    fn test_terminal_record_renders_no_buttons() {
        let mut record = record();
        record.status = ApplicationStatus::Approved;
        assert!(render_components(&record).is_empty());
    }

    #[test]
    fn test_content_truncates_backstory_and_reason() {
        let record = record();
        let content = render_content(&record);
        assert!(!content.contains(&"b".repeat(1100)));
        assert!(content.contains(&"b".repeat(1000)));
    }

    #[test]
    fn test_rejected_content_carries_feedback() {
        let mut record = record();
        record.status = ApplicationStatus::Rejected;
        record.reviewer_name = Some("mod_anna".to_string());
        record.feedback = "Thiếu thông tin".to_string();

        let content = render_content(&record);
        assert!(content.contains("Rejected by mod_anna"));
        assert!(content.contains("Thiếu thông tin"));
    }

    #[test]
    fn test_degraded_content_points_at_manual_command() {
        let record = record();
        let content = render_degraded_content(&record);
        assert!(content.contains("/review"));
        assert!(content.contains(&record.id));
    }
}
