//! Submission field validation.
//!
//! Collects every failing field into one error list so the form can show
//! per-field feedback; nothing is constructed unless the whole set passes.

use chrono::{NaiveDate, Utc};
use portal_core::FieldError;
use serde::Deserialize;
use storage::age_on;

pub const MIN_AGE: u32 = 16;

/// Raw submission payload as received from the form.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionInput {
    pub chat_id: String,
    pub game_id: String,
    pub character_name: String,
    /// ISO date string (YYYY-MM-DD), parsed during validation.
    pub birth_date: String,
    pub backstory: String,
    pub reason: String,
    #[serde(skip)]
    pub ip_address: Option<String>,
    #[serde(skip)]
    pub user_agent: Option<String>,
}

/// Submission whose fields all passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub chat_id: String,
    pub game_id: String,
    pub character_name: String,
    pub birth_date: NaiveDate,
    pub backstory: String,
    pub reason: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

fn check_length(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.push(FieldError::new(
            field,
            format!("must be between {} and {} characters", min, max),
        ));
    }
}

/// Validates every field, returning either the parsed submission or the full
/// list of failures.
pub fn validate(input: &SubmissionInput) -> Result<ValidatedSubmission, Vec<FieldError>> {
    let mut errors = Vec::new();

    let chat_id = input.chat_id.trim().to_string();
    let game_id = input.game_id.trim().to_string();
    let character_name = input.character_name.trim().to_string();
    let backstory = input.backstory.trim().to_string();
    let reason = input.reason.trim().to_string();

    check_length(&mut errors, "chat_id", &chat_id, 2, 50);
    check_length(&mut errors, "game_id", &game_id, 5, 100);
    check_length(&mut errors, "character_name", &character_name, 2, 100);
    check_length(&mut errors, "backstory", &backstory, 100, 2000);
    check_length(&mut errors, "reason", &reason, 10, 1000);

    let birth_date = match NaiveDate::parse_from_str(input.birth_date.trim(), "%Y-%m-%d") {
        Ok(date) => {
            if age_on(date, Utc::now().date_naive()) < MIN_AGE {
                errors.push(FieldError::new(
                    "birth_date",
                    format!("applicant must be at least {} years old", MIN_AGE),
                ));
            }
            Some(date)
        }
        Err(_) => {
            errors.push(FieldError::new(
                "birth_date",
                "must be a valid date in YYYY-MM-DD format",
            ));
            None
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidatedSubmission {
        chat_id,
        game_id,
        character_name,
        // errors is empty here, so the date parsed
        birth_date: birth_date.expect("birth_date parsed"),
        backstory,
        reason,
        ip_address: input.ip_address.clone(),
        user_agent: input.user_agent.clone(),
    })
}
