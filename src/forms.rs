use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

pub const TITLE_MAX: usize = 100;
pub const REPORT_MAX: usize = 10_000;
pub const COMMENT_MAX: usize = 1_000;
pub const NAME_MAX: usize = 100;
pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 8;

/// Per-field validation messages, rendered into failed-submit payloads.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, mut messages) in other.errors {
            self.errors.entry(field).or_default().append(&mut messages);
        }
    }
}

/// Shared text-field rule: no control characters beyond line breaks and
/// tabs, optional required check, byte-length cap.
fn check_text(errors: &mut FieldErrors, field: &str, value: &str, required: bool, max_len: usize) {
    if value.contains('\0')
        || value
            .chars()
            .any(|ch| ch.is_control() && ch != '\n' && ch != '\r' && ch != '\t')
    {
        errors.add(field, "This value contains invalid control characters.");
        return;
    }
    if required && value.trim().is_empty() {
        errors.add(field, "This field is required.");
    }
    if value.len() > max_len {
        errors.add(
            field,
            format!("Ensure this value has at most {} characters.", max_len),
        );
    }
}

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[A-Za-z0-9_-]+$").unwrap())
}

/// Accepts an absent or empty date parameter as "no filter".
pub fn de_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Splits a raw search input into whitespace-separated words. Words are
/// OR-combined downstream; multi-word AND is deliberately unsupported.
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub report_y: String,
    #[serde(default)]
    pub report_w: String,
    #[serde(default)]
    pub report_t: String,
    #[serde(default)]
    pub release: bool,
    /// Secondary submit: jump to the task page without saving.
    #[serde(default, skip_serializing)]
    pub gototask: bool,
}

impl DailyForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        check_text(&mut errors, "title", &self.title, true, TITLE_MAX);
        check_text(&mut errors, "report_y", &self.report_y, false, REPORT_MAX);
        check_text(&mut errors, "report_w", &self.report_w, false, REPORT_MAX);
        check_text(&mut errors, "report_t", &self.report_t, false, REPORT_MAX);
        errors
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub comment: String,
}

impl CommentForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        check_text(&mut errors, "comment", &self.comment, true, COMMENT_MAX);
        errors
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default, skip_serializing)]
    pub password_confirm: String,
}

impl RegisterForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if self.username.len() < USERNAME_MIN
            || self.username.len() > USERNAME_MAX
            || !username_pattern().is_match(&self.username)
        {
            errors.add(
                "username",
                "Username must be 3-50 characters and contain only letters, numbers, underscores, and hyphens.",
            );
        }
        check_text(&mut errors, "first_name", &self.first_name, false, NAME_MAX);
        check_text(&mut errors, "last_name", &self.last_name, false, NAME_MAX);
        if self.password.len() < PASSWORD_MIN {
            errors.add(
                "password",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    PASSWORD_MIN
                ),
            );
        }
        if self.password != self.password_confirm {
            errors.add("password_confirm", "The two password fields didn't match.");
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl ProfileForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        check_text(&mut errors, "first_name", &self.first_name, false, NAME_MAX);
        check_text(&mut errors, "last_name", &self.last_name, false, NAME_MAX);
        errors
    }
}

/// One row of the editable task form-set. A row with neither id, name, nor
/// date is the spare blank form and is skipped on submit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRowForm {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub implement_date: Option<NaiveDate>,
    #[serde(default)]
    pub complete: bool,
}

impl TaskRowForm {
    pub fn is_blank(&self) -> bool {
        self.id.is_none() && self.name.trim().is_empty() && self.implement_date.is_none()
    }

    pub fn validate_into(&self, index: usize, errors: &mut FieldErrors) {
        check_text(
            errors,
            &format!("tasks[{}].name", index),
            &self.name,
            true,
            NAME_MAX,
        );
        if self.implement_date.is_none() {
            errors.add(
                format!("tasks[{}].implement_date", index),
                "This field is required.",
            );
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFormSet {
    #[serde(default)]
    pub tasks: Vec<TaskRowForm>,
}

/// Echo of the date-narrowing controls on the task page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskSearchForm {
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub page: Option<i64>,
}

impl BookForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        check_text(&mut errors, "name", &self.name, true, NAME_MAX);
        check_text(&mut errors, "publisher", &self.publisher, false, NAME_MAX);
        if let Some(page) = self.page {
            if page < 0 {
                errors.add("page", "Ensure this value is greater than or equal to 0.");
            }
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImpressionForm {
    #[serde(default)]
    pub comment: String,
}

impl ImpressionForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        check_text(&mut errors, "comment", &self.comment, true, COMMENT_MAX);
        errors
    }
}
