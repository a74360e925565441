use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, ValidationErrors};
use crate::models::UserId;

pub type TodoId = i64;

pub const DEFAULT_TITLE_MAX_LEN: usize = 30;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const BAD_DATETIME: &str = "Datetime has wrong format. Use RFC 3339.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: TodoId,
    #[sqlx(rename = "owner_id")]
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub due_time: DateTime<Utc>,
    pub completed: bool,
}

/// Validation rules applied to todo payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoRules {
    pub title_max_len: usize,
}

impl Default for TodoRules {
    fn default() -> Self {
        Self {
            title_max_len: DEFAULT_TITLE_MAX_LEN,
        }
    }
}

/// Body of a create request. Every field is optional at the wire level so
/// that missing fields surface as field-level validation errors. New todos
/// always start pending, so a `completed` key is ignored like `owner`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTodoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_time: Option<String>,
}

/// Body of an update request. `owner` and `id` are not part of it, so a
/// client supplying them has them ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_time: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
    pub due_time: DateTime<Utc>,
}

/// Validated partial update; `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_time: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
}

impl NewTodoRequest {
    pub fn validate(&self, rules: &TodoRules) -> Result<NewTodo, AppError> {
        let mut errors = ValidationErrors::new();

        let title = check_title(&mut errors, self.title.as_deref(), true, rules);
        let description = check_text(&mut errors, "description", self.description.as_deref(), true);
        let due_time = check_due_time(&mut errors, self.due_time.as_deref(), true);

        match (title, description, due_time) {
            (Some(title), Some(description), Some(due_time)) => errors.finish(NewTodo {
                title,
                description,
                due_time,
            }),
            _ => Err(AppError::Validation(errors)),
        }
    }
}

impl UpdateTodoRequest {
    pub fn validate(&self, rules: &TodoRules) -> Result<TodoChanges, AppError> {
        let mut errors = ValidationErrors::new();

        let changes = TodoChanges {
            title: check_title(&mut errors, self.title.as_deref(), false, rules),
            description: check_text(&mut errors, "description", self.description.as_deref(), false),
            due_time: check_due_time(&mut errors, self.due_time.as_deref(), false),
            completed: self.completed,
        };

        errors.finish(changes)
    }

    /// Full replacement (`PUT`) requires every field a create would require.
    pub fn require_full(&self) -> Result<(), AppError> {
        let mut errors = ValidationErrors::new();
        if self.title.is_none() {
            errors.add("title", REQUIRED);
        }
        if self.description.is_none() {
            errors.add("description", REQUIRED);
        }
        if self.due_time.is_none() {
            errors.add("due_time", REQUIRED);
        }
        errors.finish(())
    }
}

fn check_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    required: bool,
) -> Option<String> {
    match value.map(str::trim) {
        None => {
            if required {
                errors.add(field, REQUIRED);
            }
            None
        }
        Some("") => {
            errors.add(field, BLANK);
            None
        }
        Some(text) => Some(text.to_string()),
    }
}

fn check_title(
    errors: &mut ValidationErrors,
    value: Option<&str>,
    required: bool,
    rules: &TodoRules,
) -> Option<String> {
    let title = check_text(errors, "title", value, required)?;
    if title.chars().count() > rules.title_max_len {
        errors.add(
            "title",
            format!(
                "Ensure this field has no more than {} characters.",
                rules.title_max_len
            ),
        );
        return None;
    }
    Some(title)
}

fn check_due_time(
    errors: &mut ValidationErrors,
    value: Option<&str>,
    required: bool,
) -> Option<DateTime<Utc>> {
    let Some(raw) = value else {
        if required {
            errors.add("due_time", REQUIRED);
        }
        return None;
    };

    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(_) => {
            errors.add("due_time", BAD_DATETIME);
            None
        }
    }
}
