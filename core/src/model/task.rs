use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity is assigned by the server on create and never changes.
pub type TaskId = i64;

pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Display form, underscore swapped for a space.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    pub fn next(&self) -> TaskStatus {
        match self {
            TaskStatus::Todo => TaskStatus::InProgress,
            TaskStatus::InProgress => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Todo,
        }
    }
}

/// A task as the server stores it. `description` and `due_date` are
/// absent-or-present on the wire, never empty strings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl Task {
    /// Current field values as a draft, e.g. to resubmit with a changed status.
    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            due_date: self.due_date,
        }
    }
}

/// The unsaved, form-held shape of a task: everything but the id.
/// Serialized as the request body for both create and update.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl TaskDraft {
    /// Client-side validation shared by the add and edit forms.
    /// First violated rule wins; messages are shown verbatim.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("Title is required.");
        }
        if self.title.chars().count() > TITLE_MAX {
            return Err("Title must be at most 100 characters.");
        }
        if let Some(desc) = &self.description {
            if desc.chars().count() > DESCRIPTION_MAX {
                return Err("Description must be at most 500 characters.");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, description: Option<&str>) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: description.map(|d| d.to_string()),
            status: TaskStatus::Todo,
            due_date: None,
        }
    }

    #[test]
    fn empty_title_is_rejected() {
        assert_eq!(draft("", None).validate(), Err("Title is required."));
        assert_eq!(draft("   ", None).validate(), Err("Title is required."));
    }

    #[test]
    fn title_length_bound_is_inclusive() {
        assert!(draft(&"a".repeat(100), None).validate().is_ok());
        assert_eq!(
            draft(&"a".repeat(101), None).validate(),
            Err("Title must be at most 100 characters.")
        );
    }

    #[test]
    fn description_length_bound_is_inclusive() {
        assert!(draft("ok", Some(&"d".repeat(500))).validate().is_ok());
        assert_eq!(
            draft("ok", Some(&"d".repeat(501))).validate(),
            Err("Description must be at most 500 characters.")
        );
    }

    #[test]
    fn title_violation_wins_over_description() {
        let d = draft("", Some(&"d".repeat(501)));
        assert_eq!(d.validate(), Err("Title is required."));
    }

    #[test]
    fn deserializes_with_absent_optionals() {
        let task: Task =
            serde_json::from_str(r#"{"id":1,"title":"Buy milk","status":"TODO"}"#).unwrap();
        assert_eq!(task.id, 1);
        assert_eq!(task.description, None);
        assert_eq!(task.due_date, None);
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn absent_optionals_stay_off_the_wire() {
        let body = serde_json::to_value(draft("Buy milk", None)).unwrap();
        assert_eq!(body["title"], "Buy milk");
        assert_eq!(body["status"], "TODO");
        assert!(body.get("description").is_none());
        assert!(body.get("dueDate").is_none());
    }

    #[test]
    fn due_date_serializes_as_iso_calendar_date() {
        let mut d = draft("Buy milk", None);
        d.due_date = Some(chrono::NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        let body = serde_json::to_value(d).unwrap();
        assert_eq!(body["dueDate"], "2026-01-15");
    }

    #[test]
    fn status_uses_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            serde_json::json!("IN_PROGRESS")
        );
        let status: TaskStatus = serde_json::from_str(r#""DONE""#).unwrap();
        assert_eq!(status, TaskStatus::Done);
    }
}
