//! Binding of the task form posted to `/`.

use serde::Deserialize;
use time::{OffsetDateTime, UtcOffset};
use todo_reminder_core::id::TaskId;
use todo_reminder_core::parse_deadline;

/// Form fields exactly as submitted.
#[derive(Debug, Default, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub done: Option<String>,
    #[serde(default)]
    pub until: Option<String>,
    #[serde(default)]
    pub delete: Option<String>,
}

/// What a submitted form asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    Create {
        content: String,
        until: Option<OffsetDateTime>,
    },
    SetDone {
        id: TaskId,
        done: bool,
    },
    Delete(TaskId),
}

impl TaskForm {
    /// Decode the fields, collecting every binding error.
    pub fn bind(self, offset: UtcOffset) -> Result<TaskAction, Vec<String>> {
        let mut errors = Vec::new();

        let id = match non_empty(self.id.as_deref()) {
            None => None,
            Some(raw) => match raw.parse::<TaskId>() {
                Ok(id) => Some(id).filter(|id| id.is_persisted()),
                Err(_) => {
                    errors.push(format!("invalid id '{raw}'"));
                    None
                }
            },
        };
        let done = parse_done(self.done.as_deref()).unwrap_or_else(|err| {
            errors.push(err);
            false
        });
        let until = parse_deadline(self.until.as_deref().unwrap_or_default(), offset)
            .unwrap_or_else(|err| {
                errors.push(err.to_string());
                None
            });

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(match id {
            None => TaskAction::Create {
                content: self.content.unwrap_or_default(),
                until,
            },
            Some(id) if non_empty(self.delete.as_deref()).is_some() => TaskAction::Delete(id),
            Some(id) => TaskAction::SetDone { id, done },
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_done(value: Option<&str>) -> Result<bool, String> {
    match value.map(str::trim).unwrap_or_default() {
        "" | "0" | "false" | "off" => Ok(false),
        "1" | "true" | "on" => Ok(true),
        other => Err(format!("invalid done value '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    fn form(pairs: &[(&str, &str)]) -> TaskForm {
        let mut form = TaskForm::default();
        for (key, value) in pairs {
            let value = Some((*value).to_owned());
            match *key {
                "id" => form.id = value,
                "content" => form.content = value,
                "done" => form.done = value,
                "until" => form.until = value,
                "delete" => form.delete = value,
                other => panic!("unknown field {other}"),
            }
        }
        form
    }

    #[test]
    fn missing_or_zero_id_creates() {
        let action = form(&[("content", "buy milk"), ("until", "2024-05-01T09:30")])
            .bind(offset!(+9))
            .expect("bind");
        assert_eq!(
            action,
            TaskAction::Create {
                content: "buy milk".into(),
                until: Some(datetime!(2024-05-01 09:30 +9)),
            }
        );

        let action = form(&[("id", "0"), ("content", "x")]).bind(UtcOffset::UTC).expect("bind");
        assert!(matches!(action, TaskAction::Create { until: None, .. }));
    }

    #[test]
    fn delete_wins_over_done() {
        let action = form(&[("id", "7"), ("done", "on"), ("delete", "Delete")])
            .bind(UtcOffset::UTC)
            .expect("bind");
        assert_eq!(action, TaskAction::Delete(TaskId(7)));
    }

    #[test]
    fn done_accepts_checkbox_and_bool_spellings() {
        for (raw, expected) in [("on", true), ("true", true), ("1", true), ("false", false), ("0", false), ("", false)] {
            let action = form(&[("id", "3"), ("done", raw)]).bind(UtcOffset::UTC).expect("bind");
            assert_eq!(action, TaskAction::SetDone { id: TaskId(3), done: expected });
        }
        let action = form(&[("id", "3")]).bind(UtcOffset::UTC).expect("bind");
        assert_eq!(action, TaskAction::SetDone { id: TaskId(3), done: false });
    }

    #[test]
    fn binding_errors_are_collected() {
        let Err(errors) = form(&[("id", "abc"), ("done", "maybe"), ("until", "tomorrow")]).bind(UtcOffset::UTC)
        else {
            panic!("malformed form must fail");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("abc"));
        assert!(errors[1].contains("maybe"));
        assert!(errors[2].contains("failed to decode time"));
    }
}
