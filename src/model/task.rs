use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Task priority, stored numerically (0 = none, 1 = high, 2 = medium, 3 = low).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub enum Priority {
    #[default]
    None,
    High,
    Medium,
    Low,
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::None => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        match value {
            1 => Priority::High,
            2 => Priority::Medium,
            3 => Priority::Low,
            // Unknown values collapse to None rather than failing the row.
            _ => Priority::None,
        }
    }
}

impl Serialize for Priority {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(*self))
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Priority::from(u8::deserialize(deserializer)?))
    }
}

/// A checklist item owned by a task.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SubTask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

/// A free-form progress note owned by a task, newest first.
///
/// `timestamp` is a display string, not an orderable instant.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TaskLog {
    pub id: String,
    pub text: String,
    pub timestamp: String,
}

/// A to-do item. Owns its subtasks and logs: deleting the task discards them.
///
/// `project_id` is a weak reference. Deleting the referenced project clears it;
/// it never dangles.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub category: String,
    pub category_icon: String,
    /// Display time in HH:MM.
    pub time: String,
    pub date: Option<NaiveDate>,
    pub completed: bool,
    pub priority: Priority,
    pub project_id: Option<String>,
    pub tags: Vec<String>,
    pub subtasks: Vec<SubTask>,
    pub logs: Vec<TaskLog>,
}

/// A log entry without an id, as authored by the caller.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TaskLogDraft {
    pub text: String,
    pub timestamp: String,
}

/// Input for [`crate::store::Store::add_task`]. The store assigns ids to the
/// task and to any subtasks or logs created with it.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub category: String,
    pub category_icon: String,
    pub time: String,
    pub date: Option<NaiveDate>,
    pub completed: bool,
    pub priority: Priority,
    pub project_id: Option<String>,
    pub tags: Vec<String>,
    /// Subtask titles, created uncompleted.
    pub subtasks: Vec<String>,
    pub logs: Vec<TaskLogDraft>,
}
