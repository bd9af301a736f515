use serde::{Deserialize, Serialize};

/// A grouping that tasks can point at through their `project_id`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// URL, emoji or embedded image data.
    pub logo: String,
    pub color: String,
}

/// Input for [`crate::store::Store::add_project`]. The store assigns the id.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub logo: String,
    pub color: String,
}
