//! External collaborators: the persistent record store and the
//! language-understanding service.
//!
//! The engine talks to both through traits so the dispatcher and the domain
//! store can be exercised against in-memory doubles. The snake_case row
//! structs in this module are the record store's wire shape; every
//! camelCase-domain to snake_case-column mapping lives here and nowhere else.

mod gemini;
mod rest;
#[cfg(test)]
pub(crate) mod test_api;

pub use gemini::GeminiClient;
pub use rest::RestStore;

use crate::model::{
    CreditCard, PaymentMethod, Priority, Project, SubTask, Task, TaskLog, Transaction,
    TransactionDate, TransactionType,
};
use crate::Result;
use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One user's full data set, as fetched from the record store.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub cards: Vec<CreditCard>,
}

/// A generic record store scoped to one authenticated user.
///
/// Implementations persist whatever they are given and must not apply
/// domain rules; validation happens in the domain store before any call
/// reaches this trait.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetches every collection, newest first.
    async fn fetch_all(&self) -> Result<Snapshot>;

    async fn insert_transaction(&self, row: TransactionRow) -> Result<()>;
    async fn delete_transaction(&self, id: &str) -> Result<()>;
    /// Marks every unpaid expense on `card_id` as paid, in one batch.
    async fn mark_card_paid(&self, card_id: &str) -> Result<()>;

    async fn insert_task(
        &self,
        row: TaskRow,
        subtasks: Vec<SubTaskRow>,
        logs: Vec<TaskLogRow>,
    ) -> Result<()>;
    async fn update_task(&self, row: TaskRow) -> Result<()>;
    async fn delete_task(&self, id: &str) -> Result<()>;
    async fn insert_task_log(&self, row: TaskLogRow) -> Result<()>;

    async fn insert_project(&self, row: ProjectRow) -> Result<()>;
    async fn delete_project(&self, id: &str) -> Result<()>;
    /// Clears `project_id` on every task row that references `project_id`.
    async fn clear_project_refs(&self, project_id: &str) -> Result<()>;

    async fn insert_card(&self, row: CardRow) -> Result<()>;
    async fn delete_card(&self, id: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A `transactions` table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: String,
    pub name: String,
    pub amount: Decimal,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub icon: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
}

impl From<&Transaction> for TransactionRow {
    fn from(t: &Transaction) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            amount: t.amount.value(),
            date: t.date.to_string(),
            kind: t.kind,
            icon: t.icon.clone(),
            color: t.color.clone(),
            payment_method: t.payment_method,
            card_id: t.card_id.clone(),
            is_paid: t.is_paid,
        }
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = anyhow::Error;

    fn try_from(row: TransactionRow) -> Result<Self> {
        let date = TransactionDate::from_str(&row.date)
            .with_context(|| format!("transaction {}", row.id))?;
        Ok(Self {
            id: row.id,
            name: row.name,
            amount: row.amount.into(),
            date,
            kind: row.kind,
            icon: row.icon,
            color: row.color,
            payment_method: row.payment_method,
            card_id: row.card_id,
            is_paid: row.is_paid,
        })
    }
}

/// A `tasks` table row. `subtasks` and `task_logs` are populated by the
/// nested fetch and never written back through this row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub category_icon: String,
    pub time: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing)]
    pub subtasks: Vec<SubTaskRow>,
    #[serde(default, skip_serializing)]
    pub task_logs: Vec<TaskLogRow>,
}

impl From<&Task> for TaskRow {
    fn from(t: &Task) -> Self {
        Self {
            id: t.id.clone(),
            title: t.title.clone(),
            category: t.category.clone(),
            category_icon: t.category_icon.clone(),
            time: t.time.clone(),
            date: t.date,
            completed: t.completed,
            priority: t.priority,
            project_id: t.project_id.clone(),
            tags: t.tags.clone(),
            subtasks: Vec::new(),
            task_logs: Vec::new(),
        }
    }
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            category: row.category,
            category_icon: row.category_icon,
            time: row.time,
            date: row.date,
            completed: row.completed,
            priority: row.priority,
            project_id: row.project_id,
            tags: row.tags,
            subtasks: row.subtasks.into_iter().map(SubTask::from).collect(),
            logs: row.task_logs.into_iter().map(TaskLog::from).collect(),
        }
    }
}

/// A `subtasks` table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTaskRow {
    pub id: String,
    pub task_id: String,
    pub title: String,
    pub completed: bool,
}

impl SubTaskRow {
    pub fn new(task_id: &str, subtask: &SubTask) -> Self {
        Self {
            id: subtask.id.clone(),
            task_id: task_id.to_string(),
            title: subtask.title.clone(),
            completed: subtask.completed,
        }
    }
}

impl From<SubTaskRow> for SubTask {
    fn from(row: SubTaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            completed: row.completed,
        }
    }
}

/// A `task_logs` table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskLogRow {
    pub id: String,
    pub task_id: String,
    pub text: String,
    pub timestamp: String,
}

impl TaskLogRow {
    pub fn new(task_id: &str, log: &TaskLog) -> Self {
        Self {
            id: log.id.clone(),
            task_id: task_id.to_string(),
            text: log.text.clone(),
            timestamp: log.timestamp.clone(),
        }
    }
}

impl From<TaskLogRow> for TaskLog {
    fn from(row: TaskLogRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            timestamp: row.timestamp,
        }
    }
}

/// A `projects` table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub logo: String,
    pub color: String,
}

impl From<&Project> for ProjectRow {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            logo: p.logo.clone(),
            color: p.color.clone(),
        }
    }
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            logo: row.logo,
            color: row.color,
        }
    }
}

/// A `credit_cards` table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRow {
    pub id: String,
    pub name: String,
    pub limit_amount: Decimal,
    pub due_day: u8,
    pub closing_day: u8,
    pub color: String,
    pub last_digits: String,
}

impl From<&CreditCard> for CardRow {
    fn from(c: &CreditCard) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            limit_amount: c.limit_amount.value(),
            due_day: c.due_day,
            closing_day: c.closing_day,
            color: c.color.clone(),
            last_digits: c.last_digits.clone(),
        }
    }
}

impl From<CardRow> for CreditCard {
    fn from(row: CardRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            limit_amount: row.limit_amount.into(),
            due_day: row.due_day,
            closing_day: row.closing_day,
            color: row.color,
            last_digits: row.last_digits,
        }
    }
}

// ---------------------------------------------------------------------------
// Language-understanding service
// ---------------------------------------------------------------------------

/// One element of a conversation turn sent to the language service.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Inline binary payload (audio or image) with its media type.
    Inline { mime_type: String, data: Vec<u8> },
    /// The outcome of one executed tool invocation, keyed by the invocation
    /// identifier the service assigned (when it assigned one).
    ToolResult {
        id: Option<String>,
        name: String,
        result: String,
    },
}

/// A tool invocation requested by the language service.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: Option<String>,
    pub name: String,
    pub args: serde_json::Value,
}

/// What the language service returned for one turn: narration text, tool
/// invocations, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: Option<String>,
    pub calls: Vec<ToolCall>,
}

/// Declaration of one callable operation, supplied to the service at session
/// start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDecl {
    pub name: String,
    pub description: String,
    /// JSON schema for the argument object.
    pub parameters: serde_json::Value,
}

/// Factory for conversation sessions.
pub trait LanguageModel: Send + Sync {
    /// Opens a fresh session carrying `system_instruction` and the fixed tool
    /// set. Session lifetime is managed by the caller; dropping the session
    /// discards its context.
    fn start_session(
        &self,
        system_instruction: String,
        tools: Vec<ToolDecl>,
    ) -> Box<dyn LanguageSession>;
}

/// One continuous conversation with the language service.
#[async_trait::async_trait]
pub trait LanguageSession: Send {
    /// Submits one turn (user payload or batched tool results) and returns
    /// the service's reply.
    async fn send(&mut self, parts: Vec<Part>) -> Result<ModelReply>;
}
