//! In-memory doubles for the record store and the language service.
//!
//! `MemoryStore` persists rows in a mutex-guarded state object and can be
//! switched into a failing mode to exercise the optimistic-write path.
//! `ScriptedModel` replays a queue of canned replies and records everything
//! the dispatcher sends, so tool-loop behavior can be asserted without a
//! network.

use crate::api::{
    CardRow, LanguageModel, LanguageSession, ModelReply, Part, ProjectRow, RecordStore, Snapshot,
    SubTaskRow, TaskLogRow, TaskRow, ToolCall, ToolDecl, TransactionRow,
};
use crate::model::{Task, Transaction};
use crate::Result;
use anyhow::bail;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Rows held by a [`MemoryStore`].
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryState {
    pub(crate) transactions: Vec<TransactionRow>,
    pub(crate) tasks: Vec<TaskRow>,
    pub(crate) subtasks: Vec<SubTaskRow>,
    pub(crate) task_logs: Vec<TaskLogRow>,
    pub(crate) projects: Vec<ProjectRow>,
    pub(crate) cards: Vec<CardRow>,
}

/// An in-memory [`RecordStore`].
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    state: Mutex<MemoryState>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// When enabled, every write returns an error while reads keep working.
    pub(crate) fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn state(&self) -> MemoryState {
        self.state.lock().unwrap().clone()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("simulated remote failure");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Snapshot> {
        let state = self.state();
        let transactions = state
            .transactions
            .iter()
            .cloned()
            .map(Transaction::try_from)
            .collect::<Result<Vec<_>>>()?;
        let tasks = state
            .tasks
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.subtasks = state
                    .subtasks
                    .iter()
                    .filter(|s| s.task_id == row.id)
                    .cloned()
                    .collect();
                row.task_logs = state
                    .task_logs
                    .iter()
                    .filter(|l| l.task_id == row.id)
                    .cloned()
                    .collect();
                Task::from(row)
            })
            .collect();
        Ok(Snapshot {
            transactions,
            tasks,
            projects: state.projects.iter().cloned().map(Into::into).collect(),
            cards: state.cards.iter().cloned().map(Into::into).collect(),
        })
    }

    async fn insert_transaction(&self, row: TransactionRow) -> Result<()> {
        self.check_writable()?;
        self.state.lock().unwrap().transactions.insert(0, row);
        Ok(())
    }

    async fn delete_transaction(&self, id: &str) -> Result<()> {
        self.check_writable()?;
        self.state.lock().unwrap().transactions.retain(|t| t.id != id);
        Ok(())
    }

    async fn mark_card_paid(&self, card_id: &str) -> Result<()> {
        self.check_writable()?;
        for row in &mut self.state.lock().unwrap().transactions {
            if row.card_id.as_deref() == Some(card_id)
                && row.kind == crate::model::TransactionType::Expense
            {
                row.is_paid = true;
            }
        }
        Ok(())
    }

    async fn insert_task(
        &self,
        row: TaskRow,
        subtasks: Vec<SubTaskRow>,
        logs: Vec<TaskLogRow>,
    ) -> Result<()> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        state.tasks.insert(0, row);
        state.subtasks.extend(subtasks);
        state.task_logs.extend(logs);
        Ok(())
    }

    async fn update_task(&self, row: TaskRow) -> Result<()> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.tasks.iter_mut().find(|t| t.id == row.id) {
            *existing = row;
        }
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();
        state.tasks.retain(|t| t.id != id);
        state.subtasks.retain(|s| s.task_id != id);
        state.task_logs.retain(|l| l.task_id != id);
        Ok(())
    }

    async fn insert_task_log(&self, row: TaskLogRow) -> Result<()> {
        self.check_writable()?;
        self.state.lock().unwrap().task_logs.push(row);
        Ok(())
    }

    async fn insert_project(&self, row: ProjectRow) -> Result<()> {
        self.check_writable()?;
        self.state.lock().unwrap().projects.insert(0, row);
        Ok(())
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        self.check_writable()?;
        self.state.lock().unwrap().projects.retain(|p| p.id != id);
        Ok(())
    }

    async fn clear_project_refs(&self, project_id: &str) -> Result<()> {
        self.check_writable()?;
        for row in &mut self.state.lock().unwrap().tasks {
            if row.project_id.as_deref() == Some(project_id) {
                row.project_id = None;
            }
        }
        Ok(())
    }

    async fn insert_card(&self, row: CardRow) -> Result<()> {
        self.check_writable()?;
        self.state.lock().unwrap().cards.insert(0, row);
        Ok(())
    }

    async fn delete_card(&self, id: &str) -> Result<()> {
        self.check_writable()?;
        self.state.lock().unwrap().cards.retain(|c| c.id != id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scripted language service
// ---------------------------------------------------------------------------

type ScriptedReply = std::result::Result<ModelReply, String>;

/// A [`LanguageModel`] that replays canned replies.
#[derive(Debug, Default, Clone)]
pub(crate) struct ScriptedModel {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    /// Served whenever the queue runs dry. Useful for simulating a service
    /// that never stops requesting tool calls.
    fallback: Arc<Mutex<Option<ModelReply>>>,
    sent: Arc<Mutex<Vec<Vec<Part>>>>,
    sessions: Arc<Mutex<Vec<String>>>,
}

impl ScriptedModel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_reply(&self, reply: ModelReply) {
        self.replies.lock().unwrap().push_back(Ok(reply));
    }

    pub(crate) fn push_failure(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub(crate) fn set_fallback(&self, reply: ModelReply) {
        *self.fallback.lock().unwrap() = Some(reply);
    }

    /// Everything the dispatcher submitted, one entry per `send`.
    pub(crate) fn sent(&self) -> Vec<Vec<Part>> {
        self.sent.lock().unwrap().clone()
    }

    /// The system instructions of every session opened on this model.
    pub(crate) fn system_instructions(&self) -> Vec<String> {
        self.sessions.lock().unwrap().clone()
    }
}

impl LanguageModel for ScriptedModel {
    fn start_session(
        &self,
        system_instruction: String,
        _tools: Vec<ToolDecl>,
    ) -> Box<dyn LanguageSession> {
        self.sessions.lock().unwrap().push(system_instruction);
        Box::new(ScriptedSession {
            model: self.clone(),
        })
    }
}

struct ScriptedSession {
    model: ScriptedModel,
}

#[async_trait::async_trait]
impl LanguageSession for ScriptedSession {
    async fn send(&mut self, parts: Vec<Part>) -> Result<ModelReply> {
        self.model.sent.lock().unwrap().push(parts);
        let next = self.model.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => bail!("{message}"),
            None => match self.model.fallback.lock().unwrap().clone() {
                Some(reply) => Ok(reply),
                None => Ok(ModelReply::default()),
            },
        }
    }
}

/// Shorthand for a reply carrying only narration.
pub(crate) fn narration(text: &str) -> ModelReply {
    ModelReply {
        text: Some(text.to_string()),
        calls: Vec::new(),
    }
}

/// Shorthand for a reply carrying a single tool invocation.
pub(crate) fn tool_call(name: &str, args: serde_json::Value) -> ModelReply {
    ModelReply {
        text: None,
        calls: vec![ToolCall {
            id: Some(format!("call-{name}")),
            name: name.to_string(),
            args,
        }],
    }
}
