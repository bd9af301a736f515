//! The domain store: one authenticated user's in-memory snapshot and every
//! mutation against it.
//!
//! Mutations follow an optimistic two-phase contract. Validation runs first
//! and rejects bad input before anything is touched. The local snapshot is
//! then updated, and only afterwards is the remote write attempted. The
//! outcome distinguishes [`Persistence::Confirmed`] from
//! [`Persistence::LocalOnly`]; a remote failure is logged and surfaced as a
//! warning, never as an error, and local state is not rolled back. Local
//! state is the source of truth for everything downstream.

use crate::api::{
    CardRow, ProjectRow, RecordStore, SubTaskRow, TaskLogRow, TaskRow, TransactionRow,
};
use crate::model::{
    CardDraft, CreditCard, PaymentMethod, Project, ProjectDraft, SubTask, Task, TaskDraft,
    TaskLog, Transaction, TransactionDraft,
};
use crate::EngineError;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// How far a mutation made it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Persistence {
    /// Applied locally and acknowledged by the record store.
    Confirmed,
    /// Applied locally; the remote write failed with the contained warning.
    LocalOnly(String),
}

impl Persistence {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Persistence::Confirmed)
    }
}

type MutationResult<T> = std::result::Result<T, EngineError>;

/// Holds the current snapshot of transactions, tasks, projects and cards,
/// newest first, and mediates every mutation.
///
/// Construction and teardown follow the authenticated session: build one per
/// signed-in user and drop it on sign-out. Components that need data receive
/// a reference; there is no global instance.
pub struct Store {
    records: Arc<dyn RecordStore>,
    transactions: Vec<Transaction>,
    tasks: Vec<Task>,
    projects: Vec<Project>,
    cards: Vec<CreditCard>,
}

impl Store {
    /// Creates an empty store over the given persistence adapter. Call
    /// [`Store::refresh`] to populate it.
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self {
            records,
            transactions: Vec::new(),
            tasks: Vec::new(),
            projects: Vec::new(),
            cards: Vec::new(),
        }
    }

    /// Replaces the snapshot with the record store's current contents.
    pub async fn refresh(&mut self) -> crate::Result<()> {
        let snapshot = self.records.fetch_all().await?;
        self.transactions = snapshot.transactions;
        self.tasks = snapshot.tasks;
        self.projects = snapshot.projects;
        self.cards = snapshot.cards;
        debug!(
            "Snapshot refreshed: {} transactions, {} tasks, {} projects, {} cards",
            self.transactions.len(),
            self.tasks.len(),
            self.projects.len(),
            self.cards.len()
        );
        Ok(())
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn cards(&self) -> &[CreditCard] {
        &self.cards
    }

    /// First card whose name contains `keyword`, case-insensitive, in list
    /// order. The first-match tie-break is part of the dispatcher contract.
    pub fn find_card(&self, keyword: &str) -> Option<&CreditCard> {
        let keyword = keyword.to_lowercase();
        self.cards
            .iter()
            .find(|c| c.name.to_lowercase().contains(&keyword))
    }

    /// First transaction whose name contains `keyword`, case-insensitive.
    pub fn find_transaction(&self, keyword: &str) -> Option<&Transaction> {
        let keyword = keyword.to_lowercase();
        self.transactions
            .iter()
            .find(|t| t.name.to_lowercase().contains(&keyword))
    }

    /// First task whose title contains `keyword`, case-insensitive.
    pub fn find_task(&self, keyword: &str) -> Option<&Task> {
        let keyword = keyword.to_lowercase();
        self.tasks
            .iter()
            .find(|t| t.title.to_lowercase().contains(&keyword))
    }

    /// First project whose name contains `keyword`, case-insensitive.
    pub fn find_project(&self, keyword: &str) -> Option<&Project> {
        let keyword = keyword.to_lowercase();
        self.projects
            .iter()
            .find(|p| p.name.to_lowercase().contains(&keyword))
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Validates and records a new transaction, newest first.
    pub async fn add_transaction(
        &mut self,
        draft: TransactionDraft,
    ) -> MutationResult<(Transaction, Persistence)> {
        if draft.name.trim().is_empty() {
            return Err(EngineError::Validation(
                "transaction name must not be empty".to_string(),
            ));
        }
        if !draft.amount.is_positive() {
            return Err(EngineError::Validation(
                "transaction amount must be a positive number".to_string(),
            ));
        }
        if draft.card_id.is_some() && draft.payment_method != Some(PaymentMethod::CreditCard) {
            return Err(EngineError::Validation(
                "a card reference requires the credit_card payment method".to_string(),
            ));
        }

        let transaction = Transaction {
            id: new_id(),
            name: draft.name,
            amount: draft.amount,
            date: draft.date,
            kind: draft.kind,
            icon: draft.icon,
            color: draft.color,
            payment_method: draft.payment_method,
            card_id: draft.card_id,
            is_paid: false,
        };
        let row = TransactionRow::from(&transaction);
        self.transactions.insert(0, transaction.clone());

        let persistence = note_remote(
            self.records.insert_transaction(row).await,
            "insert transaction",
        );
        Ok((transaction, persistence))
    }

    /// Removes a transaction by id. Absent ids are a no-op, not an error.
    pub async fn delete_transaction(&mut self, id: &str) -> MutationResult<Persistence> {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        if self.transactions.len() == before {
            debug!("delete_transaction: id '{id}' not present, nothing to do");
            return Ok(Persistence::Confirmed);
        }
        Ok(note_remote(
            self.records.delete_transaction(id).await,
            "delete transaction",
        ))
    }

    /// Marks every unpaid expense on `card_id` as paid, in one batch.
    /// Invoking it again is harmless; the matching set is already empty.
    pub async fn pay_card_invoice(&mut self, card_id: &str) -> MutationResult<Persistence> {
        for t in &mut self.transactions {
            if t.card_id.as_deref() == Some(card_id)
                && t.kind == crate::model::TransactionType::Expense
            {
                t.is_paid = true;
            }
        }
        Ok(note_remote(
            self.records.mark_card_paid(card_id).await,
            "pay card invoice",
        ))
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub async fn add_task(&mut self, draft: TaskDraft) -> MutationResult<(Task, Persistence)> {
        if draft.title.trim().is_empty() {
            return Err(EngineError::Validation(
                "task title must not be empty".to_string(),
            ));
        }

        let task = Task {
            id: new_id(),
            title: draft.title,
            category: draft.category,
            category_icon: draft.category_icon,
            time: draft.time,
            date: draft.date,
            completed: draft.completed,
            priority: draft.priority,
            project_id: draft.project_id,
            tags: draft.tags,
            subtasks: draft
                .subtasks
                .into_iter()
                .map(|title| SubTask {
                    id: new_id(),
                    title,
                    completed: false,
                })
                .collect(),
            logs: draft
                .logs
                .into_iter()
                .map(|log| TaskLog {
                    id: new_id(),
                    text: log.text,
                    timestamp: log.timestamp,
                })
                .collect(),
        };

        let row = TaskRow::from(&task);
        let subtask_rows = task
            .subtasks
            .iter()
            .map(|s| SubTaskRow::new(&task.id, s))
            .collect();
        let log_rows = task
            .logs
            .iter()
            .map(|l| TaskLogRow::new(&task.id, l))
            .collect();
        self.tasks.insert(0, task.clone());

        let persistence = note_remote(
            self.records.insert_task(row, subtask_rows, log_rows).await,
            "insert task",
        );
        Ok((task, persistence))
    }

    /// Replaces the full task record. Last write wins; there is no
    /// field-level merge. Absent ids are a no-op.
    pub async fn update_task(&mut self, task: Task) -> MutationResult<Persistence> {
        let Some(existing) = self.tasks.iter_mut().find(|t| t.id == task.id) else {
            debug!("update_task: id '{}' not present, nothing to do", task.id);
            return Ok(Persistence::Confirmed);
        };
        *existing = task.clone();
        Ok(note_remote(
            self.records.update_task(TaskRow::from(&task)).await,
            "update task",
        ))
    }

    /// Removes a task and, with it, the subtasks and logs it owns.
    pub async fn delete_task(&mut self, id: &str) -> MutationResult<Persistence> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            debug!("delete_task: id '{id}' not present, nothing to do");
            return Ok(Persistence::Confirmed);
        }
        Ok(note_remote(self.records.delete_task(id).await, "delete task"))
    }

    /// Flips a task's completion state.
    pub async fn toggle_task(&mut self, id: &str) -> MutationResult<Persistence> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!("toggle_task: id '{id}' not present, nothing to do");
            return Ok(Persistence::Confirmed);
        };
        task.completed = !task.completed;
        let row = TaskRow::from(&*task);
        Ok(note_remote(
            self.records.update_task(row).await,
            "toggle task",
        ))
    }

    /// Prepends a log entry to a task; logs are kept newest first.
    pub async fn append_task_log(
        &mut self,
        task_id: &str,
        text: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> MutationResult<Persistence> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_id) else {
            return Err(EngineError::NotFound(format!("task '{task_id}'")));
        };
        let log = TaskLog {
            id: new_id(),
            text: text.into(),
            timestamp: timestamp.into(),
        };
        let row = TaskLogRow::new(task_id, &log);
        task.logs.insert(0, log);
        Ok(note_remote(
            self.records.insert_task_log(row).await,
            "append task log",
        ))
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub async fn add_project(
        &mut self,
        draft: ProjectDraft,
    ) -> MutationResult<(Project, Persistence)> {
        if draft.name.trim().is_empty() {
            return Err(EngineError::Validation(
                "project name must not be empty".to_string(),
            ));
        }
        let project = Project {
            id: new_id(),
            name: draft.name,
            logo: draft.logo,
            color: draft.color,
        };
        let row = ProjectRow::from(&project);
        self.projects.insert(0, project.clone());
        let persistence = note_remote(self.records.insert_project(row).await, "insert project");
        Ok((project, persistence))
    }

    /// Removes a project and clears `project_id` on every task that
    /// referenced it, locally and remotely, as one logical operation.
    pub async fn delete_project(&mut self, id: &str) -> MutationResult<Persistence> {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() == before {
            debug!("delete_project: id '{id}' not present, nothing to do");
            return Ok(Persistence::Confirmed);
        }
        for task in &mut self.tasks {
            if task.project_id.as_deref() == Some(id) {
                task.project_id = None;
            }
        }

        let remote = async {
            self.records.clear_project_refs(id).await?;
            self.records.delete_project(id).await
        };
        Ok(note_remote(remote.await, "delete project"))
    }

    // -----------------------------------------------------------------------
    // Cards
    // -----------------------------------------------------------------------

    pub async fn add_card(&mut self, draft: CardDraft) -> MutationResult<(CreditCard, Persistence)> {
        if draft.name.trim().is_empty() {
            return Err(EngineError::Validation(
                "card name must not be empty".to_string(),
            ));
        }
        if draft.limit_amount.is_negative() {
            return Err(EngineError::Validation(
                "card limit must not be negative".to_string(),
            ));
        }
        for (label, day) in [("due day", draft.due_day), ("closing day", draft.closing_day)] {
            if !(1..=31).contains(&day) {
                return Err(EngineError::Validation(format!(
                    "card {label} must be between 1 and 31, got {day}"
                )));
            }
        }

        let card = CreditCard {
            id: new_id(),
            name: draft.name,
            limit_amount: draft.limit_amount,
            due_day: draft.due_day,
            closing_day: draft.closing_day,
            color: draft.color,
            last_digits: draft.last_digits,
        };
        let row = CardRow::from(&card);
        self.cards.insert(0, card.clone());
        let persistence = note_remote(self.records.insert_card(row).await, "insert card");
        Ok((card, persistence))
    }

    /// Removes a card. Transactions that referenced it are untouched and keep
    /// their dangling `card_id`; the history is intentionally preserved.
    pub async fn delete_card(&mut self, id: &str) -> MutationResult<Persistence> {
        let before = self.cards.len();
        self.cards.retain(|c| c.id != id);
        if self.cards.len() == before {
            debug!("delete_card: id '{id}' not present, nothing to do");
            return Ok(Persistence::Confirmed);
        }
        Ok(note_remote(self.records.delete_card(id).await, "delete card"))
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn note_remote(result: crate::Result<()>, what: &str) -> Persistence {
    match result {
        Ok(()) => Persistence::Confirmed,
        Err(e) => {
            let warning = format!("{what}: {e}");
            warn!("{}", EngineError::RemoteWrite(warning.clone()));
            Persistence::LocalOnly(warning)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounting::open_invoice;
    use crate::model::{Amount, TransactionDate, TransactionType};
    use crate::test::TestEnv;

    fn expense_draft(name: &str, amount: f64) -> TransactionDraft {
        TransactionDraft {
            name: name.to_string(),
            amount: Amount::from_f64(amount).unwrap(),
            date: TransactionDate::Today,
            kind: TransactionType::Expense,
            icon: "shopping_bag".to_string(),
            color: "orange".to_string(),
            payment_method: Some(PaymentMethod::Pix),
            card_id: None,
        }
    }

    #[tokio::test]
    async fn test_add_transaction_rejects_empty_name() {
        let mut env = TestEnv::new();
        let err = env
            .store
            .add_transaction(expense_draft("  ", 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        // Nothing was written anywhere.
        assert!(env.store.transactions().is_empty());
        assert!(env.records.state().transactions.is_empty());
    }

    #[tokio::test]
    async fn test_add_transaction_rejects_non_positive_amount() {
        let mut env = TestEnv::new();
        let err = env
            .store
            .add_transaction(expense_draft("Café", 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_add_transaction_rejects_card_without_credit_method() {
        let mut env = TestEnv::new();
        let mut draft = expense_draft("Café", 10.0);
        draft.card_id = Some("c1".to_string());
        let err = env.store.add_transaction(draft).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_add_transaction_card_reference_with_credit_method() {
        let mut env = TestEnv::new();
        let mut draft = expense_draft("Mercado", 80.0);
        draft.payment_method = Some(PaymentMethod::CreditCard);
        draft.card_id = Some("c1".to_string());
        let (tx, persistence) = env.store.add_transaction(draft).await.unwrap();
        assert!(persistence.is_confirmed());
        assert_eq!(tx.card_id.as_deref(), Some("c1"));
        assert!(!tx.is_paid);
        // The adapter saw the snake_case row.
        let rows = env.records.state().transactions;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].card_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_add_transaction_prepends() {
        let mut env = TestEnv::new();
        env.store
            .add_transaction(expense_draft("primeiro", 1.0))
            .await
            .unwrap();
        env.store
            .add_transaction(expense_draft("segundo", 2.0))
            .await
            .unwrap();
        assert_eq!(env.store.transactions()[0].name, "segundo");
    }

    #[tokio::test]
    async fn test_delete_transaction_absent_is_noop() {
        let mut env = TestEnv::new();
        env.store
            .add_transaction(expense_draft("Café", 10.0))
            .await
            .unwrap();
        let persistence = env.store.delete_transaction("missing").await.unwrap();
        assert!(persistence.is_confirmed());
        assert_eq!(env.store.transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_pay_card_invoice_is_idempotent() {
        let mut env = TestEnv::new();
        let card_id = env.seed_card("Nubank", 10).await;
        let mut draft = expense_draft("Mercado", 120.0);
        draft.payment_method = Some(PaymentMethod::CreditCard);
        draft.card_id = Some(card_id.clone());
        env.store.add_transaction(draft).await.unwrap();
        assert_eq!(
            open_invoice(&card_id, env.store.transactions()).plain(),
            "120.00"
        );

        env.store.pay_card_invoice(&card_id).await.unwrap();
        let after_once: Vec<_> = env.store.transactions().to_vec();
        assert!(open_invoice(&card_id, env.store.transactions()).is_zero());

        env.store.pay_card_invoice(&card_id).await.unwrap();
        assert_eq!(env.store.transactions(), after_once.as_slice());
        assert!(open_invoice(&card_id, env.store.transactions()).is_zero());
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_local_state() {
        let mut env = TestEnv::new();
        env.records.set_fail_writes(true);
        let (tx, persistence) = env
            .store
            .add_transaction(expense_draft("Café", 10.0))
            .await
            .unwrap();
        match persistence {
            Persistence::LocalOnly(warning) => {
                assert!(warning.contains("insert transaction"))
            }
            Persistence::Confirmed => panic!("expected a remote failure"),
        }
        // Optimistic state stands.
        assert_eq!(env.store.transactions()[0].id, tx.id);
        assert!(env.records.state().transactions.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_task_flips_completed() {
        let mut env = TestEnv::new();
        let task_id = env.seed_task("Treino", None).await;
        env.store.toggle_task(&task_id).await.unwrap();
        assert!(env.store.tasks()[0].completed);
        env.store.toggle_task(&task_id).await.unwrap();
        assert!(!env.store.tasks()[0].completed);
    }

    #[tokio::test]
    async fn test_update_task_replaces_full_record() {
        let mut env = TestEnv::new();
        let task_id = env.seed_task("Ler livro", None).await;
        let mut updated = env.store.tasks()[0].clone();
        assert_eq!(updated.id, task_id);
        updated.title = "Ler outro livro".to_string();
        updated.tags = vec!["leitura".to_string()];
        env.store.update_task(updated.clone()).await.unwrap();
        assert_eq!(env.store.tasks()[0], updated);
        assert_eq!(env.records.state().tasks[0].title, "Ler outro livro");
    }

    #[tokio::test]
    async fn test_delete_project_clears_references_everywhere() {
        let mut env = TestEnv::new();
        let (project, _) = env
            .store
            .add_project(ProjectDraft {
                name: "Casa".to_string(),
                logo: "🏠".to_string(),
                color: "blue".to_string(),
            })
            .await
            .unwrap();
        let task_id = env.seed_task_in_project("Pintar parede", &project.id).await;

        env.store.delete_project(&project.id).await.unwrap();

        assert!(env.store.projects().is_empty());
        let task = env.store.tasks().iter().find(|t| t.id == task_id).unwrap();
        assert_eq!(task.project_id, None);
        // The persistence adapter's row was cleared too.
        let row = env
            .records
            .state()
            .tasks
            .into_iter()
            .find(|t| t.id == task_id)
            .unwrap();
        assert_eq!(row.project_id, None);
    }

    #[tokio::test]
    async fn test_delete_card_keeps_transaction_history() {
        let mut env = TestEnv::new();
        let card_id = env.seed_card("Inter", 5).await;
        let mut draft = expense_draft("Assinatura", 30.0);
        draft.payment_method = Some(PaymentMethod::CreditCard);
        draft.card_id = Some(card_id.clone());
        env.store.add_transaction(draft).await.unwrap();

        env.store.delete_card(&card_id).await.unwrap();

        assert!(env.store.cards().is_empty());
        // The dangling reference is retained on purpose.
        assert_eq!(
            env.store.transactions()[0].card_id.as_deref(),
            Some(card_id.as_str())
        );
    }

    #[tokio::test]
    async fn test_add_card_validates_day_range() {
        let mut env = TestEnv::new();
        let err = env
            .store
            .add_card(CardDraft {
                name: "Nubank".to_string(),
                limit_amount: Amount::from_f64(1000.0).unwrap(),
                due_day: 32,
                closing_day: 1,
                color: "purple".to_string(),
                last_digits: "1234".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_append_task_log_prepends() {
        let mut env = TestEnv::new();
        let task_id = env.seed_task("Projeto", None).await;
        env.store
            .append_task_log(&task_id, "começado", "07/08 10:00")
            .await
            .unwrap();
        env.store
            .append_task_log(&task_id, "metade pronta", "07/08 15:00")
            .await
            .unwrap();
        let task = &env.store.tasks()[0];
        assert_eq!(task.logs[0].text, "metade pronta");
        assert_eq!(task.logs[1].text, "começado");
    }

    #[tokio::test]
    async fn test_refresh_round_trips_through_adapter() {
        let mut env = TestEnv::new();
        env.store
            .add_transaction(expense_draft("Café", 10.0))
            .await
            .unwrap();
        env.seed_task("Treino", None).await;

        let mut fresh = Store::new(env.records.clone());
        fresh.refresh().await.unwrap();
        assert_eq!(fresh.transactions(), env.store.transactions());
        assert_eq!(fresh.tasks(), env.store.tasks());
    }

    #[tokio::test]
    async fn test_find_helpers_match_first_case_insensitive() {
        let mut env = TestEnv::new();
        env.store
            .add_transaction(expense_draft("Café da manhã", 12.0))
            .await
            .unwrap();
        env.store
            .add_transaction(expense_draft("Cafeteria centro", 8.0))
            .await
            .unwrap();
        // Newest first, so the most recent match wins the tie-break.
        assert_eq!(
            env.store.find_transaction("CAFE").map(|t| t.name.as_str()),
            Some("Cafeteria centro")
        );
        // The accented keyword only matches the older entry.
        assert_eq!(
            env.store.find_transaction("café").map(|t| t.name.as_str()),
            Some("Café da manhã")
        );
    }
}
