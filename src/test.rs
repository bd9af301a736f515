//! Shared test utilities.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::test_api::MemoryStore;
use crate::model::{
    Amount, CardDraft, TaskDraft, TransactionDate, TransactionDraft, TransactionType,
};
use crate::store::Store;
use chrono::NaiveDate;
use std::sync::Arc;

/// A [`Store`] over an in-memory record store, plus a handle to that record
/// store for asserting on what the persistence adapter was given.
pub(crate) struct TestEnv {
    pub(crate) records: Arc<MemoryStore>,
    pub(crate) store: Store,
}

impl TestEnv {
    pub(crate) fn new() -> Self {
        let records = Arc::new(MemoryStore::new());
        let store = Store::new(records.clone());
        Self { records, store }
    }

    /// Adds a card and returns its id.
    pub(crate) async fn seed_card(&mut self, name: &str, due_day: u8) -> String {
        let (card, _) = self
            .store
            .add_card(CardDraft {
                name: name.to_string(),
                limit_amount: Amount::from_f64(1000.0).unwrap(),
                due_day,
                closing_day: 1,
                color: "purple".to_string(),
                last_digits: "1234".to_string(),
            })
            .await
            .unwrap();
        card.id
    }

    /// Adds an incomplete task and returns its id.
    pub(crate) async fn seed_task(&mut self, title: &str, date: Option<NaiveDate>) -> String {
        let (task, _) = self
            .store
            .add_task(TaskDraft {
                title: title.to_string(),
                category: "Geral".to_string(),
                category_icon: "check_circle".to_string(),
                time: "09:00".to_string(),
                date,
                ..TaskDraft::default()
            })
            .await
            .unwrap();
        task.id
    }

    /// Adds an incomplete task linked to a project and returns its id.
    pub(crate) async fn seed_task_in_project(
        &mut self,
        title: &str,
        project_id: &str,
    ) -> String {
        let (task, _) = self
            .store
            .add_task(TaskDraft {
                title: title.to_string(),
                category: "Geral".to_string(),
                category_icon: "check_circle".to_string(),
                time: "09:00".to_string(),
                project_id: Some(project_id.to_string()),
                ..TaskDraft::default()
            })
            .await
            .unwrap();
        task.id
    }

    /// Adds a pix expense and returns its id.
    pub(crate) async fn seed_expense(&mut self, name: &str, amount: f64) -> String {
        let (tx, _) = self
            .store
            .add_transaction(TransactionDraft {
                name: name.to_string(),
                amount: Amount::from_f64(amount).unwrap(),
                date: TransactionDate::Today,
                kind: TransactionType::Expense,
                icon: "shopping_bag".to_string(),
                color: "orange".to_string(),
                payment_method: Some(crate::model::PaymentMethod::Pix),
                card_id: None,
            })
            .await
            .unwrap();
        tx.id
    }
}
