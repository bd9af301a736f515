//! Derives actionable alerts from the domain snapshot.
//!
//! Pure function of the snapshot and "today": overdue and due-today tasks,
//! plus invoice due-date alerts for cards with an open balance. Tasks are
//! emitted before cards and each group follows the store's list order; no
//! urgency re-sort happens here. Presentation ordering belongs to the
//! consumer.

use crate::accounting::{due_status, open_invoice, DueStatus};
use crate::model::{CreditCard, Task, Transaction};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Danger,
}

serde_plain::derive_display_from_serialize!(Severity);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskOverdue,
    TaskDueToday,
    InvoiceDueSoon,
    InvoiceDueToday,
    InvoiceOverdue,
}

serde_plain::derive_display_from_serialize!(NotificationKind);

/// What tapping a notification should do. The pay action is a thin trigger
/// for [`crate::store::Store::pay_card_invoice`] and nothing else.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum NotificationAction {
    PayInvoice { card_id: String },
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Notification {
    /// Id of the task or card the alert is about.
    pub entity_id: String,
    pub severity: Severity,
    pub kind: NotificationKind,
    /// Material Symbols icon name.
    pub icon: String,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<NotificationAction>,
}

/// Evaluates every task and card independently; a single call may yield
/// several notifications for the same entity set and none are de-duplicated.
/// Cards with a zero open invoice never produce a due-date alert.
pub fn derive(
    tasks: &[Task],
    cards: &[CreditCard],
    transactions: &[Transaction],
    today: NaiveDate,
) -> Vec<Notification> {
    let mut notifications = Vec::new();

    for task in tasks {
        if task.completed {
            continue;
        }
        let Some(date) = task.date else { continue };
        if date < today {
            notifications.push(Notification {
                entity_id: task.id.clone(),
                severity: Severity::Danger,
                kind: NotificationKind::TaskOverdue,
                icon: "event_busy".to_string(),
                title: "Tarefa Atrasada".to_string(),
                body: format!("\"{}\" venceu em {}.", task.title, date.format("%Y-%m-%d")),
                action: None,
            });
        } else if date == today {
            notifications.push(Notification {
                entity_id: task.id.clone(),
                severity: Severity::Warning,
                kind: NotificationKind::TaskDueToday,
                icon: "event".to_string(),
                title: "Vence Hoje".to_string(),
                body: format!("\"{}\" vence hoje.", task.title),
                action: None,
            });
        }
    }

    let current_day = today.day() as u8;
    for card in cards {
        let invoice = open_invoice(&card.id, transactions);
        if !invoice.is_positive() {
            continue;
        }
        let pay = Some(NotificationAction::PayInvoice {
            card_id: card.id.clone(),
        });
        match due_status(card.due_day, current_day) {
            Some(DueStatus::DueSoon) => notifications.push(Notification {
                entity_id: card.id.clone(),
                severity: Severity::Info,
                kind: NotificationKind::InvoiceDueSoon,
                icon: "credit_card".to_string(),
                title: "Fatura Próxima".to_string(),
                body: format!("Fatura de {} vence dia {}.", invoice, card.due_day),
                action: pay,
            }),
            Some(DueStatus::DueToday) => notifications.push(Notification {
                entity_id: card.id.clone(),
                severity: Severity::Danger,
                kind: NotificationKind::InvoiceDueToday,
                icon: "payments".to_string(),
                title: "Fatura Vence Hoje".to_string(),
                body: format!("Pagar {} do {} hoje!", invoice, card.name),
                action: pay,
            }),
            Some(DueStatus::Overdue) => notifications.push(Notification {
                entity_id: card.id.clone(),
                severity: Severity::Danger,
                kind: NotificationKind::InvoiceOverdue,
                icon: "warning".to_string(),
                title: "Fatura Atrasada".to_string(),
                body: format!(
                    "Dia {} já passou. Fatura de {} em aberto.",
                    card.due_day, invoice
                ),
                action: pay,
            }),
            None => {}
        }
    }

    notifications
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Amount, PaymentMethod, Priority, TransactionDate, TransactionType,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 10).unwrap()
    }

    fn task(id: &str, title: &str, date: Option<NaiveDate>, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            category: "Geral".to_string(),
            category_icon: "check_circle".to_string(),
            time: "09:00".to_string(),
            date,
            completed,
            priority: Priority::None,
            project_id: None,
            tags: Vec::new(),
            subtasks: Vec::new(),
            logs: Vec::new(),
        }
    }

    fn card(id: &str, due_day: u8) -> CreditCard {
        CreditCard {
            id: id.to_string(),
            name: "Nubank".to_string(),
            limit_amount: Amount::from_f64(1000.0).unwrap(),
            due_day,
            closing_day: 1,
            color: "purple".to_string(),
            last_digits: "1234".to_string(),
        }
    }

    fn unpaid_expense(card_id: &str, amount: f64) -> Transaction {
        Transaction {
            id: format!("tx-{card_id}"),
            name: "compra".to_string(),
            amount: Amount::from_f64(amount).unwrap(),
            date: TransactionDate::Today,
            kind: TransactionType::Expense,
            icon: "shopping_bag".to_string(),
            color: "orange".to_string(),
            payment_method: Some(PaymentMethod::CreditCard),
            card_id: Some(card_id.to_string()),
            is_paid: false,
        }
    }

    #[test]
    fn test_zero_invoice_card_never_alerts() {
        // Due day equal to today would alert if anything were owed.
        let cards = vec![card("c1", 10)];
        let notifications = derive(&[], &cards, &[], today());
        assert!(notifications.is_empty());
    }

    #[test]
    fn test_due_today_is_a_single_danger_alert() {
        let cards = vec![card("c1", 10)];
        let txs = vec![unpaid_expense("c1", 100.0)];
        let notifications = derive(&[], &cards, &txs, today());
        // Diff 0 must classify as due today, not additionally as due soon.
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::InvoiceDueToday);
        assert_eq!(notifications[0].severity, Severity::Danger);
        assert!(notifications[0].action.is_some());
    }

    #[test]
    fn test_due_soon_is_info_and_actionable() {
        let cards = vec![card("c1", 12)];
        let txs = vec![unpaid_expense("c1", 50.0)];
        let notifications = derive(&[], &cards, &txs, today());
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::InvoiceDueSoon);
        assert_eq!(notifications[0].severity, Severity::Info);
        assert_eq!(
            notifications[0].action,
            Some(NotificationAction::PayInvoice {
                card_id: "c1".to_string()
            })
        );
    }

    #[test]
    fn test_overdue_invoice() {
        let cards = vec![card("c1", 5)];
        let txs = vec![unpaid_expense("c1", 50.0)];
        let notifications = derive(&[], &cards, &txs, today());
        assert_eq!(notifications[0].kind, NotificationKind::InvoiceOverdue);
        assert_eq!(notifications[0].severity, Severity::Danger);
    }

    #[test]
    fn test_task_rules() {
        let tasks = vec![
            task("t1", "atrasada", Some(today().pred_opt().unwrap()), false),
            task("t2", "hoje", Some(today()), false),
            task("t3", "futura", today().succ_opt(), false),
            task("t4", "sem data", None, false),
            task("t5", "feita ontem", Some(today().pred_opt().unwrap()), true),
        ];
        let notifications = derive(&tasks, &[], &[], today());
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].kind, NotificationKind::TaskOverdue);
        assert_eq!(notifications[0].severity, Severity::Danger);
        assert_eq!(notifications[1].kind, NotificationKind::TaskDueToday);
        assert_eq!(notifications[1].severity, Severity::Warning);
    }

    #[test]
    fn test_order_follows_store_order_tasks_then_cards() {
        let tasks = vec![
            task("t1", "primeira", Some(today()), false),
            task("t2", "segunda", Some(today()), false),
        ];
        let cards = vec![card("c1", 11), card("c2", 12)];
        let txs = vec![unpaid_expense("c1", 10.0), unpaid_expense("c2", 20.0)];
        let notifications = derive(&tasks, &cards, &txs, today());
        let ids: Vec<&str> = notifications.iter().map(|n| n.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "c1", "c2"]);
    }
}
