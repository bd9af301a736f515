//! Invoice accounting: pure functions over the domain snapshot.
//!
//! An "invoice" is the sum of unpaid credit-card expenses for one card. No
//! billing-cycle windowing is applied: every unpaid expense on the card counts
//! toward the current invoice regardless of which cycle it belongs to.

use crate::model::{Amount, CreditCard, Transaction, TransactionType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How close a card's due day is, relative to the current day of month.
///
/// Day-of-month integers only; a due day earlier in the month than today is
/// reported overdue even when the real due date is next month. Changing this
/// would change user-visible notification timing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    /// Due within the next three days.
    DueSoon,
    /// Due on the current day. Takes precedence over [`DueStatus::DueSoon`].
    DueToday,
    Overdue,
}

serde_plain::derive_display_from_serialize!(DueStatus);

/// Sums the unpaid expense transactions charged to `card_id`.
pub fn open_invoice(card_id: &str, transactions: &[Transaction]) -> Amount {
    let total: Decimal = transactions
        .iter()
        .filter(|t| {
            t.card_id.as_deref() == Some(card_id)
                && t.kind == TransactionType::Expense
                && !t.is_paid
        })
        .map(|t| t.amount.value())
        .sum();
    Amount::new(total)
}

/// The card's limit minus its open invoice. Negative means over limit, which
/// is a valid, displayable state.
pub fn available_credit(card: &CreditCard, transactions: &[Transaction]) -> Amount {
    let open = open_invoice(&card.id, transactions);
    Amount::new(card.limit_amount.value() - open.value())
}

/// Classifies a due day against the current day of month.
///
/// Returns `None` when the due day is more than three days out. Callers must
/// only apply this to cards with a positive open invoice; a card with nothing
/// owed has no due date worth reporting.
pub fn due_status(due_day: u8, current_day: u8) -> Option<DueStatus> {
    let diff = i32::from(due_day) - i32::from(current_day);
    if diff == 0 {
        Some(DueStatus::DueToday)
    } else if (1..=3).contains(&diff) {
        Some(DueStatus::DueSoon)
    } else if diff < 0 {
        Some(DueStatus::Overdue)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PaymentMethod, TransactionDate};
    use std::str::FromStr;

    fn expense(card_id: &str, amount: &str, paid: bool) -> Transaction {
        Transaction {
            id: format!("tx-{card_id}-{amount}-{paid}"),
            name: "compra".to_string(),
            amount: Amount::from_str(amount).unwrap(),
            date: TransactionDate::Today,
            kind: TransactionType::Expense,
            icon: "shopping_bag".to_string(),
            color: "orange".to_string(),
            payment_method: Some(PaymentMethod::CreditCard),
            card_id: Some(card_id.to_string()),
            is_paid: paid,
        }
    }

    fn card(id: &str, limit: &str, due_day: u8) -> CreditCard {
        CreditCard {
            id: id.to_string(),
            name: "Nubank".to_string(),
            limit_amount: Amount::from_str(limit).unwrap(),
            due_day,
            closing_day: 1,
            color: "purple".to_string(),
            last_digits: "1234".to_string(),
        }
    }

    #[test]
    fn test_open_invoice_no_transactions() {
        assert!(open_invoice("c1", &[]).is_zero());
    }

    #[test]
    fn test_open_invoice_progression() {
        let mut txs = vec![expense("c1", "40", false)];
        assert_eq!(open_invoice("c1", &txs).plain(), "40.00");

        txs[0].is_paid = true;
        assert!(open_invoice("c1", &txs).is_zero());
    }

    #[test]
    fn test_open_invoice_ignores_other_cards_income_and_paid() {
        let mut income = expense("c1", "99", false);
        income.kind = TransactionType::Income;
        let txs = vec![
            expense("c1", "10", false),
            expense("c1", "5", true),
            expense("c2", "77", false),
            income,
        ];
        assert_eq!(open_invoice("c1", &txs).plain(), "10.00");
    }

    #[test]
    fn test_available_credit_can_go_negative() {
        let card = card("c1", "100", 10);
        let txs = vec![expense("c1", "150", false)];
        let available = available_credit(&card, &txs);
        assert!(available.is_negative());
        assert_eq!(available.plain(), "-50.00");
    }

    #[test]
    fn test_due_today_takes_precedence_over_due_soon() {
        // Diff 0 falls inside the due-soon window but must classify as due today.
        assert_eq!(due_status(10, 10), Some(DueStatus::DueToday));
    }

    #[test]
    fn test_due_soon_window() {
        assert_eq!(due_status(10, 8), Some(DueStatus::DueSoon));
        assert_eq!(due_status(10, 7), Some(DueStatus::DueSoon));
        assert_eq!(due_status(10, 6), None);
    }

    #[test]
    fn test_overdue() {
        assert_eq!(due_status(10, 15), Some(DueStatus::Overdue));
    }

    #[test]
    fn test_cross_month_is_still_overdue_not_due_soon() {
        // Day 10 against day 20: the real due date may be next month, but the
        // day-of-month comparison reports overdue, never a due-soon via the
        // negative diff.
        assert_eq!(due_status(10, 20), Some(DueStatus::Overdue));
    }
}
