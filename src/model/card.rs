use crate::model::Amount;
use serde::{Deserialize, Serialize};

/// A registered credit card.
///
/// `due_day` and `closing_day` are plain day-of-month integers (1-31) with no
/// month or year attached. Due-date classification therefore does not model
/// cross-month rollover; see [`crate::accounting::due_status`].
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreditCard {
    pub id: String,
    pub name: String,
    pub limit_amount: Amount,
    pub due_day: u8,
    pub closing_day: u8,
    /// Presentation tag, opaque to the engine.
    pub color: String,
    pub last_digits: String,
}

/// Input for [`crate::store::Store::add_card`]. The store assigns the id.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CardDraft {
    pub name: String,
    pub limit_amount: Amount,
    pub due_day: u8,
    pub closing_day: u8,
    pub color: String,
    pub last_digits: String,
}
