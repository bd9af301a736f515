use crate::model::Amount;
use anyhow::bail;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether money came in or went out.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// How an expense was paid. Only meaningful for expenses.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Pix,
    Cash,
    CreditCard,
}

serde_plain::derive_display_from_serialize!(PaymentMethod);
serde_plain::derive_fromstr_from_deserialize!(PaymentMethod);

/// The calendar date of a transaction.
///
/// Entries created conversationally carry the literal `"Hoje"` sentinel
/// instead of a resolved date; that is the stored value, not a parse-time
/// convenience, so the sentinel survives round trips to the record store.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TransactionDate {
    /// The "Hoje" sentinel written by the conversational flow.
    Today,
    On(NaiveDate),
}

impl fmt::Display for TransactionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionDate::Today => write!(f, "Hoje"),
            TransactionDate::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl FromStr for TransactionDate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("hoje") {
            return Ok(TransactionDate::Today);
        }
        match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => Ok(TransactionDate::On(date)),
            Err(_) => bail!("invalid transaction date '{s}'"),
        }
    }
}

impl Serialize for TransactionDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TransactionDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TransactionDate::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A single income or expense entry.
///
/// `card_id` may only be present when `payment_method` is
/// [`PaymentMethod::CreditCard`]; the store rejects drafts that violate this.
/// The reverse does not hold: a credit-card expense recorded while no card
/// was registered carries no card reference. A `card_id` may also dangle
/// after its card is deleted; transaction history is kept on purpose.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub id: String,
    pub name: String,
    pub amount: Amount,
    pub date: TransactionDate,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub icon: String,
    pub color: String,
    pub payment_method: Option<PaymentMethod>,
    pub card_id: Option<String>,
    pub is_paid: bool,
}

/// Input for [`crate::store::Store::add_transaction`]. The store assigns the
/// id and the initial `is_paid` state.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TransactionDraft {
    pub name: String,
    pub amount: Amount,
    pub date: TransactionDate,
    pub kind: TransactionType,
    pub icon: String,
    pub color: String,
    pub payment_method: Option<PaymentMethod>,
    pub card_id: Option<String>,
}
