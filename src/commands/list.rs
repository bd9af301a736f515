use crate::accounting::{available_credit, open_invoice};
use crate::args::{ListArgs, ListEntity};
use crate::commands::{load_store, Out};
use crate::{Config, Result};

/// Prints one of the record collections.
pub async fn list(config: Config, args: ListArgs) -> Result<Out<serde_json::Value>> {
    let store = load_store(&config).await?;

    let (lines, structure) = match args.entity() {
        ListEntity::Transactions => (
            store
                .transactions()
                .iter()
                .map(|t| {
                    let paid = if t.is_paid { ", paga" } else { "" };
                    format!("{}  {}  {} ({}{})", t.date, t.name, t.amount, t.kind, paid)
                })
                .collect::<Vec<_>>(),
            serde_json::to_value(store.transactions())?,
        ),
        ListEntity::Tasks => (
            store
                .tasks()
                .iter()
                .map(|t| {
                    let marker = if t.completed { 'x' } else { ' ' };
                    let date = t
                        .date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "sem data".to_string());
                    format!("[{marker}] {} ({date}) {}", t.title, t.category)
                })
                .collect::<Vec<_>>(),
            serde_json::to_value(store.tasks())?,
        ),
        ListEntity::Cards => (
            store
                .cards()
                .iter()
                .map(|c| {
                    format!(
                        "{} (Final {}): fatura aberta {}, limite disponível {}",
                        c.name,
                        c.last_digits,
                        open_invoice(&c.id, store.transactions()),
                        available_credit(c, store.transactions()),
                    )
                })
                .collect::<Vec<_>>(),
            serde_json::to_value(store.cards())?,
        ),
        ListEntity::Projects => (
            store
                .projects()
                .iter()
                .map(|p| format!("{} {}", p.logo, p.name))
                .collect::<Vec<_>>(),
            serde_json::to_value(store.projects())?,
        ),
    };

    let message = if lines.is_empty() {
        format!("No {} yet", args.entity())
    } else {
        lines.join("\n")
    };
    Ok(Out::new(message, structure))
}
