use crate::commands::{load_store, Out};
use crate::notify::{derive, Notification};
use crate::{Config, Result};
use chrono::Local;

/// Lists the current notifications: overdue and due-today tasks, plus
/// invoice alerts for cards with an open balance.
pub async fn notify(config: Config) -> Result<Out<Vec<Notification>>> {
    let store = load_store(&config).await?;
    let today = Local::now().date_naive();
    let notifications = derive(store.tasks(), store.cards(), store.transactions(), today);

    let message = if notifications.is_empty() {
        "Tudo tranquilo por aqui.".to_string()
    } else {
        notifications
            .iter()
            .map(|n| format!("[{}] {}: {}", n.severity, n.title, n.body))
            .collect::<Vec<_>>()
            .join("\n")
    };
    Ok(Out::new(message, notifications))
}
