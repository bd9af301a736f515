use crate::commands::{load_store, Out};
use crate::{Config, Result};
use serde::Serialize;

/// Counts of what the snapshot fetch brought back.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStats {
    pub transactions: usize,
    pub tasks: usize,
    pub projects: usize,
    pub cards: usize,
}

/// Fetches the current snapshot from the record store.
pub async fn sync(config: Config) -> Result<Out<SyncStats>> {
    let store = load_store(&config).await?;
    let stats = SyncStats {
        transactions: store.transactions().len(),
        tasks: store.tasks().len(),
        projects: store.projects().len(),
        cards: store.cards().len(),
    };
    Ok(Out::new(
        format!(
            "Fetched {} transactions, {} tasks, {} projects and {} cards",
            stats.transactions, stats.tasks, stats.projects, stats.cards
        ),
        stats,
    ))
}
