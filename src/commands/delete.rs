use crate::args::DeleteSubcommand;
use crate::commands::{load_store, with_warning, Out};
use crate::{Config, Result};

/// Deletes the first record whose name or title matches the keyword,
/// case-insensitively, using the same first-match tie-break as the
/// assistant's tools.
pub async fn delete(config: Config, entity: &DeleteSubcommand) -> Result<Out<()>> {
    let mut store = load_store(&config).await?;

    let (what, found) = match entity {
        DeleteSubcommand::Transaction(args) => (
            "transaction",
            store
                .find_transaction(args.keyword())
                .map(|t| (t.id.clone(), t.name.clone())),
        ),
        DeleteSubcommand::Task(args) => (
            "task",
            store
                .find_task(args.keyword())
                .map(|t| (t.id.clone(), t.title.clone())),
        ),
        DeleteSubcommand::Project(args) => (
            "project",
            store
                .find_project(args.keyword())
                .map(|p| (p.id.clone(), p.name.clone())),
        ),
        DeleteSubcommand::Card(args) => (
            "card",
            store
                .find_card(args.keyword())
                .map(|c| (c.id.clone(), c.name.clone())),
        ),
    };

    let Some((id, name)) = found else {
        return Ok(Out::new_message(format!("No {what} matched the keyword")));
    };

    let persistence = match entity {
        DeleteSubcommand::Transaction(_) => store.delete_transaction(&id).await?,
        DeleteSubcommand::Task(_) => store.delete_task(&id).await?,
        DeleteSubcommand::Project(_) => store.delete_project(&id).await?,
        DeleteSubcommand::Card(_) => store.delete_card(&id).await?,
    };

    Ok(Out::new_message(with_warning(
        format!("Deleted {what} '{name}'"),
        &persistence,
    )))
}
