use crate::args::{
    InsertCardArgs, InsertProjectArgs, InsertSubcommand, InsertTaskArgs, InsertTransactionArgs,
};
use crate::commands::{load_store, with_warning, Out};
use crate::model::{
    CardDraft, PaymentMethod, ProjectDraft, TaskDraft, TransactionDate, TransactionDraft,
    TransactionType,
};
use crate::store::Store;
use crate::{Config, Result};
use chrono::Local;

/// Inserts one record of the requested kind.
pub async fn insert(config: Config, entity: &InsertSubcommand) -> Result<Out<serde_json::Value>> {
    let mut store = load_store(&config).await?;
    match entity {
        InsertSubcommand::Transaction(args) => insert_transaction(&mut store, args).await,
        InsertSubcommand::Task(args) => insert_task(&mut store, args).await,
        InsertSubcommand::Project(args) => insert_project(&mut store, args).await,
        InsertSubcommand::Card(args) => insert_card(&mut store, args).await,
    }
}

async fn insert_transaction(
    store: &mut Store,
    args: &InsertTransactionArgs,
) -> Result<Out<serde_json::Value>> {
    let card_id = match (args.method, args.card.as_deref()) {
        (PaymentMethod::CreditCard, Some(keyword)) => {
            let Some(card) = store.find_card(keyword) else {
                return Ok(Out::new_message(format!("No card matches '{keyword}'")));
            };
            Some(card.id.clone())
        }
        (PaymentMethod::CreditCard, None) => store.cards().first().map(|c| c.id.clone()),
        _ => None,
    };

    let (icon, color) = match args.kind {
        TransactionType::Expense => ("shopping_bag", "orange"),
        TransactionType::Income => ("attach_money", "green"),
    };

    let draft = TransactionDraft {
        name: args.name.clone(),
        amount: args.amount,
        date: args
            .date
            .map(TransactionDate::On)
            .unwrap_or(TransactionDate::Today),
        kind: args.kind,
        icon: icon.to_string(),
        color: color.to_string(),
        payment_method: Some(args.method),
        card_id,
    };

    let (transaction, persistence) = store.add_transaction(draft).await?;
    Ok(Out::new(
        with_warning(
            format!("Recorded {} {}", transaction.name, transaction.amount),
            &persistence,
        ),
        serde_json::to_value(&transaction)?,
    ))
}

async fn insert_task(store: &mut Store, args: &InsertTaskArgs) -> Result<Out<serde_json::Value>> {
    let now = Local::now();
    let draft = TaskDraft {
        title: args.title.clone(),
        category: args.category.clone(),
        category_icon: args.icon.clone(),
        time: now.format("%H:%M").to_string(),
        date: Some(args.date.unwrap_or_else(|| now.date_naive())),
        ..TaskDraft::default()
    };

    let (task, persistence) = store.add_task(draft).await?;
    Ok(Out::new(
        with_warning(format!("Created task '{}'", task.title), &persistence),
        serde_json::to_value(&task)?,
    ))
}

async fn insert_project(
    store: &mut Store,
    args: &InsertProjectArgs,
) -> Result<Out<serde_json::Value>> {
    let draft = ProjectDraft {
        name: args.name.clone(),
        logo: args.logo.clone(),
        color: args.color.clone(),
    };
    let (project, persistence) = store.add_project(draft).await?;
    Ok(Out::new(
        with_warning(format!("Created project '{}'", project.name), &persistence),
        serde_json::to_value(&project)?,
    ))
}

async fn insert_card(store: &mut Store, args: &InsertCardArgs) -> Result<Out<serde_json::Value>> {
    let draft = CardDraft {
        name: args.name.clone(),
        limit_amount: args.limit,
        due_day: args.due_day,
        closing_day: args.closing_day,
        color: args.color.clone(),
        last_digits: args.last_digits.clone(),
    };
    let (card, persistence) = store.add_card(draft).await?;
    Ok(Out::new(
        with_warning(
            format!(
                "Registered card '{}' with a limit of {}",
                card.name, card.limit_amount
            ),
            &persistence,
        ),
        serde_json::to_value(&card)?,
    ))
}
