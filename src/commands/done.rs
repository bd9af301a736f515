use crate::commands::{load_store, with_warning, Out};
use crate::{Config, Result};

/// Toggles the completion state of the first task whose title matches the
/// keyword.
pub async fn done(config: Config, keyword: &str) -> Result<Out<()>> {
    let mut store = load_store(&config).await?;

    let Some(task) = store.find_task(keyword) else {
        return Ok(Out::new_message(format!(
            "No task matches '{keyword}'"
        )));
    };
    let (id, title, was_completed) = (task.id.clone(), task.title.clone(), task.completed);

    let persistence = store.toggle_task(&id).await?;
    let message = if was_completed {
        format!("Reopened '{title}'")
    } else {
        format!("Marked '{title}' as done")
    };
    Ok(Out::new_message(with_warning(message, &persistence)))
}
