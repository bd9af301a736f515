use crate::api::GeminiClient;
use crate::args::ChatArgs;
use crate::assistant::{Assistant, ChatEntry, Role, UserTurn};
use crate::commands::{load_store, Out};
use crate::{Config, Result};
use anyhow::{bail, Context};
use std::sync::Arc;

/// Runs one conversational turn. Each CLI invocation is its own chat window:
/// the session opens with fresh context and is discarded when the process
/// exits, which also keeps turns trivially serialized.
pub async fn chat(config: Config, args: ChatArgs) -> Result<Out<Vec<ChatEntry>>> {
    let mut store = load_store(&config).await?;
    let api_key = config.read_gemini_key().await?;
    let model = GeminiClient::new(api_key, config.model());
    let mut assistant = Assistant::new(Arc::new(model));

    let turn = if let Some(path) = args.audio() {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Unable to read the audio file '{}'", path.display()))?;
        UserTurn::Audio {
            mime_type: "audio/webm".to_string(),
            data,
        }
    } else if let Some(message) = args.message() {
        UserTurn::Text(message.to_string())
    } else {
        bail!("Provide a message, or --audio with a voice note")
    };

    assistant.handle_turn(&mut store, turn).await;

    let transcript = assistant.transcript().to_vec();
    let message = transcript
        .iter()
        .map(render_entry)
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Out::new(message, transcript))
}

fn render_entry(entry: &ChatEntry) -> String {
    match entry.role {
        Role::User => format!("você> {}", entry.text),
        Role::Model => format!("assistente> {}", entry.text),
        Role::Action => format!("[ação] {}", entry.text),
    }
}
