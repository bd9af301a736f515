//! The command dispatcher.
//!
//! Translates one user utterance (text, transcribed voice audio, or an image
//! with an optional caption) into zero or more domain store mutations through
//! the language service's tool-calling mechanism, and narrates the outcome
//! into a transcript.
//!
//! A session is created lazily on the first turn and lives as long as the
//! chat window: [`Assistant::close`] discards it together with the
//! transcript, and the next turn starts fresh with freshly composed context.
//! Turns are serialized by `&mut self`; there is no second tool loop while
//! one is resolving.

pub mod tools;

use crate::api::{LanguageModel, LanguageSession, Part, ToolCall};
use crate::assistant::tools::{
    CreateTaskArgs, CreateTransactionArgs, DeleteTransactionArgs, TaskAction, ToolName,
    UpdateTaskArgs,
};
use crate::model::{
    Amount, PaymentMethod, Priority, TaskDraft, TransactionDate, TransactionDraft,
    TransactionType,
};
use crate::store::Store;
use crate::EngineError;
use chrono::{DateTime, Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Hard bound on tool-call rounds within one turn. A service that keeps
/// requesting tools past this is treated as failed and the turn degrades.
pub const MAX_TOOL_ROUNDS: usize = 10;

/// Tasks included in the session context.
const MAX_CONTEXT_TASKS: usize = 15;
/// Transactions included in the session context.
const MAX_CONTEXT_TRANSACTIONS: usize = 10;

const TURN_FAILURE_NOTICE: &str = "Tive um problema técnico. Pode tentar de novo?";
const ACTION_FAILURE_NOTICE: &str = "Erro ao executar ação.";
const AUDIO_ECHO: &str = "🎤 Áudio enviado...";
const IMAGE_ECHO: &str = "🖼️ Imagem enviada...";
const AUDIO_INSTRUCTION: &str =
    "Transcreva este áudio exatamente e, em seguida, execute o comando solicitado ou responda \
     à pergunta. Se for um comando de criação (tarefa/gasto), execute a tool.";

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
    /// A tool-execution notice, styled distinctly from narration.
    Action,
}

serde_plain::derive_display_from_serialize!(Role);

/// One line of the conversation transcript.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChatEntry {
    pub role: Role,
    pub text: String,
}

/// One user utterance.
#[derive(Debug, Clone)]
pub enum UserTurn {
    Text(String),
    /// A captured voice command (Opus/WebM or similar).
    Audio { mime_type: String, data: Vec<u8> },
    Image {
        mime_type: String,
        data: Vec<u8>,
        caption: Option<String>,
    },
}

/// Dispatches conversation turns against a [`Store`].
pub struct Assistant {
    model: Arc<dyn LanguageModel>,
    session: Option<Box<dyn LanguageSession>>,
    transcript: Vec<ChatEntry>,
}

impl Assistant {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            session: None,
            transcript: Vec::new(),
        }
    }

    pub fn transcript(&self) -> &[ChatEntry] {
        &self.transcript
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Ends the chat window. The session and transcript are discarded; the
    /// next turn opens a fresh session with freshly composed context. Any
    /// mutation already committed stays committed.
    pub fn close(&mut self) {
        self.session = None;
        self.transcript.clear();
    }

    /// Runs one conversation turn. Failures of the language service degrade
    /// the turn into a generic notice; they are never raised to the caller
    /// and never touch mutations that already committed.
    pub async fn handle_turn(&mut self, store: &mut Store, turn: UserTurn) {
        let now = Local::now();
        self.push(Role::User, user_echo(&turn));

        let mut session = match self.session.take() {
            Some(session) => session,
            None => self
                .model
                .start_session(compose_context(store, now), tools::declarations()),
        };

        self.run_turn(session.as_mut(), store, turn_parts(turn), now)
            .await;
        self.session = Some(session);
    }

    async fn run_turn(
        &mut self,
        session: &mut dyn LanguageSession,
        store: &mut Store,
        parts: Vec<Part>,
        now: DateTime<Local>,
    ) {
        let mut reply = match session.send(parts).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("{}", EngineError::ExternalService(format!("{e:#}")));
                self.push(Role::Action, TURN_FAILURE_NOTICE);
                return;
            }
        };

        let mut rounds = 0;
        while !reply.calls.is_empty() {
            rounds += 1;
            if rounds > MAX_TOOL_ROUNDS {
                error!(
                    "{}",
                    EngineError::ExternalService(format!(
                        "tool loop exceeded {MAX_TOOL_ROUNDS} rounds"
                    ))
                );
                self.push(Role::Action, TURN_FAILURE_NOTICE);
                return;
            }

            // Execute in the order the service requested and return every
            // result, tagged by its invocation, in that same order. One bad
            // call must not abort the rest of the batch.
            let mut outputs = Vec::with_capacity(reply.calls.len());
            for call in &reply.calls {
                let result = execute_tool(store, call, now).await;
                self.push(Role::Action, result.clone());
                outputs.push(Part::ToolResult {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    result,
                });
            }

            reply = match session.send(outputs).await {
                Ok(reply) => reply,
                Err(e) => {
                    error!("{}", EngineError::ExternalService(format!("{e:#}")));
                    self.push(Role::Action, TURN_FAILURE_NOTICE);
                    return;
                }
            };
        }

        if let Some(text) = reply.text {
            self.push(Role::Model, text);
        }
    }

    fn push(&mut self, role: Role, text: impl Into<String>) {
        self.transcript.push(ChatEntry {
            role,
            text: text.into(),
        });
    }
}

fn user_echo(turn: &UserTurn) -> String {
    match turn {
        UserTurn::Text(text) => text.clone(),
        UserTurn::Audio { .. } => AUDIO_ECHO.to_string(),
        UserTurn::Image { caption, .. } => caption
            .clone()
            .unwrap_or_else(|| IMAGE_ECHO.to_string()),
    }
}

fn turn_parts(turn: UserTurn) -> Vec<Part> {
    match turn {
        UserTurn::Text(text) => vec![Part::Text(text)],
        UserTurn::Audio { mime_type, data } => vec![
            Part::Inline { mime_type, data },
            Part::Text(AUDIO_INSTRUCTION.to_string()),
        ],
        UserTurn::Image {
            mime_type,
            data,
            caption,
        } => {
            let mut parts = vec![Part::Inline { mime_type, data }];
            if let Some(caption) = caption {
                parts.push(Part::Text(caption));
            }
            parts
        }
    }
}

// ---------------------------------------------------------------------------
// Tool execution
// ---------------------------------------------------------------------------

/// Runs one tool invocation and renders its outcome as the result string
/// returned to the service. Never fails: unknown names, malformed arguments
/// and rejected mutations all come back as human-readable notices.
async fn execute_tool(store: &mut Store, call: &ToolCall, now: DateTime<Local>) -> String {
    let Ok(name) = ToolName::from_str(&call.name) else {
        warn!("{}", EngineError::UnknownTool(call.name.clone()));
        return format!("Ferramenta desconhecida: \"{}\".", call.name);
    };

    match name {
        ToolName::CreateTransaction => create_transaction(store, call.args.clone()).await,
        ToolName::DeleteTransaction => delete_transaction(store, call.args.clone()).await,
        ToolName::CreateTask => create_task(store, call.args.clone(), now).await,
        ToolName::UpdateTask => update_task(store, call.args.clone()).await,
    }
}

async fn create_transaction(store: &mut Store, args: serde_json::Value) -> String {
    let args: CreateTransactionArgs = match serde_json::from_value(args) {
        Ok(args) => args,
        Err(e) => {
            warn!("createTransaction arguments were malformed: {e}");
            return ACTION_FAILURE_NOTICE.to_string();
        }
    };

    let method = args.payment_method.unwrap_or(PaymentMethod::Pix);
    let mut card_id = None;
    if method == PaymentMethod::CreditCard && !store.cards().is_empty() {
        if let Some(keyword) = &args.card_keyword {
            card_id = store.find_card(keyword).map(|c| c.id.clone());
        }
        // No keyword, or the keyword resolved nothing: fall back to the
        // first card in the list.
        if card_id.is_none() {
            card_id = Some(store.cards()[0].id.clone());
        }
    }

    let Some(amount) = Amount::from_f64(args.amount) else {
        warn!("createTransaction carried a non-finite amount: {}", args.amount);
        return ACTION_FAILURE_NOTICE.to_string();
    };

    let (default_icon, color) = match args.kind {
        TransactionType::Expense => ("shopping_bag", "orange"),
        TransactionType::Income => ("attach_money", "green"),
    };

    let draft = TransactionDraft {
        name: args.name,
        amount,
        date: TransactionDate::Today,
        kind: args.kind,
        icon: args
            .category_icon
            .unwrap_or_else(|| default_icon.to_string()),
        color: color.to_string(),
        payment_method: Some(method),
        card_id,
    };

    match store.add_transaction(draft).await {
        Ok((transaction, _)) => {
            let method_note = if method == PaymentMethod::CreditCard {
                " (Cartão)"
            } else {
                ""
            };
            format!(
                "Transação salva: {} - {}{}",
                transaction.name, transaction.amount, method_note
            )
        }
        Err(e) => {
            warn!("createTransaction was rejected: {e}");
            ACTION_FAILURE_NOTICE.to_string()
        }
    }
}

async fn delete_transaction(store: &mut Store, args: serde_json::Value) -> String {
    let args: DeleteTransactionArgs = match serde_json::from_value(args) {
        Ok(args) => args,
        Err(e) => {
            warn!("deleteTransaction arguments were malformed: {e}");
            return ACTION_FAILURE_NOTICE.to_string();
        }
    };

    let Some(target) = store.find_transaction(&args.keyword) else {
        return format!("Não encontrei transação com nome \"{}\".", args.keyword);
    };
    let (id, name) = (target.id.clone(), target.name.clone());

    match store.delete_transaction(&id).await {
        Ok(_) => format!("Transação removida: {name}"),
        Err(e) => {
            warn!("deleteTransaction failed: {e}");
            ACTION_FAILURE_NOTICE.to_string()
        }
    }
}

async fn create_task(store: &mut Store, args: serde_json::Value, now: DateTime<Local>) -> String {
    let args: CreateTaskArgs = match serde_json::from_value(args) {
        Ok(args) => args,
        Err(e) => {
            warn!("createTask arguments were malformed: {e}");
            return ACTION_FAILURE_NOTICE.to_string();
        }
    };

    let date = match args.date.as_deref() {
        Some(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                debug!("createTask date '{s}' did not parse; defaulting to today");
                now.date_naive()
            }
        },
        None => now.date_naive(),
    };

    let draft = TaskDraft {
        title: args.title,
        category: args.category.unwrap_or_else(|| "Geral".to_string()),
        category_icon: args
            .category_icon
            .unwrap_or_else(|| "check_circle".to_string()),
        time: now.format("%H:%M").to_string(),
        date: Some(date),
        completed: false,
        priority: Priority::None,
        project_id: None,
        tags: Vec::new(),
        subtasks: Vec::new(),
        logs: Vec::new(),
    };

    match store.add_task(draft).await {
        Ok((task, _)) => format!("Tarefa criada: {}", task.title),
        Err(e) => {
            warn!("createTask was rejected: {e}");
            ACTION_FAILURE_NOTICE.to_string()
        }
    }
}

async fn update_task(store: &mut Store, args: serde_json::Value) -> String {
    let args: UpdateTaskArgs = match serde_json::from_value(args) {
        Ok(args) => args,
        Err(e) => {
            warn!("updateTask arguments were malformed: {e}");
            return ACTION_FAILURE_NOTICE.to_string();
        }
    };

    let Some(target) = store.find_task(&args.keyword) else {
        return format!("Não encontrei a tarefa \"{}\".", args.keyword);
    };
    let task = target.clone();

    match args.action {
        TaskAction::Delete => match store.delete_task(&task.id).await {
            Ok(_) => format!("Tarefa apagada: {}", task.title),
            Err(e) => {
                warn!("updateTask delete failed: {e}");
                ACTION_FAILURE_NOTICE.to_string()
            }
        },
        TaskAction::Complete => {
            let mut updated = task.clone();
            updated.completed = true;
            match store.update_task(updated).await {
                Ok(_) => format!("Tarefa concluída: {}", task.title),
                Err(e) => {
                    warn!("updateTask complete failed: {e}");
                    ACTION_FAILURE_NOTICE.to_string()
                }
            }
        }
        TaskAction::Reschedule => {
            let Some(new_date) = args.new_date.as_deref() else {
                warn!("updateTask reschedule without newDate");
                return ACTION_FAILURE_NOTICE.to_string();
            };
            let Ok(date) = NaiveDate::parse_from_str(new_date, "%Y-%m-%d") else {
                warn!("updateTask reschedule date '{new_date}' did not parse");
                return ACTION_FAILURE_NOTICE.to_string();
            };
            let mut updated = task.clone();
            updated.date = Some(date);
            match store.update_task(updated).await {
                Ok(_) => format!("Tarefa reagendada: {} para {new_date}", task.title),
                Err(e) => {
                    warn!("updateTask reschedule failed: {e}");
                    ACTION_FAILURE_NOTICE.to_string()
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Session context
// ---------------------------------------------------------------------------

/// Builds the system instruction for a new session: a bounded summary of the
/// user's cards, most recent tasks and most recent transactions, plus the
/// temporal context and the standing rules.
pub(crate) fn compose_context(store: &Store, now: DateTime<Local>) -> String {
    let cards = if store.cards().is_empty() {
        "Nenhum cartão cadastrado.".to_string()
    } else {
        store
            .cards()
            .iter()
            .map(|c| format!("- {} (Final {})", c.name, c.last_digits))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let tasks = store
        .tasks()
        .iter()
        .take(MAX_CONTEXT_TASKS)
        .map(|t| {
            let marker = if t.completed { 'X' } else { ' ' };
            let date = t
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "sem data".to_string());
            format!("- [{marker}] {} ({date})", t.title)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let transactions = store
        .transactions()
        .iter()
        .take(MAX_CONTEXT_TRANSACTIONS)
        .map(|t| format!("- {}: {} ({})", t.name, t.amount, t.kind))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Você é a 'SyncLife Assistant', secretária pessoal eficiente e amigável.\n\
         \n\
         CONTEXTO TEMPORAL:\n\
         - Hoje: {full_date} ({iso_date}). Hora: {time}.\n\
         \n\
         DADOS DO USUÁRIO:\n\
         CARTÕES DE CRÉDITO DISPONÍVEIS:\n\
         {cards}\n\
         \n\
         TAREFAS:\n\
         {tasks}\n\
         \n\
         TRANSAÇÕES RECENTES:\n\
         {transactions}\n\
         \n\
         REGRAS:\n\
         1. MANTENHA O CONTEXTO: Se o usuário disser apenas um valor ou data, assuma que se \
         refere à solicitação anterior.\n\
         2. SEJA DIRETA: Responda de forma concisa.\n\
         3. TOOLS: Use as ferramentas disponíveis para executar ações.",
        full_date = full_date_pt(now.date_naive()),
        iso_date = now.format("%Y-%m-%d"),
        time = now.format("%H:%M"),
    )
}

/// Renders a date the way the product locale writes it out in full, e.g.
/// "sexta-feira, 7 de agosto de 2026".
fn full_date_pt(date: NaiveDate) -> String {
    const WEEKDAYS: [&str; 7] = [
        "segunda-feira",
        "terça-feira",
        "quarta-feira",
        "quinta-feira",
        "sexta-feira",
        "sábado",
        "domingo",
    ];
    const MONTHS: [&str; 12] = [
        "janeiro",
        "fevereiro",
        "março",
        "abril",
        "maio",
        "junho",
        "julho",
        "agosto",
        "setembro",
        "outubro",
        "novembro",
        "dezembro",
    ];
    format!(
        "{}, {} de {} de {}",
        WEEKDAYS[date.weekday().num_days_from_monday() as usize],
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}
