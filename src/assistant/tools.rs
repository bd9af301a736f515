//! The fixed set of operations the language service may invoke, their typed
//! argument structs, and the JSON schemas declared to the service.
//!
//! Argument field names are camelCase on the wire. The descriptions are
//! prompt text and stay in the product locale.

use crate::api::ToolDecl;
use crate::model::{PaymentMethod, TransactionType};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The callable tool set. Anything else in a tool invocation is reported
/// back to the service as an unknown-tool failure.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolName {
    CreateTransaction,
    DeleteTransaction,
    CreateTask,
    UpdateTask,
}

serde_plain::derive_display_from_serialize!(ToolName);
serde_plain::derive_fromstr_from_deserialize!(ToolName);

/// Arguments of the `createTransaction` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[schemars(title = "CreateTransactionArgs")]
pub struct CreateTransactionArgs {
    #[schemars(description = "Nome breve (ex: Café, Uber)")]
    pub name: String,
    #[schemars(description = "Valor numérico")]
    pub amount: f64,
    #[serde(rename = "type")]
    #[schemars(description = "Tipo")]
    pub kind: TransactionType,
    /// Defaults to pix when absent.
    #[serde(default)]
    #[schemars(description = "Meio de pagamento.")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    #[schemars(description = "Nome do cartão se for crédito (ex: Nubank, Inter).")]
    pub card_keyword: Option<String>,
    #[serde(default)]
    #[schemars(description = "Ícone Material Symbols sugerido pelo contexto (ex: restaurant, \
                              directions_car, shopping_bag, sports_soccer).")]
    pub category_icon: Option<String>,
}

/// Arguments of the `deleteTransaction` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[schemars(title = "DeleteTransactionArgs")]
pub struct DeleteTransactionArgs {
    #[schemars(description = "Nome ou palavra-chave para encontrar a transação.")]
    pub keyword: String,
}

/// Arguments of the `createTask` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[schemars(title = "CreateTaskArgs")]
pub struct CreateTaskArgs {
    #[schemars(description = "Título da tarefa")]
    pub title: String,
    #[serde(default)]
    #[schemars(description = "Categoria (ex: Trabalho, Pessoal, Saúde)")]
    pub category: Option<String>,
    #[serde(default)]
    #[schemars(description = "Ícone Material Symbols sugerido (ex: work, home, fitness_center).")]
    pub category_icon: Option<String>,
    /// Defaults to today when absent.
    #[serde(default)]
    #[schemars(description = "Data no formato YYYY-MM-DD exata.")]
    pub date: Option<String>,
}

/// What `updateTask` should do to the matched task.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskAction {
    Complete,
    Delete,
    Reschedule,
}

serde_plain::derive_display_from_serialize!(TaskAction);

/// Arguments of the `updateTask` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[schemars(title = "UpdateTaskArgs")]
pub struct UpdateTaskArgs {
    #[schemars(description = "Palavra-chave do título da tarefa")]
    pub keyword: String,
    #[schemars(description = "Ação a tomar")]
    pub action: TaskAction,
    /// Required when `action` is reschedule.
    #[serde(default)]
    #[schemars(description = "Nova data YYYY-MM-DD se a ação for reschedule")]
    pub new_date: Option<String>,
}

/// The declarations supplied to the language service at session start.
pub fn declarations() -> Vec<ToolDecl> {
    vec![
        ToolDecl {
            name: ToolName::CreateTransaction.to_string(),
            description: "Registrar uma nova transação financeira (gasto ou ganho). Se o \
                          usuário disser que usou cartão, defina paymentMethod como \
                          'credit_card'."
                .to_string(),
            parameters: schema_of::<CreateTransactionArgs>(),
        },
        ToolDecl {
            name: ToolName::DeleteTransaction.to_string(),
            description: "Remover uma transação existente pelo nome aproximado.".to_string(),
            parameters: schema_of::<DeleteTransactionArgs>(),
        },
        ToolDecl {
            name: ToolName::CreateTask.to_string(),
            description: "Criar uma nova tarefa. Deduza o ícone da categoria baseado no título."
                .to_string(),
            parameters: schema_of::<CreateTaskArgs>(),
        },
        ToolDecl {
            name: ToolName::UpdateTask.to_string(),
            description: "Atualizar status ou deletar uma tarefa existente.".to_string(),
            parameters: schema_of::<UpdateTaskArgs>(),
        },
    ]
}

fn schema_of<T: JsonSchema>() -> serde_json::Value {
    let mut schema =
        serde_json::to_value(schemars::schema_for!(T)).expect("tool schemas serialize");
    // The service accepts only the OpenAPI subset of JSON Schema.
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
    }
    schema
}
