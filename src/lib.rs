pub mod accounting;
mod api;
pub mod args;
pub mod assistant;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod notify;
pub mod store;
#[cfg(test)]
mod test;
mod utils;

pub use api::{
    CardRow, GeminiClient, LanguageModel, LanguageSession, ModelReply, Part, ProjectRow,
    RecordStore, RestStore, Snapshot, SubTaskRow, TaskLogRow, TaskRow, ToolCall, ToolDecl,
    TransactionRow,
};
pub use config::Config;
pub use error::{EngineError, Error, Result};
