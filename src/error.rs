//! Error types for the engine.
//!
//! General-purpose fallible functions use the `anyhow`-backed [`Result`] alias.
//! Operations whose failure modes are part of the engine's contract (store
//! mutations, the dispatcher's tool loop) return [`EngineError`] so callers can
//! branch on the failure class.

use thiserror::Error;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The failure classes the engine's API surfaces.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed mutation input. Rejected before any store write, local or remote.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A keyword-based lookup found no match. Soft: rendered as narration,
    /// never raised across the dispatcher boundary.
    #[error("not found: {0}")]
    NotFound(String),

    /// The persistent store rejected a write after the optimistic local
    /// mutation was already applied. Local state is not rolled back.
    #[error("remote write failed: {0}")]
    RemoteWrite(String),

    /// The language-understanding service failed or returned output the
    /// engine could not use. Degrades the current conversation turn only.
    #[error("language service failure: {0}")]
    ExternalService(String),

    /// A tool invocation carried a name outside the fixed tool set.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}
