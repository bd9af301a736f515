//! Command handlers for the synclife CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod chat;
mod delete;
mod done;
mod init;
mod insert;
mod list;
mod notify;
mod pay;
mod sync;

use crate::api::RestStore;
use crate::store::Store;
use crate::Config;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info};

pub use chat::chat;
pub use delete::delete;
pub use done::done;
pub use init::init;
pub use insert::insert;
pub use list::list;
pub use notify::notify;
pub use pay::pay;
pub use sync::{sync, SyncStats};

/// The output type for a command. This allows the command to return a
/// consistent message and, optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the
    /// command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as
    /// JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Appends the remote-write warning to a success message when the mutation
/// only landed locally.
pub(crate) fn with_warning(message: String, persistence: &crate::store::Persistence) -> String {
    match persistence {
        crate::store::Persistence::Confirmed => message,
        crate::store::Persistence::LocalOnly(warning) => {
            format!("{message} (saved locally; remote write failed: {warning})")
        }
    }
}

/// Builds a [`Store`] over the configured record store and fetches the
/// current snapshot.
pub(crate) async fn load_store(config: &Config) -> crate::Result<Store> {
    let key = config.read_service_key().await?;
    let records = RestStore::new(config.store_url(), key)?;
    let mut store = Store::new(Arc::new(records));
    store.refresh().await?;
    Ok(store)
}
