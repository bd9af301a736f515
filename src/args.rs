//! These structs provide the CLI interface for the synclife CLI.

use crate::model::{Amount, PaymentMethod, TransactionType};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// synclife: your expenses, cards and tasks from the command line.
///
/// The engine keeps a local snapshot of your transactions, credit cards,
/// tasks and projects in sync with a remote record store, derives invoice
/// and deadline notifications from it, and ships a conversational assistant
/// that can create or modify records from natural language or a voice note.
///
/// You will need a record store project URL and service key plus a Gemini
/// API key. Run `synclife init` once to set these up.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. You need a few things ready
    /// beforehand:
    ///
    /// - Decide what directory you want to store configuration in and pass it
    ///   as --synclife-home. By default it will be $HOME/synclife.
    ///
    /// - Get your record store project URL and pass it as --store-url.
    ///
    /// - Download your record store service key and your Gemini API key into
    ///   files and pass their paths. Both files are moved into the data
    ///   directory.
    Init(InitArgs),
    /// Fetch the current snapshot from the record store.
    Sync,
    /// Run one conversational turn against the assistant.
    Chat(ChatArgs),
    /// List current notifications (overdue tasks, invoices due).
    Notify,
    /// Pay a card's open invoice, marking its unpaid expenses as paid.
    Pay(PayArgs),
    /// Insert a transaction, task, project or card.
    Insert(InsertArgs),
    /// Delete a record, resolved by keyword the way the assistant resolves it.
    Delete(DeleteArgs),
    /// Toggle a task's completion state, resolved by keyword.
    Done(DoneArgs),
    /// Print one of the record collections.
    List(ListArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where synclife configuration is held. Defaults to
    /// ~/synclife
    #[arg(long, env = "SYNCLIFE_HOME", default_value_t = default_synclife_home())]
    synclife_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, synclife_home: PathBuf) -> Self {
        Self {
            log_level,
            synclife_home: synclife_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn synclife_home(&self) -> &DisplayPath {
        &self.synclife_home
    }
}

/// Args for the `synclife init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of your record store project. It looks like this:
    /// https://abcdefghij.supabase.co
    #[arg(long)]
    store_url: String,

    /// The path to a file containing your record store service key. The file
    /// will be moved to the secrets location in the data directory.
    #[arg(long)]
    service_key: PathBuf,

    /// The path to a file containing your Gemini API key. The file will be
    /// moved to the secrets location in the data directory.
    #[arg(long)]
    gemini_key: PathBuf,
}

impl InitArgs {
    pub fn new(
        store_url: impl Into<String>,
        service_key: impl Into<PathBuf>,
        gemini_key: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store_url: store_url.into(),
            service_key: service_key.into(),
            gemini_key: gemini_key.into(),
        }
    }

    pub fn store_url(&self) -> &str {
        &self.store_url
    }

    pub fn service_key(&self) -> &Path {
        &self.service_key
    }

    pub fn gemini_key(&self) -> &Path {
        &self.gemini_key
    }
}

/// Args for the `synclife chat` command.
#[derive(Debug, Parser, Clone)]
pub struct ChatArgs {
    /// The message to send to the assistant.
    message: Option<String>,

    /// Path to a recorded voice note (Opus/WebM) to send instead of text.
    #[arg(long)]
    audio: Option<PathBuf>,
}

impl ChatArgs {
    pub fn new(message: Option<String>, audio: Option<PathBuf>) -> Self {
        Self { message, audio }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn audio(&self) -> Option<&Path> {
        self.audio.as_deref()
    }
}

/// Args for the `synclife pay` command.
#[derive(Debug, Parser, Clone)]
pub struct PayArgs {
    /// A keyword matching the card's name, e.g. "nubank".
    card: String,
}

impl PayArgs {
    pub fn new(card: impl Into<String>) -> Self {
        Self { card: card.into() }
    }

    pub fn card(&self) -> &str {
        &self.card
    }
}

/// Args for the `synclife insert` command.
#[derive(Debug, Parser, Clone)]
pub struct InsertArgs {
    #[command(subcommand)]
    entity: InsertSubcommand,
}

impl InsertArgs {
    pub fn new(entity: InsertSubcommand) -> Self {
        Self { entity }
    }

    pub fn entity(&self) -> &InsertSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum InsertSubcommand {
    /// Record an income or expense.
    Transaction(InsertTransactionArgs),
    /// Create a task.
    Task(InsertTaskArgs),
    /// Create a project.
    Project(InsertProjectArgs),
    /// Register a credit card.
    Card(InsertCardArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct InsertTransactionArgs {
    /// A short name, e.g. "Café".
    pub name: String,

    /// The amount, e.g. "20", "20.50" or "R$ 20,50".
    pub amount: Amount,

    /// "expense" or "income".
    #[arg(long = "type", default_value = "expense")]
    pub kind: TransactionType,

    /// "pix", "cash" or "credit_card".
    #[arg(long, default_value = "pix")]
    pub method: PaymentMethod,

    /// A keyword matching the card's name, when --method is credit_card.
    #[arg(long)]
    pub card: Option<String>,

    /// The calendar date (YYYY-MM-DD). Defaults to the "Hoje" marker.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Parser, Clone)]
pub struct InsertTaskArgs {
    /// The task title.
    pub title: String,

    /// The category label.
    #[arg(long, default_value = "Geral")]
    pub category: String,

    /// Material Symbols icon name.
    #[arg(long, default_value = "check_circle")]
    pub icon: String,

    /// The date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Parser, Clone)]
pub struct InsertProjectArgs {
    /// The project name.
    pub name: String,

    /// A URL, emoji or embedded image for the logo.
    #[arg(long, default_value = "📁")]
    pub logo: String,

    /// Background color for the logo container.
    #[arg(long, default_value = "blue")]
    pub color: String,
}

#[derive(Debug, Parser, Clone)]
pub struct InsertCardArgs {
    /// The card name, e.g. "Nubank".
    pub name: String,

    /// The credit limit, e.g. "2500".
    pub limit: Amount,

    /// Day of month the invoice is due (1-31).
    #[arg(long)]
    pub due_day: u8,

    /// Day of month the invoice closes (1-31).
    #[arg(long)]
    pub closing_day: u8,

    /// Presentation color.
    #[arg(long, default_value = "purple")]
    pub color: String,

    /// The card's last digits.
    #[arg(long, default_value = "")]
    pub last_digits: String,
}

/// Args for the `synclife delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    #[command(subcommand)]
    entity: DeleteSubcommand,
}

impl DeleteArgs {
    pub fn new(entity: DeleteSubcommand) -> Self {
        Self { entity }
    }

    pub fn entity(&self) -> &DeleteSubcommand {
        &self.entity
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DeleteSubcommand {
    /// Delete the first transaction whose name matches the keyword.
    Transaction(KeywordArgs),
    /// Delete the first task whose title matches the keyword.
    Task(KeywordArgs),
    /// Delete the first project whose name matches the keyword.
    Project(KeywordArgs),
    /// Delete the first card whose name matches the keyword.
    Card(KeywordArgs),
}

/// A single keyword argument, matched case-insensitively.
#[derive(Debug, Parser, Clone)]
pub struct KeywordArgs {
    keyword: String,
}

impl KeywordArgs {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

/// Args for the `synclife done` command.
#[derive(Debug, Parser, Clone)]
pub struct DoneArgs {
    /// A keyword matching the task's title.
    pub keyword: String,
}

impl DoneArgs {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

/// Which collection `synclife list` should print.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ListEntity {
    #[default]
    Transactions,
    Tasks,
    Cards,
    Projects,
}

serde_plain::derive_display_from_serialize!(ListEntity);
serde_plain::derive_fromstr_from_deserialize!(ListEntity);

/// Args for the `synclife list` command.
#[derive(Debug, Parser, Clone)]
pub struct ListArgs {
    /// The collection to print.
    #[arg(value_enum, default_value_t = ListEntity::Transactions)]
    entity: ListEntity,
}

impl ListArgs {
    pub fn new(entity: ListEntity) -> Self {
        Self { entity }
    }

    pub fn entity(&self) -> ListEntity {
        self.entity
    }
}

fn default_synclife_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("synclife"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --synclife-home or SYNCLIFE_HOME instead of relying on the \
                default synclife home directory. If you continue using the program right now, \
                you may have problems!",
            );
            PathBuf::from("synclife")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
