use clap::Parser;
use std::process::ExitCode;
use synclife::args::{Args, Command};
use synclife::{commands, Config, Result};
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().synclife_home().path();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(
            home,
            init_args.store_url(),
            init_args.service_key(),
            init_args.gemini_key(),
        )
        .await?
        .print(),

        Command::Sync => commands::sync(Config::load(home).await?).await?.print(),

        Command::Chat(chat_args) => {
            commands::chat(Config::load(home).await?, chat_args.clone())
                .await?
                .print()
        }

        Command::Notify => commands::notify(Config::load(home).await?).await?.print(),

        Command::Pay(pay_args) => commands::pay(Config::load(home).await?, pay_args.clone())
            .await?
            .print(),

        Command::Insert(insert_args) => {
            commands::insert(Config::load(home).await?, insert_args.entity())
                .await?
                .print()
        }

        Command::Delete(delete_args) => {
            commands::delete(Config::load(home).await?, delete_args.entity())
                .await?
                .print()
        }

        Command::Done(done_args) => {
            commands::done(Config::load(home).await?, done_args.keyword())
                .await?
                .print()
        }

        Command::List(list_args) => commands::list(Config::load(home).await?, list_args.clone())
            .await?
            .print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
