use clap::{Parser, Subcommand};
use perkwise_app::{
    config::{DatabaseConfig, EngineArgs, LoggingConfig},
    context::AppContext,
    observability,
};
use serde::Serialize;

mod evaluate;
mod fees;
mod purchase;
mod rule;
mod wallet;

#[derive(Debug, Parser)]
#[command(name = "perkwise-app", about = "Perkwise loyalty points CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    engine: EngineArgs,

    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    Fees(fees::FeesCommand),
    Wallet(wallet::WalletCommand),
    Rule(rule::RuleCommand),
    Purchase(purchase::PurchaseCommand),
    Evaluate(evaluate::EvaluateArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init_subscriber(&self.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        let ctx = AppContext::from_database_url(
            &self.database.database_url,
            self.engine.engine_config(),
        )
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

        match self.command {
            Commands::Migrate => ctx
                .migrate()
                .await
                .map_err(|error| format!("failed to migrate database: {error}")),
            Commands::Fees(command) => fees::run(&ctx, command).await,
            Commands::Wallet(command) => wallet::run(&ctx, command).await,
            Commands::Rule(command) => rule::run(&ctx, command).await,
            Commands::Purchase(command) => purchase::run(&ctx, command).await,
            Commands::Evaluate(args) => evaluate::run(&ctx, args).await,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|error| format!("failed to serialise output: {error}"))?;

    println!("{json}");

    Ok(())
}
