use clap::{Args, Subcommand};
use jiff::Timestamp;
use perkwise::uuids::{CompanyUuid, UserUuid};
use perkwise_app::{context::AppContext, domain::purchases::records::NewPurchase};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::print_json;

#[derive(Debug, Args)]
pub(crate) struct PurchaseCommand {
    #[command(subcommand)]
    command: PurchaseSubcommand,
}

#[derive(Debug, Subcommand)]
enum PurchaseSubcommand {
    /// Log a completed purchase
    Record(RecordPurchaseArgs),

    /// List a user's purchases at a company
    List(ListPurchasesArgs),
}

#[derive(Debug, Args)]
struct RecordPurchaseArgs {
    #[arg(long)]
    company: Uuid,

    #[arg(long)]
    user: Uuid,

    #[arg(long)]
    amount: Decimal,

    /// When the purchase happened (RFC 3339); defaults to now
    #[arg(long)]
    occurred_at: Option<Timestamp>,
}

#[derive(Debug, Args)]
struct ListPurchasesArgs {
    #[arg(long)]
    company: Uuid,

    #[arg(long)]
    user: Uuid,
}

pub(crate) async fn run(ctx: &AppContext, command: PurchaseCommand) -> Result<(), String> {
    match command.command {
        PurchaseSubcommand::Record(args) => {
            let purchase = NewPurchase::new(
                args.amount,
                args.occurred_at.unwrap_or_else(Timestamp::now),
            );

            let record = ctx
                .purchases
                .record_purchase(
                    CompanyUuid::from_uuid(args.company),
                    UserUuid::from_uuid(args.user),
                    purchase,
                )
                .await
                .map_err(|error| format!("failed to record purchase: {error}"))?;

            print_json(&record)
        }
        PurchaseSubcommand::List(args) => {
            let purchases = ctx
                .purchases
                .list_purchases(
                    CompanyUuid::from_uuid(args.company),
                    UserUuid::from_uuid(args.user),
                )
                .await
                .map_err(|error| format!("failed to list purchases: {error}"))?;

            print_json(&purchases)
        }
    }
}
