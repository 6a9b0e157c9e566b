use clap::{Args, Subcommand};
use perkwise::{fees::ServiceType, uuids::CompanyUuid};
use perkwise_app::context::AppContext;
use serde_json::json;
use uuid::Uuid;

use super::print_json;

#[derive(Debug, Args)]
pub(crate) struct FeesCommand {
    #[command(subcommand)]
    command: FeesSubcommand,
}

#[derive(Debug, Subcommand)]
enum FeesSubcommand {
    /// Set the per-award fee for a service
    Set(SetFeeArgs),

    /// Show the explicit and effective fee for a service
    Get(FeeArgs),

    /// Remove the explicit fee so the default applies
    Clear(FeeArgs),

    /// List every explicit fee of a company
    List(CompanyArgs),
}

#[derive(Debug, Args)]
struct CompanyArgs {
    #[arg(long)]
    company: Uuid,
}

#[derive(Debug, Args)]
struct FeeArgs {
    #[arg(long)]
    company: Uuid,

    /// points, cashback, coupons, stamps or commissions
    #[arg(long, default_value = "points")]
    service: ServiceType,
}

#[derive(Debug, Args)]
struct SetFeeArgs {
    #[command(flatten)]
    fee: FeeArgs,

    /// Fee in minor currency units
    #[arg(long)]
    fee_minor: u64,
}

pub(crate) async fn run(ctx: &AppContext, command: FeesCommand) -> Result<(), String> {
    match command.command {
        FeesSubcommand::Set(args) => {
            let setting = ctx
                .fees
                .set_fee(
                    CompanyUuid::from_uuid(args.fee.company),
                    args.fee.service,
                    args.fee_minor,
                )
                .await
                .map_err(|error| format!("failed to set fee: {error}"))?;

            print_json(&setting)
        }
        FeesSubcommand::Get(args) => {
            let company = CompanyUuid::from_uuid(args.company);

            let setting = ctx
                .fees
                .get_fee(company, args.service)
                .await
                .map_err(|error| format!("failed to read fee: {error}"))?;

            let effective = ctx
                .fees
                .effective_fee(company, args.service)
                .await
                .map_err(|error| format!("failed to read fee: {error}"))?;

            print_json(&json!({
                "company": company,
                "service_type": args.service,
                "setting": setting,
                "effective_fee_minor": effective,
            }))
        }
        FeesSubcommand::Clear(args) => {
            ctx.fees
                .clear_fee(CompanyUuid::from_uuid(args.company), args.service)
                .await
                .map_err(|error| format!("failed to clear fee: {error}"))?;

            print_json(&json!({ "cleared": true }))
        }
        FeesSubcommand::List(args) => {
            let settings = ctx
                .fees
                .list_fees(CompanyUuid::from_uuid(args.company))
                .await
                .map_err(|error| format!("failed to list fees: {error}"))?;

            print_json(&settings)
        }
    }
}
