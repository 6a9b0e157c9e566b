use clap::{Args, Subcommand};
use perkwise::{
    ledger::{Account, AccountKind},
    uuids::{CompanyUuid, UserUuid},
};
use perkwise_app::context::AppContext;
use serde_json::json;
use uuid::Uuid;

use super::print_json;

#[derive(Debug, Args)]
pub(crate) struct WalletCommand {
    #[command(subcommand)]
    command: WalletSubcommand,
}

#[derive(Debug, Subcommand)]
enum WalletSubcommand {
    /// Top up a company fee wallet (minor currency units)
    FundFees(FundArgs),

    /// Top up a company points reserve
    FundPoints(FundArgs),

    /// Show a wallet balance
    Balance(AccountArgs),

    /// List a wallet's postings, oldest first
    Transactions(AccountArgs),

    /// Check a wallet balance against its postings
    Reconcile(AccountArgs),

    /// Spend user points
    Redeem(RedeemArgs),

    /// Correct a user balance
    Adjust(AdjustArgs),
}

#[derive(Debug, Args)]
struct FundArgs {
    #[arg(long)]
    company: Uuid,

    #[arg(long)]
    amount: u64,

    #[arg(long, default_value = "top-up")]
    memo: String,
}

#[derive(Debug, Args)]
struct AccountArgs {
    /// company_fees, company_points or user_points
    #[arg(long)]
    kind: AccountKind,

    /// Company or user owning the wallet
    #[arg(long)]
    owner: Uuid,
}

impl AccountArgs {
    fn account(&self) -> Account {
        Account::new(self.kind, self.owner)
    }
}

#[derive(Debug, Args)]
struct RedeemArgs {
    #[arg(long)]
    user: Uuid,

    #[arg(long)]
    points: u64,

    /// Company the points were spent at
    #[arg(long)]
    company: Option<Uuid>,

    #[arg(long, default_value = "redemption")]
    memo: String,
}

#[derive(Debug, Args)]
struct AdjustArgs {
    #[arg(long)]
    user: Uuid,

    /// Signed points delta
    #[arg(long, allow_hyphen_values = true)]
    delta: i64,

    #[arg(long)]
    memo: String,
}

pub(crate) async fn run(ctx: &AppContext, command: WalletCommand) -> Result<(), String> {
    match command.command {
        WalletSubcommand::FundFees(args) => {
            let posting = ctx
                .wallets
                .fund_fees(CompanyUuid::from_uuid(args.company), args.amount, args.memo)
                .await
                .map_err(|error| format!("failed to fund fee wallet: {error}"))?;

            print_json(&posting)
        }
        WalletSubcommand::FundPoints(args) => {
            let posting = ctx
                .wallets
                .fund_points(CompanyUuid::from_uuid(args.company), args.amount, args.memo)
                .await
                .map_err(|error| format!("failed to fund points wallet: {error}"))?;

            print_json(&posting)
        }
        WalletSubcommand::Balance(args) => {
            let account = args.account();

            let balance = ctx
                .wallets
                .balance(account)
                .await
                .map_err(|error| format!("failed to read balance: {error}"))?;

            print_json(&json!({ "account": account, "balance": balance }))
        }
        WalletSubcommand::Transactions(args) => {
            let transactions = ctx
                .wallets
                .transactions(args.account())
                .await
                .map_err(|error| format!("failed to list transactions: {error}"))?;

            print_json(&transactions)
        }
        WalletSubcommand::Reconcile(args) => {
            let reconciliation = ctx
                .wallets
                .reconcile(args.account())
                .await
                .map_err(|error| format!("failed to reconcile wallet: {error}"))?;

            print_json(&json!({
                "reconciliation": reconciliation,
                "balanced": reconciliation.is_balanced(),
            }))
        }
        WalletSubcommand::Redeem(args) => {
            let posting = ctx
                .wallets
                .redeem(
                    UserUuid::from_uuid(args.user),
                    args.points,
                    args.company.map(CompanyUuid::from_uuid),
                    args.memo,
                )
                .await
                .map_err(|error| format!("failed to redeem points: {error}"))?;

            print_json(&posting)
        }
        WalletSubcommand::Adjust(args) => {
            let posting = ctx
                .wallets
                .adjust(UserUuid::from_uuid(args.user), args.delta, args.memo)
                .await
                .map_err(|error| format!("failed to adjust balance: {error}"))?;

            print_json(&posting)
        }
    }
}
