use clap::{Args, Subcommand};
use perkwise::{
    rules::{NewRule, RuleConfig},
    uuids::{CompanyUuid, RuleUuid},
};
use perkwise_app::context::AppContext;
use serde_json::Value;
use uuid::Uuid;

use super::print_json;

#[derive(Debug, Args)]
pub(crate) struct RuleCommand {
    #[command(subcommand)]
    command: RuleSubcommand,
}

#[derive(Debug, Subcommand)]
enum RuleSubcommand {
    /// Create an active rule
    Create(CreateRuleArgs),

    /// List a company's rules in declaration order
    List(ListRulesArgs),

    /// Re-enable a rule
    Activate(RuleArgs),

    /// Disable a rule
    Deactivate(RuleArgs),
}

#[derive(Debug, Args)]
struct CreateRuleArgs {
    #[arg(long)]
    company: Uuid,

    #[arg(long)]
    name: String,

    /// One of the supported rule types, e.g. value_spent or frequency
    #[arg(long)]
    rule_type: String,

    /// Rule configuration as a JSON object
    #[arg(long)]
    config: String,

    #[arg(long, default_value_t = 0)]
    cooldown_days: u32,

    /// Hide the rule from end users
    #[arg(long)]
    hidden: bool,
}

#[derive(Debug, Args)]
struct ListRulesArgs {
    #[arg(long)]
    company: Uuid,
}

#[derive(Debug, Args)]
struct RuleArgs {
    #[arg(long)]
    company: Uuid,

    #[arg(long)]
    rule: Uuid,
}

pub(crate) async fn run(ctx: &AppContext, command: RuleCommand) -> Result<(), String> {
    match command.command {
        RuleSubcommand::Create(args) => create(ctx, args).await,
        RuleSubcommand::List(args) => {
            let rules = ctx
                .rules
                .list_rules(CompanyUuid::from_uuid(args.company))
                .await
                .map_err(|error| format!("failed to list rules: {error}"))?;

            print_json(&rules)
        }
        RuleSubcommand::Activate(args) => {
            let rule = ctx
                .rules
                .activate_rule(
                    CompanyUuid::from_uuid(args.company),
                    RuleUuid::from_uuid(args.rule),
                )
                .await
                .map_err(|error| format!("failed to activate rule: {error}"))?;

            print_json(&rule)
        }
        RuleSubcommand::Deactivate(args) => {
            let rule = ctx
                .rules
                .deactivate_rule(
                    CompanyUuid::from_uuid(args.company),
                    RuleUuid::from_uuid(args.rule),
                )
                .await
                .map_err(|error| format!("failed to deactivate rule: {error}"))?;

            print_json(&rule)
        }
    }
}

async fn create(ctx: &AppContext, args: CreateRuleArgs) -> Result<(), String> {
    let config: Value = serde_json::from_str(&args.config)
        .map_err(|error| format!("config is not valid JSON: {error}"))?;

    let config = RuleConfig::parse(&args.rule_type, &config)
        .map_err(|error| format!("invalid rule: {error}"))?;

    let mut rule = NewRule::new(args.name, config).with_cooldown_days(args.cooldown_days);

    rule.visible = !args.hidden;

    let created = ctx
        .rules
        .create_rule(CompanyUuid::from_uuid(args.company), rule)
        .await
        .map_err(|error| format!("failed to create rule: {error}"))?;

    print_json(&created)
}
