use std::path::PathBuf;

use clap::Args;
use perkwise::{
    EventPayload,
    uuids::{CompanyUuid, RuleUuid, UserUuid},
};
use perkwise_app::context::AppContext;
use serde_json::json;
use uuid::Uuid;

use super::print_json;

/// Evaluate an event payload and award the points
#[derive(Debug, Args)]
pub(crate) struct EvaluateArgs {
    #[arg(long)]
    company: Uuid,

    #[arg(long)]
    user: Uuid,

    /// Path to the event payload JSON
    #[arg(long)]
    payload: PathBuf,

    /// Evaluate only this rule instead of the full two-phase batch
    #[arg(long)]
    rule: Option<Uuid>,
}

pub(crate) async fn run(ctx: &AppContext, args: EvaluateArgs) -> Result<(), String> {
    let raw = tokio::fs::read_to_string(&args.payload)
        .await
        .map_err(|error| format!("failed to read {}: {error}", args.payload.display()))?;

    let payload: EventPayload =
        serde_json::from_str(&raw).map_err(|error| format!("invalid payload: {error}"))?;

    let company = CompanyUuid::from_uuid(args.company);
    let user = UserUuid::from_uuid(args.user);

    if let Some(rule) = args.rule {
        let rule = RuleUuid::from_uuid(rule);

        let points = ctx
            .points
            .evaluate_single_rule(company, user, rule, payload)
            .await
            .map_err(|error| format!("evaluation failed: {error}"))?;

        return print_json(&json!({ "rule_id": rule, "points": points }));
    }

    let evaluation = ctx
        .points
        .evaluate_all_rules(company, user, payload)
        .await
        .map_err(|error| format!("evaluation failed: {error}"))?;

    print_json(&evaluation)
}
