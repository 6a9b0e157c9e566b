//! Points service.

use async_trait::async_trait;
use mockall::automock;
use perkwise::{
    Engine, EngineConfig, EventPayload, Evaluation,
    uuids::{CompanyUuid, RuleUuid, UserUuid},
};
use tracing::info;

use crate::{database::Db, domain::points::errors::PointsServiceError, store::PgLoyaltyStore};

#[derive(Debug, Clone)]
pub struct PgPointsService {
    engine: Engine<PgLoyaltyStore>,
}

impl PgPointsService {
    #[must_use]
    pub fn new(db: Db, config: EngineConfig) -> Self {
        Self {
            engine: Engine::new(PgLoyaltyStore::new(db), config),
        }
    }
}

#[async_trait]
impl PointsService for PgPointsService {
    async fn evaluate_all_rules(
        &self,
        company: CompanyUuid,
        user: UserUuid,
        payload: EventPayload,
    ) -> Result<Evaluation, PointsServiceError> {
        let evaluation = self
            .engine
            .evaluate_all_rules(company, user, &payload)
            .await?;

        info!(
            company_uuid = %company,
            user_uuid = %user,
            total_points = evaluation.total_points,
            awarded_rules = evaluation.breakdown.len(),
            "event evaluated"
        );

        Ok(evaluation)
    }

    async fn evaluate_single_rule(
        &self,
        company: CompanyUuid,
        user: UserUuid,
        rule: RuleUuid,
        payload: EventPayload,
    ) -> Result<u64, PointsServiceError> {
        Ok(self
            .engine
            .evaluate_single_rule(company, user, rule, &payload)
            .await?)
    }
}

#[automock]
#[async_trait]
pub trait PointsService: Send + Sync {
    /// Evaluate and fund every active rule of `company` for one event.
    async fn evaluate_all_rules(
        &self,
        company: CompanyUuid,
        user: UserUuid,
        payload: EventPayload,
    ) -> Result<Evaluation, PointsServiceError>;

    /// Evaluate and fund one rule; returns the points awarded.
    async fn evaluate_single_rule(
        &self,
        company: CompanyUuid,
        user: UserUuid,
        rule: RuleUuid,
        payload: EventPayload,
    ) -> Result<u64, PointsServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::{Timestamp, ToSpan};
    use perkwise::{
        FeeSettlement,
        ledger::Account,
        rules::{
            NewRule, RuleConfig,
            types::{Category, Frequency, NamedEvent, ValueSpent},
        },
    };
    use rust_decimal_macros::dec;
    use testresult::TestResult;

    use crate::{
        domain::{
            purchases::{PurchasesService, records::NewPurchase},
            rules::RulesService,
            wallets::WalletsService,
        },
        test::TestContext,
    };

    use super::*;

    async fn fund(ctx: &TestContext, fees: u64, points: u64) -> TestResult {
        ctx.wallets
            .fund_fees(ctx.company, fees, "fees".to_string())
            .await?;
        ctx.wallets
            .fund_points(ctx.company, points, "points".to_string())
            .await?;

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn awards_are_funded_from_company_wallets() -> TestResult {
        let ctx = TestContext::new().await;

        fund(&ctx, 100, 100).await?;

        ctx.rules
            .create_rule(
                ctx.company,
                NewRule::new(
                    "1 point per 10 spent",
                    RuleConfig::ValueSpent(ValueSpent {
                        step: dec!(10),
                        points_per_step: 1,
                    }),
                ),
            )
            .await?;

        ctx.rules
            .create_rule(
                ctx.company,
                NewRule::new(
                    "double points on coffee",
                    RuleConfig::Category(Category {
                        categories: ["coffee".to_string()].into_iter().collect(),
                        multiplier: dec!(2),
                    }),
                ),
            )
            .await?;

        let payload = EventPayload::purchase(dec!(55)).with_categories(["coffee"]);

        let evaluation = ctx
            .points
            .evaluate_all_rules(ctx.company, ctx.user, payload)
            .await?;

        assert_eq!(evaluation.total_points, 15);
        assert_eq!(evaluation.breakdown.len(), 2);

        assert_eq!(ctx.wallets.balance(Account::UserPoints(ctx.user)).await?, 15);
        assert_eq!(
            ctx.wallets.balance(Account::CompanyPoints(ctx.company)).await?,
            85
        );
        assert_eq!(
            ctx.wallets.balance(Account::CompanyFees(ctx.company)).await?,
            80
        );

        for account in [
            Account::UserPoints(ctx.user),
            Account::CompanyPoints(ctx.company),
            Account::CompanyFees(ctx.company),
        ] {
            assert!(ctx.wallets.reconcile(account).await?.is_balanced());
        }

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn empty_fee_wallet_deactivates_company_rules() -> TestResult {
        let ctx = TestContext::new().await;

        fund(&ctx, 5, 100).await?;

        let created = ctx
            .rules
            .create_rule(
                ctx.company,
                NewRule::new(
                    "signup bonus",
                    RuleConfig::Event(NamedEvent {
                        event_name: "signup".to_string(),
                        points: 10,
                    }),
                ),
            )
            .await?;

        let evaluation = ctx
            .points
            .evaluate_all_rules(ctx.company, ctx.user, EventPayload::named_event("signup"))
            .await?;

        assert_eq!(evaluation.total_points, 0);
        assert!(!ctx.rules.get_rule(ctx.company, created.uuid).await?.active);
        assert_eq!(ctx.wallets.balance(Account::UserPoints(ctx.user)).await?, 0);
        assert_eq!(
            ctx.wallets.balance(Account::CompanyFees(ctx.company)).await?,
            5
        );

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn frequency_rules_count_logged_purchases() -> TestResult {
        let ctx = TestContext::new().await;
        let now = Timestamp::now();

        fund(&ctx, 100, 100).await?;

        let created = ctx
            .rules
            .create_rule(
                ctx.company,
                NewRule::new(
                    "3 visits a month",
                    RuleConfig::Frequency(Frequency {
                        window_days: 30,
                        threshold: 3,
                        bonus_points: 20,
                    }),
                ),
            )
            .await?;

        for hours in [240, 48] {
            ctx.purchases
                .record_purchase(
                    ctx.company,
                    ctx.user,
                    NewPurchase::new(dec!(10), now.checked_sub(hours.hours())?),
                )
                .await?;
        }

        let payload = EventPayload::purchase(dec!(10)).at(now);

        let awarded = ctx
            .points
            .evaluate_single_rule(ctx.company, ctx.user, created.uuid, payload.clone())
            .await?;

        assert_eq!(awarded, 0);

        ctx.purchases
            .record_purchase(ctx.company, ctx.user, NewPurchase::new(dec!(10), now))
            .await?;

        let awarded = ctx
            .points
            .evaluate_single_rule(ctx.company, ctx.user, created.uuid, payload)
            .await?;

        assert_eq!(awarded, 20);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn unknown_rules_are_not_found() {
        let ctx = TestContext::new().await;
        let rule = RuleUuid::new();

        let result = ctx
            .points
            .evaluate_single_rule(ctx.company, ctx.user, rule, EventPayload::default())
            .await;

        assert!(
            matches!(result, Err(PointsServiceError::RuleNotFound(uuid)) if uuid == rule),
            "expected RuleNotFound, got {result:?}"
        );
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn atomic_settlement_refunds_fee_when_reserve_is_short() -> TestResult {
        let ctx = TestContext::with_config(EngineConfig {
            settlement: FeeSettlement::Atomic,
            ..EngineConfig::default()
        })
        .await;

        fund(&ctx, 100, 3).await?;

        ctx.rules
            .create_rule(
                ctx.company,
                NewRule::new(
                    "signup bonus",
                    RuleConfig::Event(NamedEvent {
                        event_name: "signup".to_string(),
                        points: 10,
                    }),
                ),
            )
            .await?;

        let evaluation = ctx
            .points
            .evaluate_all_rules(ctx.company, ctx.user, EventPayload::named_event("signup"))
            .await?;

        assert_eq!(evaluation.total_points, 0);
        assert_eq!(
            ctx.wallets.balance(Account::CompanyFees(ctx.company)).await?,
            100
        );
        assert_eq!(
            ctx.wallets.balance(Account::CompanyPoints(ctx.company)).await?,
            3
        );

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn concurrent_evaluations_never_overdraw_the_reserve() -> TestResult {
        let ctx = TestContext::new().await;

        fund(&ctx, 1_000, 25).await?;

        ctx.rules
            .create_rule(
                ctx.company,
                NewRule::new(
                    "checkout bonus",
                    RuleConfig::Event(NamedEvent {
                        event_name: "checkout".to_string(),
                        points: 10,
                    }),
                ),
            )
            .await?;

        let points = std::sync::Arc::new(ctx.points.clone());

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let points = std::sync::Arc::clone(&points);
                let (company, user) = (ctx.company, UserUuid::new());

                tokio::spawn(async move {
                    points
                        .evaluate_all_rules(company, user, EventPayload::named_event("checkout"))
                        .await
                })
            })
            .collect();

        let mut awarded = 0;

        for handle in handles {
            awarded += handle.await??.total_points;
        }

        let awards: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM wallet_transactions WHERE kind = 'award'",
        )
        .fetch_one(&ctx.db.pool)
        .await?;

        assert_eq!(awarded, 20);
        assert_eq!(awards, 20);
        assert_eq!(
            ctx.wallets.balance(Account::CompanyPoints(ctx.company)).await?,
            5
        );
        assert!(
            ctx.wallets
                .reconcile(Account::CompanyPoints(ctx.company))
                .await?
                .is_balanced()
        );

        Ok(())
    }
}
