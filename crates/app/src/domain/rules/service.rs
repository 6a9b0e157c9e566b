//! Rules service.

use async_trait::async_trait;
use mockall::automock;
use perkwise::{
    rules::NewRule,
    uuids::{CompanyUuid, RuleUuid},
};
use tracing::info;

use crate::{
    database::Db,
    domain::rules::{
        errors::RulesServiceError,
        records::{RuleRecord, RuleUpdate},
        repository::PgRulesRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgRulesService {
    db: Db,
    repository: PgRulesRepository,
}

impl PgRulesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgRulesRepository::new(),
        }
    }

    async fn set_active(
        &self,
        company: CompanyUuid,
        rule: RuleUuid,
        active: bool,
    ) -> Result<RuleRecord, RulesServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .repository
            .set_rule_active(&mut tx, company, rule, active)
            .await?;

        tx.commit().await?;

        info!(company_uuid = %company, rule_uuid = %rule, active, "rule status changed");

        Ok(record)
    }
}

#[async_trait]
impl RulesService for PgRulesService {
    #[tracing::instrument(
        name = "rules.service.create_rule",
        skip(self, rule),
        fields(company_uuid = %company, rule_uuid = %rule.uuid),
        err
    )]
    async fn create_rule(
        &self,
        company: CompanyUuid,
        rule: NewRule,
    ) -> Result<RuleRecord, RulesServiceError> {
        let stored = rule.to_stored(company)?;

        let mut tx = self.db.begin().await?;

        let created = self.repository.create_rule(&mut tx, &stored).await?;

        tx.commit().await?;

        Ok(created)
    }

    #[tracing::instrument(
        name = "rules.service.update_rule",
        skip(self, update),
        fields(company_uuid = %company, rule_uuid = %rule),
        err
    )]
    async fn update_rule(
        &self,
        company: CompanyUuid,
        rule: RuleUuid,
        update: RuleUpdate,
    ) -> Result<RuleRecord, RulesServiceError> {
        let stored = NewRule {
            uuid: rule,
            name: update.name,
            visible: update.visible,
            cooldown_days: update.cooldown_days,
            config: update.config,
        }
        .to_stored(company)?;

        let mut tx = self.db.begin().await?;

        let updated = self.repository.update_rule(&mut tx, &stored).await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn activate_rule(
        &self,
        company: CompanyUuid,
        rule: RuleUuid,
    ) -> Result<RuleRecord, RulesServiceError> {
        self.set_active(company, rule, true).await
    }

    async fn deactivate_rule(
        &self,
        company: CompanyUuid,
        rule: RuleUuid,
    ) -> Result<RuleRecord, RulesServiceError> {
        self.set_active(company, rule, false).await
    }

    async fn get_rule(
        &self,
        company: CompanyUuid,
        rule: RuleUuid,
    ) -> Result<RuleRecord, RulesServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.repository.find_rule(&mut tx, company, rule).await?;

        tx.commit().await?;

        record.ok_or(RulesServiceError::NotFound)
    }

    async fn list_rules(&self, company: CompanyUuid) -> Result<Vec<RuleRecord>, RulesServiceError> {
        let mut tx = self.db.begin().await?;

        let rules = self.repository.list_rules(&mut tx, company).await?;

        tx.commit().await?;

        Ok(rules)
    }
}

#[automock]
#[async_trait]
pub trait RulesService: Send + Sync {
    /// Validate and store a new, active rule.
    async fn create_rule(
        &self,
        company: CompanyUuid,
        rule: NewRule,
    ) -> Result<RuleRecord, RulesServiceError>;

    /// Validate and replace a rule's settings.
    async fn update_rule(
        &self,
        company: CompanyUuid,
        rule: RuleUuid,
        update: RuleUpdate,
    ) -> Result<RuleRecord, RulesServiceError>;

    async fn activate_rule(
        &self,
        company: CompanyUuid,
        rule: RuleUuid,
    ) -> Result<RuleRecord, RulesServiceError>;

    async fn deactivate_rule(
        &self,
        company: CompanyUuid,
        rule: RuleUuid,
    ) -> Result<RuleRecord, RulesServiceError>;

    /// Retrieve a single rule of `company`.
    async fn get_rule(
        &self,
        company: CompanyUuid,
        rule: RuleUuid,
    ) -> Result<RuleRecord, RulesServiceError>;

    /// Rules of `company` in declaration order.
    async fn list_rules(&self, company: CompanyUuid) -> Result<Vec<RuleRecord>, RulesServiceError>;
}

#[cfg(test)]
mod tests {
    use perkwise::rules::{
        RuleConfig, RuleConfigError,
        types::{FirstPurchase, ValueSpent},
    };
    use rust_decimal_macros::dec;
    use serde_json::json;
    use testresult::TestResult;

    use crate::test::TestContext;

    use super::*;

    fn value_spent() -> NewRule {
        NewRule::new(
            "1 point per 10 spent",
            RuleConfig::ValueSpent(ValueSpent {
                step: dec!(10),
                points_per_step: 1,
            }),
        )
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn create_rule_stores_typed_config() -> TestResult {
        let ctx = TestContext::new().await;

        let created = ctx
            .rules
            .create_rule(ctx.company, value_spent().with_cooldown_days(2))
            .await?;

        assert_eq!(created.rule_type, "value_spent");
        assert_eq!(created.config["cooldown_days"], json!(2));
        assert!(created.active);

        let rule = created.to_stored().parse()?;

        assert_eq!(rule.cooldown_days, 2);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn invalid_configs_are_rejected_before_writing() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx
            .rules
            .create_rule(
                ctx.company,
                NewRule::new(
                    "broken",
                    RuleConfig::ValueSpent(ValueSpent {
                        step: dec!(0),
                        points_per_step: 1,
                    }),
                ),
            )
            .await;

        assert!(
            matches!(
                result,
                Err(RulesServiceError::InvalidConfig(RuleConfigError::Invalid { .. }))
            ),
            "expected InvalidConfig, got {result:?}"
        );
        assert!(ctx.rules.list_rules(ctx.company).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn list_rules_keeps_declaration_order() -> TestResult {
        let ctx = TestContext::new().await;

        let first = ctx.rules.create_rule(ctx.company, value_spent()).await?;
        let second = ctx
            .rules
            .create_rule(
                ctx.company,
                NewRule::new(
                    "welcome",
                    RuleConfig::FirstPurchase(FirstPurchase { bonus_points: 50 }),
                ),
            )
            .await?;

        ctx.rules.create_rule(ctx.other_company, value_spent()).await?;

        let uuids: Vec<_> = ctx
            .rules
            .list_rules(ctx.company)
            .await?
            .iter()
            .map(|rule| rule.uuid)
            .collect();

        assert_eq!(uuids, vec![first.uuid, second.uuid]);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn update_rule_replaces_config_and_keeps_status() -> TestResult {
        let ctx = TestContext::new().await;

        let created = ctx.rules.create_rule(ctx.company, value_spent()).await?;

        ctx.rules.deactivate_rule(ctx.company, created.uuid).await?;

        let updated = ctx
            .rules
            .update_rule(
                ctx.company,
                created.uuid,
                RuleUpdate {
                    name: "welcome".to_string(),
                    visible: false,
                    cooldown_days: 0,
                    config: RuleConfig::FirstPurchase(FirstPurchase { bonus_points: 25 }),
                },
            )
            .await?;

        assert_eq!(updated.rule_type, "first_purchase");
        assert_eq!(updated.name, "welcome");
        assert!(!updated.visible);
        assert!(!updated.active);

        let reactivated = ctx.rules.activate_rule(ctx.company, created.uuid).await?;

        assert!(reactivated.active);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn rules_are_scoped_to_their_company() -> TestResult {
        let ctx = TestContext::new().await;

        let created = ctx.rules.create_rule(ctx.company, value_spent()).await?;

        let result = ctx.rules.get_rule(ctx.other_company, created.uuid).await;

        assert!(
            matches!(result, Err(RulesServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        let result = ctx.rules.deactivate_rule(ctx.other_company, created.uuid).await;

        assert!(
            matches!(result, Err(RulesServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn duplicate_uuids_are_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let rule = value_spent();

        ctx.rules.create_rule(ctx.company, rule.clone()).await?;

        let result = ctx.rules.create_rule(ctx.company, rule).await;

        assert!(
            matches!(result, Err(RulesServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }
}
