//! Rules Repository

use perkwise::{
    rules::StoredRule,
    uuids::{CompanyUuid, RuleUuid},
};
use sqlx::{Postgres, Transaction, query, query_as};

use crate::domain::rules::records::RuleRecord;

const CREATE_RULE_SQL: &str = include_str!("sql/create_rule.sql");
const UPDATE_RULE_SQL: &str = include_str!("sql/update_rule.sql");
const SET_RULE_ACTIVE_SQL: &str = include_str!("sql/set_rule_active.sql");
const GET_RULE_SQL: &str = include_str!("sql/get_rule.sql");
const LIST_RULES_SQL: &str = include_str!("sql/list_rules.sql");
const LIST_ACTIVE_RULES_SQL: &str = include_str!("sql/list_active_rules.sql");
const DEACTIVATE_COMPANY_RULES_SQL: &str = include_str!("sql/deactivate_company_rules.sql");

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PgRulesRepository;

impl PgRulesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_rule(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        rule: &StoredRule,
    ) -> Result<RuleRecord, sqlx::Error> {
        query_as::<Postgres, RuleRecord>(CREATE_RULE_SQL)
            .bind(rule.uuid.into_uuid())
            .bind(rule.company.into_uuid())
            .bind(&rule.name)
            .bind(&rule.rule_type)
            .bind(&rule.config)
            .bind(rule.active)
            .bind(rule.visible)
            .fetch_one(&mut **tx)
            .await
    }

    /// Replace name, visibility and config; fails with `RowNotFound` for unknown rules.
    pub(crate) async fn update_rule(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        rule: &StoredRule,
    ) -> Result<RuleRecord, sqlx::Error> {
        query_as::<Postgres, RuleRecord>(UPDATE_RULE_SQL)
            .bind(rule.company.into_uuid())
            .bind(rule.uuid.into_uuid())
            .bind(&rule.name)
            .bind(rule.visible)
            .bind(&rule.rule_type)
            .bind(&rule.config)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_rule_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
        rule: RuleUuid,
        active: bool,
    ) -> Result<RuleRecord, sqlx::Error> {
        query_as::<Postgres, RuleRecord>(SET_RULE_ACTIVE_SQL)
            .bind(company.into_uuid())
            .bind(rule.into_uuid())
            .bind(active)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_rule(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
        rule: RuleUuid,
    ) -> Result<Option<RuleRecord>, sqlx::Error> {
        query_as::<Postgres, RuleRecord>(GET_RULE_SQL)
            .bind(company.into_uuid())
            .bind(rule.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_rules(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
    ) -> Result<Vec<RuleRecord>, sqlx::Error> {
        query_as::<Postgres, RuleRecord>(LIST_RULES_SQL)
            .bind(company.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_active_rules(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
    ) -> Result<Vec<RuleRecord>, sqlx::Error> {
        query_as::<Postgres, RuleRecord>(LIST_ACTIVE_RULES_SQL)
            .bind(company.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn deactivate_company_rules(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company: CompanyUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DEACTIVATE_COMPANY_RULES_SQL)
            .bind(company.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}
