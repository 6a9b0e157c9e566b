//! Test context for service-level integration tests.

use perkwise::{
    EngineConfig,
    uuids::{CompanyUuid, UserUuid},
};

use crate::{
    database::Db,
    domain::{
        fees::PgFeesService, points::PgPointsService, purchases::PgPurchasesService,
        rules::PgRulesService, wallets::PgWalletsService,
    },
};

use super::db::TestDb;

pub(crate) struct TestContext {
    pub(crate) db: TestDb,
    pub(crate) company: CompanyUuid,
    pub(crate) other_company: CompanyUuid,
    pub(crate) user: UserUuid,
    pub(crate) rules: PgRulesService,
    pub(crate) wallets: PgWalletsService,
    pub(crate) fees: PgFeesService,
    pub(crate) purchases: PgPurchasesService,
    pub(crate) points: PgPointsService,
}

impl TestContext {
    pub(crate) async fn new() -> Self {
        Self::with_config(EngineConfig::default()).await
    }

    pub(crate) async fn with_config(config: EngineConfig) -> Self {
        let test_db = TestDb::new().await;
        let db = Db::new(test_db.pool.clone());

        Self {
            company: CompanyUuid::new(),
            other_company: CompanyUuid::new(),
            user: UserUuid::new(),
            rules: PgRulesService::new(db.clone()),
            wallets: PgWalletsService::new(db.clone()),
            fees: PgFeesService::new(db.clone(), config.fees),
            purchases: PgPurchasesService::new(db.clone()),
            points: PgPointsService::new(db, config),
            db: test_db,
        }
    }
}
