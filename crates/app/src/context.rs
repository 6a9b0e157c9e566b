//! App Context

use std::sync::Arc;

use perkwise::EngineConfig;
use sqlx::migrate::MigrateError;
use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        fees::{FeesService, PgFeesService},
        points::{PgPointsService, PointsService},
        purchases::{PgPurchasesService, PurchasesService},
        rules::{PgRulesService, RulesService},
        wallets::{PgWalletsService, WalletsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply migrations")]
    Migrations(#[source] MigrateError),
}

#[derive(Clone)]
pub struct AppContext {
    pub db: Db,
    pub points: Arc<dyn PointsService>,
    pub rules: Arc<dyn RulesService>,
    pub wallets: Arc<dyn WalletsService>,
    pub fees: Arc<dyn FeesService>,
    pub purchases: Arc<dyn PurchasesService>,
}

impl AppContext {
    /// Wire every service onto one pool.
    #[must_use]
    pub fn new(db: Db, config: EngineConfig) -> Self {
        Self {
            points: Arc::new(PgPointsService::new(db.clone(), config)),
            rules: Arc::new(PgRulesService::new(db.clone())),
            wallets: Arc::new(PgWalletsService::new(db.clone())),
            fees: Arc::new(PgFeesService::new(db.clone(), config.fees)),
            purchases: Arc::new(PgPurchasesService::new(db.clone())),
            db,
        }
    }

    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str, config: EngineConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::new(Db::new(pool), config))
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error when a migration fails.
    pub async fn migrate(&self) -> Result<(), AppInitError> {
        database::migrate(self.db.pool())
            .await
            .map_err(AppInitError::Migrations)
    }
}
