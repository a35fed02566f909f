pub mod calculate;
pub mod cors;
pub mod fees;
pub mod health;
pub mod vehicles;

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::fees::{BidCalculator, FeeConfigProvider, SqliteFeeRepository};
use crate::vehicles::VehicleRepository;

/// Shared state for all API handlers
#[derive(Clone)]
pub struct AppState {
    pub calculator: BidCalculator<dyn FeeConfigProvider>,
    pub fee_repository: SqliteFeeRepository,
    pub vehicles: VehicleRepository,
    pub db_pool: SqlitePool,
}

impl AppState {
    /// State backed entirely by one SQLite pool
    pub fn from_pool(db_pool: SqlitePool) -> Self {
        let fee_repository = SqliteFeeRepository::new(db_pool.clone());
        let provider: Arc<dyn FeeConfigProvider> = Arc::new(fee_repository.clone());
        Self::with_provider(db_pool, provider)
    }

    /// State whose calculations read fees from `provider` instead of the pool
    pub fn with_provider(db_pool: SqlitePool, provider: Arc<dyn FeeConfigProvider>) -> Self {
        Self {
            calculator: BidCalculator::new(provider),
            fee_repository: SqliteFeeRepository::new(db_pool.clone()),
            vehicles: VehicleRepository::new(db_pool.clone()),
            db_pool,
        }
    }
}
