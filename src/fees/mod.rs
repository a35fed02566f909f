pub mod calculator;
pub mod memory;
pub mod models;
pub mod provider;
pub mod repository;

pub use calculator::{BidCalculator, CalculationError};
pub use memory::InMemoryFeeProvider;
pub use models::{CalculationResult, FeeBreakdown, FeeName, FeeRule, Money};
pub use provider::{FeeConfigProvider, LookupError};
pub use repository::SqliteFeeRepository;
