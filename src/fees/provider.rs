use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::fees::models::{FeeName, FeeRule, Money};

/// Failure to read fee configuration. Distinct from a rule simply not being configured.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The configuration source could not be reached or queried
    #[error("fee configuration source unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be interpreted
    #[error("corrupt fee configuration for {vehicle_type}/{fee}: {reason}")]
    Corrupt {
        vehicle_type: String,
        fee: String,
        reason: String,
    },
}

/// Read-only source of fee rules and valid vehicle types.
///
/// Implementations must tolerate concurrent lookups; the calculator issues all
/// of a calculation's lookups at once.
#[async_trait]
pub trait FeeConfigProvider: Send + Sync {
    /// All known vehicle type identifiers, ordered by name
    async fn list_valid_types(&self) -> Result<Vec<String>, LookupError>;

    /// The rule configured for `(vehicle_type, fee)`, if any.
    ///
    /// For tiered fees `price` selects the band; a tiered lookup without a price
    /// never matches.
    async fn lookup_rule(
        &self,
        vehicle_type: &str,
        fee: FeeName,
        price: Option<Money>,
    ) -> Result<Option<FeeRule>, LookupError>;
}

/// Pick the applicable rule out of every instance configured for one fee.
///
/// `candidates` must be ordered by `price_range_min`. Non-tiered fees take the
/// first instance. Tiered fees take the first band containing `price`; a band
/// overlapping the match is a data integrity problem and is logged.
pub fn select_rule(
    vehicle_type: &str,
    fee: FeeName,
    candidates: &[FeeRule],
    price: Option<Money>,
) -> Option<FeeRule> {
    if !fee.is_tiered() {
        return candidates.first().cloned();
    }

    let price = price?;
    let mut matching = candidates.iter().filter(|rule| rule.contains(price));
    let selected = matching.next()?;

    if matching.next().is_some() {
        warn!(
            vehicle_type = %vehicle_type,
            fee = %fee,
            price = %price,
            "Overlapping price tiers configured, using the lowest band"
        );
    }

    Some(selected.clone())
}
