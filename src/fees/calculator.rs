use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::fees::models::{CalculationResult, FeeBreakdown, FeeName, FeeRule, Money};
use crate::fees::provider::{FeeConfigProvider, LookupError};

/// Reasons a calculation can fail
#[derive(Debug, Error)]
pub enum CalculationError {
    #[error("Invalid vehicle type: {vehicle_type}. Valid types: {}", valid_types.join(", "))]
    InvalidVehicleType {
        vehicle_type: String,
        valid_types: Vec<String>,
    },

    #[error("Price {price} is too large to calculate fees for")]
    AmountOutOfRange { price: Money },

    #[error(transparent)]
    LookupFailure(#[from] LookupError),
}

/// Computes fees and totals for vehicle bids from the configured fee rules
pub struct BidCalculator<P: FeeConfigProvider + ?Sized> {
    provider: Arc<P>,
}

impl<P: FeeConfigProvider + ?Sized> Clone for BidCalculator<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
        }
    }
}

impl<P: FeeConfigProvider + ?Sized> BidCalculator<P> {
    /// Create a new calculator over a fee configuration provider
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Calculate the fee breakdown and total for a vehicle.
    ///
    /// Negative prices are treated as zero and the vehicle type is matched
    /// case-insensitively. A fee with no configured rule contributes zero.
    pub async fn calculate(
        &self,
        price: Money,
        vehicle_type: &str,
    ) -> Result<CalculationResult, CalculationError> {
        let price = price.max(Money::ZERO);
        let vehicle_type = vehicle_type.to_lowercase();

        let valid_types = self.provider.list_valid_types().await?;
        if !valid_types.iter().any(|t| *t == vehicle_type) {
            return Err(CalculationError::InvalidVehicleType {
                vehicle_type,
                valid_types,
            });
        }

        let (basic, special, association, storage) = tokio::try_join!(
            self.fetch(&vehicle_type, FeeName::BasicBuyerFee, price),
            self.fetch(&vehicle_type, FeeName::SellerSpecialFee, price),
            self.fetch(&vehicle_type, FeeName::AssociationFee, price),
            self.fetch(&vehicle_type, FeeName::StorageFee, price),
        )?;

        let out_of_range = || CalculationError::AmountOutOfRange { price };
        let fees = FeeBreakdown {
            basic_buyer_fee: match basic {
                Some(rule) => basic_buyer_fee(price, &rule).ok_or_else(out_of_range)?,
                None => Money::ZERO,
            },
            seller_special_fee: match special {
                Some(rule) => seller_special_fee(price, &rule).ok_or_else(out_of_range)?,
                None => Money::ZERO,
            },
            association_fee: association.map_or(Money::ZERO, |rule| flat_fee(&rule)),
            storage_fee: storage.map_or(Money::ZERO, |rule| flat_fee(&rule)),
        };

        let result = CalculationResult::new(price, vehicle_type, fees)
            .ok_or_else(out_of_range)?
            .rounded();
        debug!(
            vehicle_type = %result.vehicle_type,
            price = %result.price,
            total = %result.total,
            "Bid calculated"
        );

        Ok(result)
    }

    /// Look up one fee's rule. Only tiered fees receive the price.
    async fn fetch(
        &self,
        vehicle_type: &str,
        fee: FeeName,
        price: Money,
    ) -> Result<Option<FeeRule>, LookupError> {
        let tier_price = fee.is_tiered().then_some(price);
        let rule = self.provider.lookup_rule(vehicle_type, fee, tier_price).await?;

        if rule.is_none() {
            warn!(
                vehicle_type = %vehicle_type,
                fee = %fee,
                price = %price,
                "No fee rule configured, applying zero fee"
            );
        }

        Ok(rule)
    }
}

/// `None` when the product overflows
fn percent_of(price: Money, rule: &FeeRule) -> Option<Money> {
    price
        .checked_mul(rule.percentage.unwrap_or(Money::ZERO))?
        .checked_div(Money::ONE_HUNDRED)
}

/// Percentage of price clamped to `[min_amount, max_amount]`. The minimum wins
/// when the bounds are inverted.
fn basic_buyer_fee(price: Money, rule: &FeeRule) -> Option<Money> {
    let raw = percent_of(price, rule)?;
    let capped = match rule.max_amount {
        Some(max) => raw.min(max),
        None => raw,
    };
    Some(capped.max(rule.min_amount.unwrap_or(Money::ZERO)))
}

/// Unbounded percentage of price
fn seller_special_fee(price: Money, rule: &FeeRule) -> Option<Money> {
    percent_of(price, rule)
}

fn flat_fee(rule: &FeeRule) -> Money {
    rule.fixed_amount.unwrap_or(Money::ZERO)
}
