use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Monetary amount. Exact decimal arithmetic, rounded only when a result is produced.
pub type Money = Decimal;

/// Number of fractional digits kept on every output amount
pub const MONEY_SCALE: u32 = 2;

/// Round a money value half-up to two decimal places
pub fn round_money(value: Money) -> Money {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a stored amount. SQLite renders very large or tiny REAL values in
/// exponent form.
pub fn parse_money(raw: &str) -> Option<Money> {
    let raw = raw.trim();
    Money::from_str(raw)
        .or_else(|_| Money::from_scientific(raw))
        .ok()
}

/// Fee rule names, in the order a calculation evaluates them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeName {
    BasicBuyerFee,
    SellerSpecialFee,
    AssociationFee,
    StorageFee,
}

impl FeeName {
    pub const ALL: [FeeName; 4] = [
        FeeName::BasicBuyerFee,
        FeeName::SellerSpecialFee,
        FeeName::AssociationFee,
        FeeName::StorageFee,
    ];

    /// Stable identifier used in storage and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasicBuyerFee => "basic_buyer_fee",
            Self::SellerSpecialFee => "seller_special_fee",
            Self::AssociationFee => "association_fee",
            Self::StorageFee => "storage_fee",
        }
    }

    /// Tiered fees have several rule instances per vehicle type, one per price band
    pub fn is_tiered(&self) -> bool {
        matches!(self, Self::AssociationFee)
    }
}

impl fmt::Display for FeeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFeeName(pub String);

impl fmt::Display for UnknownFeeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown fee name: {}", self.0)
    }
}

impl std::error::Error for UnknownFeeName {}

impl FromStr for FeeName {
    type Err = UnknownFeeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeeName::ALL
            .into_iter()
            .find(|fee| fee.as_str() == s)
            .ok_or_else(|| UnknownFeeName(s.to_string()))
    }
}

/// Parameters of one configured fee rule. Every field is optional; which ones
/// matter depends on the fee the rule is attached to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRule {
    /// Rate in percent units (10 means 10%)
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub percentage: Option<Money>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub fixed_amount: Option<Money>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub min_amount: Option<Money>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub max_amount: Option<Money>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price_range_min: Option<Money>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price_range_max: Option<Money>,
}

impl FeeRule {
    pub fn percentage(percentage: Money) -> Self {
        Self {
            percentage: Some(percentage),
            ..Self::default()
        }
    }

    pub fn fixed(amount: Money) -> Self {
        Self {
            fixed_amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn bounded(percentage: Money, min_amount: Money, max_amount: Money) -> Self {
        Self {
            percentage: Some(percentage),
            min_amount: Some(min_amount),
            max_amount: Some(max_amount),
            ..Self::default()
        }
    }

    pub fn tier(amount: Money, range_min: Money, range_max: Money) -> Self {
        Self {
            fixed_amount: Some(amount),
            price_range_min: Some(range_min),
            price_range_max: Some(range_max),
            ..Self::default()
        }
    }

    /// Inclusive price range test. A missing bound leaves that side open.
    pub fn contains(&self, price: Money) -> bool {
        self.price_range_min.map_or(true, |min| price >= min)
            && self.price_range_max.map_or(true, |max| price <= max)
    }

    /// True when the price bands of two rules share at least one price
    pub fn overlaps(&self, other: &FeeRule) -> bool {
        let starts_before_other_ends = match (self.price_range_min, other.price_range_max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        };
        let ends_after_other_starts = match (self.price_range_max, other.price_range_min) {
            (Some(max), Some(min)) => max >= min,
            _ => true,
        };
        starts_before_other_ends && ends_after_other_starts
    }
}

/// Itemized fees of one calculation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    #[serde(with = "rust_decimal::serde::float")]
    pub basic_buyer_fee: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub seller_special_fee: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub association_fee: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub storage_fee: Money,
}

impl FeeBreakdown {
    /// Sum of all fees, `None` when it does not fit in a `Money`
    pub fn sum(&self) -> Option<Money> {
        self.basic_buyer_fee
            .checked_add(self.seller_special_fee)?
            .checked_add(self.association_fee)?
            .checked_add(self.storage_fee)
    }

    pub fn get(&self, fee: FeeName) -> Money {
        match fee {
            FeeName::BasicBuyerFee => self.basic_buyer_fee,
            FeeName::SellerSpecialFee => self.seller_special_fee,
            FeeName::AssociationFee => self.association_fee,
            FeeName::StorageFee => self.storage_fee,
        }
    }

    fn rounded(&self) -> Self {
        Self {
            basic_buyer_fee: round_money(self.basic_buyer_fee),
            seller_special_fee: round_money(self.seller_special_fee),
            association_fee: round_money(self.association_fee),
            storage_fee: round_money(self.storage_fee),
        }
    }
}

/// Outcome of a bid calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Money,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub fees: FeeBreakdown,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Money,
}

impl CalculationResult {
    /// Build an unrounded result; the total is derived from the unrounded parts.
    /// Returns `None` when the total overflows.
    pub fn new(price: Money, vehicle_type: String, fees: FeeBreakdown) -> Option<Self> {
        let total = price.checked_add(fees.sum()?)?;
        Some(Self {
            price,
            vehicle_type,
            fees,
            total,
        })
    }

    /// Round every amount independently for output
    pub fn rounded(self) -> Self {
        Self {
            price: round_money(self.price),
            fees: self.fees.rounded(),
            total: round_money(self.total),
            vehicle_type: self.vehicle_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(dec!(10.005)), dec!(10.01));
        assert_eq!(round_money(dec!(10.004)), dec!(10.00));
        assert_eq!(round_money(dec!(0.125)), dec!(0.13));
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("10"), Some(dec!(10)));
        assert_eq!(parse_money(" 500.01 "), Some(dec!(500.01)));
        assert_eq!(parse_money("abc"), None);
    }

    #[test]
    fn test_fee_name_round_trips_through_str() {
        for fee in FeeName::ALL {
            assert_eq!(fee.as_str().parse::<FeeName>().unwrap(), fee);
        }
        assert!("parking_fee".parse::<FeeName>().is_err());
    }

    #[test]
    fn test_only_association_fee_is_tiered() {
        let tiered: Vec<_> = FeeName::ALL.into_iter().filter(|f| f.is_tiered()).collect();
        assert_eq!(tiered, vec![FeeName::AssociationFee]);
    }

    #[test]
    fn test_rule_contains_is_inclusive() {
        let rule = FeeRule::tier(dec!(10), dec!(500.01), dec!(1000));
        assert!(rule.contains(dec!(500.01)));
        assert!(rule.contains(dec!(1000)));
        assert!(!rule.contains(dec!(500.00)));
        assert!(!rule.contains(dec!(1000.01)));
    }

    #[test]
    fn test_rule_without_range_contains_everything() {
        let rule = FeeRule::fixed(dec!(100));
        assert!(rule.contains(dec!(0)));
        assert!(rule.contains(dec!(1000000)));
    }

    #[test]
    fn test_overlapping_tiers() {
        let low = FeeRule::tier(dec!(5), dec!(1), dec!(500));
        let mid = FeeRule::tier(dec!(10), dec!(500.01), dec!(1000));
        let wide = FeeRule::tier(dec!(10), dec!(400), dec!(1000));
        assert!(!low.overlaps(&mid));
        assert!(low.overlaps(&wide));
        assert!(mid.overlaps(&wide));
    }

    #[test]
    fn test_result_total_uses_unrounded_parts() {
        let fees = FeeBreakdown {
            basic_buyer_fee: dec!(0.004),
            seller_special_fee: dec!(0.004),
            association_fee: dec!(0),
            storage_fee: dec!(0),
        };
        let result = CalculationResult::new(dec!(0.002), "common".to_string(), fees)
            .unwrap()
            .rounded();

        assert_eq!(result.fees.basic_buyer_fee, dec!(0.00));
        assert_eq!(result.fees.seller_special_fee, dec!(0.00));
        assert_eq!(result.total, dec!(0.01));
    }

    #[test]
    fn test_result_total_overflow_is_none() {
        let fees = FeeBreakdown {
            storage_fee: dec!(100),
            ..FeeBreakdown::default()
        };
        assert!(CalculationResult::new(Money::MAX, "common".to_string(), fees).is_none());

        let fees = FeeBreakdown {
            basic_buyer_fee: Money::MAX,
            seller_special_fee: Money::MAX,
            ..FeeBreakdown::default()
        };
        assert!(fees.sum().is_none());
    }

    #[test]
    fn test_result_serializes_with_stable_keys() {
        let fees = FeeBreakdown {
            basic_buyer_fee: dec!(50),
            seller_special_fee: dec!(10.02),
            association_fee: dec!(10),
            storage_fee: dec!(100),
        };
        let result = CalculationResult::new(dec!(501), "common".to_string(), fees)
            .unwrap()
            .rounded();
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["type"], "common");
        assert_eq!(json["fees"]["seller_special_fee"].as_f64(), Some(10.02));
        assert_eq!(json["total"].as_f64(), Some(671.02));
    }
}
