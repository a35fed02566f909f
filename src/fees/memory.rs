use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::fees::models::{FeeName, FeeRule, Money};
use crate::fees::provider::{select_rule, FeeConfigProvider, LookupError};

/// Fee configuration held in memory.
///
/// Rules are keyed by `(vehicle_type, fee)`; each key keeps its instances
/// sorted by lower price bound so tiered lookups scan bands in order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeeProvider {
    types: BTreeSet<String>,
    rules: HashMap<(String, FeeName), Vec<FeeRule>>,
}

impl InMemoryFeeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a valid vehicle type
    pub fn with_type(mut self, vehicle_type: &str) -> Self {
        self.types.insert(vehicle_type.to_lowercase());
        self
    }

    /// Add a rule instance. Tiered fees may receive several.
    pub fn with_rule(mut self, vehicle_type: &str, fee: FeeName, rule: FeeRule) -> Self {
        self.insert_rule(vehicle_type, fee, rule);
        self
    }

    fn insert_rule(&mut self, vehicle_type: &str, fee: FeeName, rule: FeeRule) {
        let instances = self
            .rules
            .entry((vehicle_type.to_lowercase(), fee))
            .or_default();
        instances.push(rule);
        // None sorts first, so an open lower bound precedes every bounded band
        instances.sort_by_key(|r| r.price_range_min);
    }

    /// Number of rule instances configured for a fee
    pub fn rule_count(&self, vehicle_type: &str, fee: FeeName) -> usize {
        self.rules
            .get(&(vehicle_type.to_string(), fee))
            .map_or(0, Vec::len)
    }

    /// Parse a catalog file:
    ///
    /// ```toml
    /// [[vehicle_types]]
    /// name = "common"
    ///
    /// [[rules]]
    /// vehicle_type = "common"
    /// fee = "association_fee"
    /// fixed_amount = 10.0
    /// price_range_min = 500.01
    /// price_range_max = 1000.0
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content).context("Invalid fee catalog")?;
        let mut provider = Self::new();

        for entry in file.vehicle_types {
            provider.types.insert(entry.name.to_lowercase());
        }

        for entry in file.rules {
            let vehicle_type = entry.vehicle_type.to_lowercase();
            if !provider.types.contains(&vehicle_type) {
                anyhow::bail!(
                    "Rule '{}' references undeclared vehicle type '{}'",
                    entry.fee,
                    entry.vehicle_type
                );
            }
            provider.insert_rule(&vehicle_type, entry.fee, entry.rule());
        }

        Ok(provider)
    }

    /// Load a catalog from a TOML file on disk
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fee catalog {}", path.display()))?;
        Self::from_toml_str(&content)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    vehicle_types: Vec<CatalogType>,
    #[serde(default)]
    rules: Vec<CatalogRule>,
}

#[derive(Debug, Deserialize)]
struct CatalogType {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogRule {
    vehicle_type: String,
    fee: FeeName,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    percentage: Option<Money>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    fixed_amount: Option<Money>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    min_amount: Option<Money>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    max_amount: Option<Money>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    price_range_min: Option<Money>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    price_range_max: Option<Money>,
}

impl CatalogRule {
    fn rule(&self) -> FeeRule {
        FeeRule {
            percentage: self.percentage,
            fixed_amount: self.fixed_amount,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            price_range_min: self.price_range_min,
            price_range_max: self.price_range_max,
        }
    }
}

#[async_trait]
impl FeeConfigProvider for InMemoryFeeProvider {
    async fn list_valid_types(&self) -> Result<Vec<String>, LookupError> {
        Ok(self.types.iter().cloned().collect())
    }

    async fn lookup_rule(
        &self,
        vehicle_type: &str,
        fee: FeeName,
        price: Option<Money>,
    ) -> Result<Option<FeeRule>, LookupError> {
        let candidates = self
            .rules
            .get(&(vehicle_type.to_string(), fee))
            .map(Vec::as_slice)
            .unwrap_or_default();

        Ok(select_rule(vehicle_type, fee, candidates, price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const CATALOG: &str = r#"
[[vehicle_types]]
name = "common"

[[vehicle_types]]
name = "Luxury"

[[rules]]
vehicle_type = "common"
fee = "basic_buyer_fee"
percentage = 10
min_amount = 10
max_amount = 50

[[rules]]
vehicle_type = "common"
fee = "association_fee"
fixed_amount = 10.0
price_range_min = 500.01
price_range_max = 1000.0

[[rules]]
vehicle_type = "common"
fee = "association_fee"
fixed_amount = 5.0
price_range_min = 1.0
price_range_max = 500.0

[[rules]]
vehicle_type = "luxury"
fee = "storage_fee"
fixed_amount = 100
"#;

    #[tokio::test]
    async fn test_catalog_parsing() {
        let provider = InMemoryFeeProvider::from_toml_str(CATALOG).unwrap();

        assert_eq!(
            provider.list_valid_types().await.unwrap(),
            vec!["common".to_string(), "luxury".to_string()]
        );
        assert_eq!(provider.rule_count("common", FeeName::AssociationFee), 2);

        let basic = provider
            .lookup_rule("common", FeeName::BasicBuyerFee, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(basic.percentage, Some(dec!(10)));
        assert_eq!(basic.max_amount, Some(dec!(50)));
    }

    #[tokio::test]
    async fn test_tiers_sorted_regardless_of_insertion_order() {
        let provider = InMemoryFeeProvider::from_toml_str(CATALOG).unwrap();

        let low = provider
            .lookup_rule("common", FeeName::AssociationFee, Some(dec!(250)))
            .await
            .unwrap();
        assert_eq!(low.and_then(|r| r.fixed_amount), Some(dec!(5)));

        let high = provider
            .lookup_rule("common", FeeName::AssociationFee, Some(dec!(500.01)))
            .await
            .unwrap();
        assert_eq!(high.and_then(|r| r.fixed_amount), Some(dec!(10)));
    }

    #[tokio::test]
    async fn test_tiered_lookup_without_price_is_none() {
        let provider = InMemoryFeeProvider::from_toml_str(CATALOG).unwrap();
        let rule = provider
            .lookup_rule("common", FeeName::AssociationFee, None)
            .await
            .unwrap();
        assert!(rule.is_none());
    }

    #[tokio::test]
    async fn test_unknown_rule_is_none() {
        let provider = InMemoryFeeProvider::from_toml_str(CATALOG).unwrap();
        let rule = provider
            .lookup_rule("luxury", FeeName::SellerSpecialFee, None)
            .await
            .unwrap();
        assert!(rule.is_none());
    }

    #[test]
    fn test_catalog_rejects_undeclared_type() {
        let content = r#"
[[rules]]
vehicle_type = "truck"
fee = "storage_fee"
fixed_amount = 100
"#;
        let err = InMemoryFeeProvider::from_toml_str(content).unwrap_err();
        assert!(err.to_string().contains("undeclared vehicle type 'truck'"));
    }

    #[test]
    fn test_catalog_rejects_unknown_fee() {
        let content = r#"
[[vehicle_types]]
name = "common"

[[rules]]
vehicle_type = "common"
fee = "parking_fee"
fixed_amount = 100
"#;
        assert!(InMemoryFeeProvider::from_toml_str(content).is_err());
    }

    #[test]
    fn test_catalog_rejects_misspelled_field() {
        let content = r#"
[[vehicle_types]]
name = "common"

[[rules]]
vehicle_type = "common"
fee = "storage_fee"
fixed_amout = 100
"#;
        let err = InMemoryFeeProvider::from_toml_str(content).unwrap_err();
        assert!(format!("{:#}", err).contains("fixed_amout"));
    }

    #[test]
    fn test_catalog_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fees.toml");
        std::fs::write(&path, CATALOG).unwrap();

        let provider = InMemoryFeeProvider::from_toml_file(&path).unwrap();
        assert_eq!(provider.rule_count("luxury", FeeName::StorageFee), 1);
    }
}
