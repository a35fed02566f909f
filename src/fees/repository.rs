use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::{error, warn};

use crate::fees::models::{parse_money, FeeName, FeeRule, Money};
use crate::fees::provider::{select_rule, FeeConfigProvider, LookupError};

/// Fee configuration stored in SQLite
#[derive(Clone)]
pub struct SqliteFeeRepository {
    db_pool: SqlitePool,
}

/// Raw rule row. Money columns are selected as text so they parse exactly.
#[derive(sqlx::FromRow)]
struct FeeRuleRow {
    fee_type: String,
    percentage: Option<String>,
    fixed_amount: Option<String>,
    min_amount: Option<String>,
    max_amount: Option<String>,
    price_range_min: Option<String>,
    price_range_max: Option<String>,
}

impl FeeRuleRow {
    fn into_rule(self, vehicle_type: &str) -> Result<FeeRule, LookupError> {
        let fee_type = self.fee_type;
        let parse = |value: Option<String>| -> Result<Option<Money>, LookupError> {
            value
                .map(|raw| {
                    parse_money(&raw).ok_or_else(|| LookupError::Corrupt {
                        vehicle_type: vehicle_type.to_string(),
                        fee: fee_type.clone(),
                        reason: format!("'{}' is not a decimal amount", raw),
                    })
                })
                .transpose()
        };

        Ok(FeeRule {
            percentage: parse(self.percentage)?,
            fixed_amount: parse(self.fixed_amount)?,
            min_amount: parse(self.min_amount)?,
            max_amount: parse(self.max_amount)?,
            price_range_min: parse(self.price_range_min)?,
            price_range_max: parse(self.price_range_max)?,
        })
    }
}

fn unavailable(context: &str, err: sqlx::Error) -> LookupError {
    error!(error = %err, "{}", context);
    LookupError::Unavailable(format!("{}: {}", context, err))
}

const RULE_COLUMNS: &str = r#"
    fc.fee_type,
    CAST(fc.percentage AS TEXT) AS percentage,
    CAST(fc.fixed_amount AS TEXT) AS fixed_amount,
    CAST(fc.min_amount AS TEXT) AS min_amount,
    CAST(fc.max_amount AS TEXT) AS max_amount,
    CAST(fc.price_range_min AS TEXT) AS price_range_min,
    CAST(fc.price_range_max AS TEXT) AS price_range_max
"#;

impl SqliteFeeRepository {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    /// Every rule instance configured for `(vehicle_type, fee)`, lowest band first
    async fn fetch_instances(
        &self,
        vehicle_type: &str,
        fee: FeeName,
    ) -> Result<Vec<FeeRule>, LookupError> {
        let query = format!(
            r#"
            SELECT {RULE_COLUMNS}
            FROM fee_configurations AS fc
            JOIN vehicle_types AS vt ON fc.vehicle_type_id = vt.id
            WHERE vt.name = ? AND fc.fee_type = ?
            ORDER BY fc.price_range_min ASC, fc.id ASC
            "#
        );

        let rows = sqlx::query_as::<_, FeeRuleRow>(&query)
            .bind(vehicle_type)
            .bind(fee.as_str())
            .fetch_all(&self.db_pool)
            .await
            .map_err(|e| unavailable("Failed to load fee rules", e))?;

        rows.into_iter()
            .map(|row| row.into_rule(vehicle_type))
            .collect()
    }

    /// All rules of a vehicle type grouped by fee
    pub async fn rules_by_type(
        &self,
        vehicle_type: &str,
    ) -> Result<BTreeMap<FeeName, Vec<FeeRule>>, LookupError> {
        let query = format!(
            r#"
            SELECT {RULE_COLUMNS}
            FROM fee_configurations AS fc
            JOIN vehicle_types AS vt ON fc.vehicle_type_id = vt.id
            WHERE vt.name = ?
            ORDER BY fc.fee_type ASC, fc.price_range_min ASC, fc.id ASC
            "#
        );

        let rows = sqlx::query_as::<_, FeeRuleRow>(&query)
            .bind(vehicle_type)
            .fetch_all(&self.db_pool)
            .await
            .map_err(|e| unavailable("Failed to load fee rules", e))?;

        let mut grouped: BTreeMap<FeeName, Vec<FeeRule>> = BTreeMap::new();
        for row in rows {
            let fee = match row.fee_type.parse::<FeeName>() {
                Ok(fee) => fee,
                Err(e) => {
                    warn!(vehicle_type = %vehicle_type, error = %e, "Skipping unknown fee rule");
                    continue;
                }
            };
            grouped.entry(fee).or_default().push(row.into_rule(vehicle_type)?);
        }

        Ok(grouped)
    }
}

#[async_trait]
impl FeeConfigProvider for SqliteFeeRepository {
    async fn list_valid_types(&self) -> Result<Vec<String>, LookupError> {
        sqlx::query_scalar::<_, String>("SELECT name FROM vehicle_types ORDER BY name")
            .fetch_all(&self.db_pool)
            .await
            .map_err(|e| unavailable("Failed to load vehicle types", e))
    }

    async fn lookup_rule(
        &self,
        vehicle_type: &str,
        fee: FeeName,
        price: Option<Money>,
    ) -> Result<Option<FeeRule>, LookupError> {
        if fee.is_tiered() && price.is_none() {
            return Ok(None);
        }

        let instances = self.fetch_instances(vehicle_type, fee).await?;
        Ok(select_rule(vehicle_type, fee, &instances, price))
    }
}
