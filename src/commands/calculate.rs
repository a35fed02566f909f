use anyhow::{Context, Result};
use bid_calculator::{
    config::Config,
    db,
    fees::{
        BidCalculator, CalculationResult, FeeConfigProvider, FeeName, InMemoryFeeProvider, Money,
        SqliteFeeRepository,
    },
};
use colored::Colorize;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Execute the calculate command
///
/// Fees come from `catalog` when given, otherwise from the configured database.
pub async fn execute(
    cfg: &Config,
    price: &str,
    vehicle_type: &str,
    catalog: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let price = Money::from_str(price.trim())
        .with_context(|| format!("Invalid price '{}'", price))?;

    let result = match catalog {
        Some(path) => {
            let provider: Arc<dyn FeeConfigProvider> =
                Arc::new(InMemoryFeeProvider::from_toml_file(&path)?);
            BidCalculator::new(provider).calculate(price, vehicle_type).await?
        }
        None => {
            let pool = db::connect(&cfg.database).await?;
            let provider: Arc<dyn FeeConfigProvider> =
                Arc::new(SqliteFeeRepository::new(pool.clone()));
            let result = BidCalculator::new(provider).calculate(price, vehicle_type).await;
            pool.close().await;
            result?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render(&result));
    }

    Ok(())
}

fn render(result: &CalculationResult) -> String {
    let mut out = format!(
        "{} {} ({})\n",
        "Price:".bold(),
        result.price,
        result.vehicle_type.cyan()
    );
    for fee in FeeName::ALL {
        out.push_str(&format!("  {:<20} {:>12}\n", fee.as_str(), result.fees.get(fee)));
    }
    out.push_str(&format!("{} {}\n", "Total:".bold(), result.total.to_string().green()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bid_calculator::fees::FeeBreakdown;
    use rust_decimal_macros::dec;

    #[test]
    fn test_render_lists_fees_in_order() {
        colored::control::set_override(false);
        let result = CalculationResult::new(
            dec!(501),
            "common".to_string(),
            FeeBreakdown {
                basic_buyer_fee: dec!(50),
                seller_special_fee: dec!(10.02),
                association_fee: dec!(10),
                storage_fee: dec!(100),
            },
        )
        .unwrap()
        .rounded();

        let text = render(&result);
        let basic = text.find("basic_buyer_fee").unwrap();
        let storage = text.find("storage_fee").unwrap();
        assert!(basic < storage);
        assert!(text.contains("10.02"));
        assert!(text.contains("Total: 671.02"));
    }
}
