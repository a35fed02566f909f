use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::str::FromStr;

use super::AppState;
use crate::error::AppError;
use crate::fees::{CalculationResult, Money};

/// Body of POST /api/calculate. Absent and `null` fields take their defaults.
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub price: Option<PriceInput>,
    #[serde(rename = "type", default)]
    pub vehicle_type: Option<String>,
}

impl CalculateRequest {
    fn price(&self) -> Result<Money, AppError> {
        self.price
            .as_ref()
            .map_or(Ok(Money::ZERO), PriceInput::to_money)
    }

    fn vehicle_type(&self) -> &str {
        self.vehicle_type.as_deref().unwrap_or(DEFAULT_VEHICLE_TYPE)
    }
}

/// Prices arrive as JSON numbers, or as numeric strings from form-driven clients
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    fn to_money(&self) -> Result<Money, AppError> {
        match self {
            Self::Number(value) => Money::from_f64(*value).ok_or_else(|| {
                AppError::BadRequest(format!("price {} is out of range", value))
            }),
            Self::Text(value) => Money::from_str(value.trim()).map_err(|_| {
                AppError::BadRequest(format!("price '{}' is not a number", value))
            }),
        }
    }
}

const DEFAULT_VEHICLE_TYPE: &str = "common";

/// POST /api/calculate
pub async fn calculate(
    State(state): State<AppState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<CalculationResult>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let price = request.price()?;
    let vehicle_type = request.vehicle_type();

    let result = state
        .calculator
        .calculate(price, vehicle_type)
        .await
        .map_err(|e| {
            tracing::warn!(
                vehicle_type = %vehicle_type,
                price = %price,
                error = %e,
                "Calculation failed"
            );
            AppError::from(e)
        })?;

    tracing::info!(
        price = %price,
        vehicle_type = %result.vehicle_type,
        basic_buyer_fee = %result.fees.basic_buyer_fee,
        seller_special_fee = %result.fees.seller_special_fee,
        association_fee = %result.fees.association_fee,
        storage_fee = %result.fees.storage_fee,
        total = %result.total,
        "calculation"
    );

    Ok(Json(result))
}
