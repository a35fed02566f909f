use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

use super::AppState;
use crate::error::AppError;
use crate::fees::{FeeConfigProvider, FeeName, FeeRule};

/// Configured fee rules for one vehicle type
#[derive(Debug, Serialize)]
pub struct FeeScheduleResponse {
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub rules: BTreeMap<FeeName, Vec<FeeRule>>,
}

/// GET /api/fees/:type
pub async fn get_fee_schedule(
    State(state): State<AppState>,
    Path(vehicle_type): Path<String>,
) -> Result<Json<FeeScheduleResponse>, AppError> {
    let vehicle_type = vehicle_type.to_lowercase();

    let valid_types = state
        .fee_repository
        .list_valid_types()
        .await
        .map_err(|e| AppError::FeeLookup(e.to_string()))?;
    if !valid_types.contains(&vehicle_type) {
        return Err(AppError::NotFound(format!(
            "Unknown vehicle type: {}",
            vehicle_type
        )));
    }

    let rules = state
        .fee_repository
        .rules_by_type(&vehicle_type)
        .await
        .map_err(|e| AppError::FeeLookup(e.to_string()))?;

    Ok(Json(FeeScheduleResponse {
        vehicle_type,
        rules,
    }))
}
