use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use serde::Serialize;

use super::AppState;
use crate::error::AppError;
use crate::fees::{BidCalculator, CalculationError, CalculationResult, FeeConfigProvider};
use crate::vehicles::Vehicle;

/// A vehicle together with its fee breakdown
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub calculation: CalculationOutcome,
}

/// Per-vehicle calculation result. A vehicle whose type fails validation or
/// whose fees overflow is still listed, with the reason in place of the breakdown.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CalculationOutcome {
    Calculated(CalculationResult),
    Failed { error: String },
}

async fn annotate(
    calculator: &BidCalculator<dyn FeeConfigProvider>,
    vehicle: Vehicle,
) -> Result<VehicleResponse, AppError> {
    let calculation = match calculator.calculate(vehicle.price, &vehicle.vehicle_type).await {
        Ok(result) => CalculationOutcome::Calculated(result),
        Err(
            err @ (CalculationError::InvalidVehicleType { .. }
            | CalculationError::AmountOutOfRange { .. }),
        ) => {
            tracing::warn!(vehicle_id = vehicle.id, error = %err, "Vehicle cannot be priced");
            CalculationOutcome::Failed {
                error: err.to_string(),
            }
        }
        Err(err) => return Err(err.into()),
    };

    Ok(VehicleResponse {
        vehicle,
        calculation,
    })
}

/// GET /api/vehicles
pub async fn list_vehicles(
    State(state): State<AppState>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let vehicles = state.vehicles.list_all().await?;

    let mut response = Vec::with_capacity(vehicles.len());
    for vehicle in vehicles {
        response.push(annotate(&state.calculator, vehicle).await?);
    }

    Ok(Json(response))
}

/// GET /api/vehicles/:id
pub async fn get_vehicle(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<VehicleResponse>, AppError> {
    let not_found = || AppError::NotFound("Vehicle not found".to_string());

    let Path(id) = id.map_err(|_| not_found())?;
    let vehicle = state.vehicles.find_by_id(id).await?.ok_or_else(not_found)?;

    Ok(Json(annotate(&state.calculator, vehicle).await?))
}
