use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{prelude::DateTimeWithTimeZone, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::BookingStatus;
use crate::entities::vehicle::{self, VehicleStatus, VehicleType};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::services::{availability, fleet};
use crate::utils::validation::require_non_empty;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFilter {
    #[serde(rename = "type")]
    pub vehicle_type: Option<VehicleType>,
    pub status: Option<VehicleStatus>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetail {
    #[serde(flatten)]
    pub vehicle: vehicle::Model,
    pub bookings: Vec<BookedWindow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub name: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub price_per_day: Decimal,
    pub seats: i32,
    pub transmission: String,
    pub fuel_type: String,
    pub images: Option<Vec<String>>,
    pub thumbnail: Option<String>,
    pub registration_no: Option<String>,
    pub mileage: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<VehicleType>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub price_per_day: Option<Decimal>,
    pub seats: Option<i32>,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
    pub images: Option<Vec<String>>,
    pub thumbnail: Option<String>,
    pub registration_no: Option<String>,
    pub mileage: Option<i32>,
    pub status: Option<VehicleStatus>,
}

fn validate_price(price: Decimal) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::BadRequest("Price per day must be positive".to_string()));
    }
    Ok(())
}

fn validate_seats(seats: i32) -> AppResult<()> {
    if seats <= 0 {
        return Err(AppError::BadRequest("Vehicle must have at least 1 seat".to_string()));
    }
    Ok(())
}

fn string_list(values: Vec<String>) -> serde_json::Value {
    serde_json::Value::from(values)
}

/// List vehicles, optionally filtered by type, status and price range
pub async fn list_vehicles(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<VehicleFilter>,
) -> AppResult<Json<Vec<vehicle::Model>>> {
    let mut query = vehicle::Entity::find();

    if let Some(vehicle_type) = filter.vehicle_type {
        query = query.filter(vehicle::Column::VehicleType.eq(vehicle_type));
    }
    if let Some(status) = filter.status {
        query = query.filter(vehicle::Column::Status.eq(status));
    }
    if let Some(min) = filter.min_price {
        query = query.filter(vehicle::Column::PricePerDay.gte(min));
    }
    if let Some(max) = filter.max_price {
        query = query.filter(vehicle::Column::PricePerDay.lte(max));
    }

    let vehicles = query
        .order_by_desc(vehicle::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(vehicles))
}

/// Vehicle details with the date windows held by active bookings
pub async fn get_vehicle(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<VehicleDetail>> {
    let vehicle = vehicle::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let bookings = availability::active_bookings(&state.db, vehicle.id)
        .await?
        .into_iter()
        .map(|b| BookedWindow {
            start_date: b.start_date,
            end_date: b.end_date,
            status: b.status,
        })
        .collect();

    Ok(Json(VehicleDetail { vehicle, bookings }))
}

/// Create a vehicle (admin). New vehicles always start out available.
pub async fn create_vehicle(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateVehicleRequest>,
) -> AppResult<(StatusCode, Json<vehicle::Model>)> {
    require_non_empty("name", &payload.name)?;
    require_non_empty("brand", &payload.brand)?;
    require_non_empty("model", &payload.model)?;
    require_non_empty("transmission", &payload.transmission)?;
    require_non_empty("fuelType", &payload.fuel_type)?;
    validate_price(payload.price_per_day)?;
    validate_seats(payload.seats)?;

    let now: DateTimeWithTimeZone = Utc::now().into();
    let vehicle = vehicle::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        brand: Set(payload.brand),
        model: Set(payload.model),
        year: Set(payload.year),
        vehicle_type: Set(payload.vehicle_type),
        description: Set(payload.description),
        features: Set(payload.features.map(string_list)),
        price_per_day: Set(payload.price_per_day),
        seats: Set(payload.seats),
        transmission: Set(payload.transmission),
        fuel_type: Set(payload.fuel_type),
        images: Set(payload.images.map(string_list)),
        thumbnail: Set(payload.thumbnail),
        registration_no: Set(payload.registration_no),
        mileage: Set(payload.mileage),
        status: Set(VehicleStatus::Available),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let result = vehicle.insert(&state.db).await?;
    tracing::info!(vehicle_id = %result.id, "Vehicle created");

    Ok((StatusCode::CREATED, Json(result)))
}

/// Partially update a vehicle (admin)
pub async fn update_vehicle(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateVehicleRequest>,
) -> AppResult<Json<vehicle::Model>> {
    let vehicle = vehicle::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let mut active: vehicle::ActiveModel = vehicle.into();

    if let Some(name) = payload.name {
        require_non_empty("name", &name)?;
        active.name = Set(name);
    }
    if let Some(brand) = payload.brand {
        require_non_empty("brand", &brand)?;
        active.brand = Set(brand);
    }
    if let Some(model) = payload.model {
        require_non_empty("model", &model)?;
        active.model = Set(model);
    }
    if let Some(year) = payload.year {
        active.year = Set(year);
    }
    if let Some(vehicle_type) = payload.vehicle_type {
        active.vehicle_type = Set(vehicle_type);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(features) = payload.features {
        active.features = Set(Some(string_list(features)));
    }
    if let Some(price) = payload.price_per_day {
        validate_price(price)?;
        active.price_per_day = Set(price);
    }
    if let Some(seats) = payload.seats {
        validate_seats(seats)?;
        active.seats = Set(seats);
    }
    if let Some(transmission) = payload.transmission {
        active.transmission = Set(transmission);
    }
    if let Some(fuel_type) = payload.fuel_type {
        active.fuel_type = Set(fuel_type);
    }
    if let Some(images) = payload.images {
        active.images = Set(Some(string_list(images)));
    }
    if let Some(thumbnail) = payload.thumbnail {
        active.thumbnail = Set(Some(thumbnail));
    }
    if let Some(registration_no) = payload.registration_no {
        active.registration_no = Set(Some(registration_no));
    }
    if let Some(mileage) = payload.mileage {
        active.mileage = Set(Some(mileage));
    }
    if let Some(status) = payload.status {
        tracing::info!(vehicle_id = %id, status = ?status, "Vehicle status set by admin");
        active.status = Set(status);
    }

    active.updated_at = Set(Utc::now().into());

    let result = active.update(&state.db).await?;
    Ok(Json(result))
}

/// Delete a vehicle (admin). Refused while active bookings hold it.
pub async fn delete_vehicle(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    fleet::remove_vehicle(&state.db, id).await?;

    Ok(Json(serde_json::json!({ "message": "Vehicle deleted successfully" })))
}
