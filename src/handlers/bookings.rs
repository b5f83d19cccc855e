use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::error::AppResult;
use crate::extract::{AppJson, AppPath};
use crate::services::booking::{
    self as lifecycle, BookingChanges, BookingDetail, BookingWithVehicle, NewBooking,
};
use crate::services::Caller;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pickup_location: String,
    pub dropoff_location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingRequest {
    pub status: Option<BookingStatus>,
    pub notes: Option<String>,
}

/// List the caller's bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BookingWithVehicle>>> {
    let caller = Caller::from(&claims);
    let bookings = lifecycle::list_for_caller(&state.db, &caller).await?;
    Ok(Json(bookings))
}

/// Create a booking
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<booking::Model>)> {
    let caller = Caller::from(&claims);

    let booking = lifecycle::create(
        &state.db,
        &caller,
        NewBooking {
            vehicle_id: payload.vehicle_id,
            start_date: payload.start_date,
            end_date: payload.end_date,
            pickup_location: payload.pickup_location,
            dropoff_location: payload.dropoff_location,
            notes: payload.notes,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// Get a booking (owner or admin)
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(booking_id): AppPath<Uuid>,
) -> AppResult<Json<BookingDetail>> {
    let caller = Caller::from(&claims);
    let booking = lifecycle::get(&state.db, &caller, booking_id).await?;
    Ok(Json(booking))
}

/// Update status and/or notes (owner or admin)
pub async fn update_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(booking_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateBookingRequest>,
) -> AppResult<Json<booking::Model>> {
    let caller = Caller::from(&claims);

    let booking = lifecycle::update(
        &state.db,
        &caller,
        booking_id,
        BookingChanges {
            status: payload.status,
            notes: payload.notes,
        },
    )
    .await?;

    Ok(Json(booking))
}

/// Cancel a booking (soft delete)
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(booking_id): AppPath<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let caller = Caller::from(&claims);
    let booking = lifecycle::cancel(&state.db, &caller, booking_id).await?;

    Ok(Json(serde_json::json!({
        "message": "Booking cancelled successfully",
        "booking": booking,
    })))
}
