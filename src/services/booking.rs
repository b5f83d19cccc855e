//! Booking lifecycle: creation, status transitions and cancellation.
//!
//! Every state-changing operation runs in one transaction, so the booking row
//! and the vehicle's cached status are written together or not at all.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    prelude::DateTimeWithTimeZone,
    sea_query::Expr,
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::user;
use crate::entities::vehicle::{self, VehicleStatus};
use crate::error::{AppError, AppResult};
use crate::services::{availability, Caller};
use crate::utils::pricing::calculate_rental_price;
use crate::utils::validation::require_non_empty;

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub pickup_location: String,
    pub dropoff_location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingChanges {
    pub status: Option<BookingStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithVehicle {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub vehicle: Option<vehicle::Model>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingOwner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub vehicle: Option<vehicle::Model>,
    pub user: Option<BookingOwner>,
}

impl From<user::Model> for BookingOwner {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
        }
    }
}

fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

/// Create a pending booking and mark the vehicle rented.
///
/// The vehicle row is locked before the availability check so that two
/// concurrent requests for the same vehicle cannot both pass it.
pub async fn create(
    db: &DatabaseConnection,
    caller: &Caller,
    input: NewBooking,
) -> AppResult<booking::Model> {
    if input.end_date < input.start_date {
        return Err(AppError::InvalidRange);
    }
    require_non_empty("pickupLocation", &input.pickup_location)?;

    let txn = db.begin().await?;

    let vehicle = vehicle::Entity::find_by_id(input.vehicle_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    // Overlap is reported ahead of the cached status: a request colliding with
    // an existing hold is a date conflict even though the vehicle reads RENTED.
    if availability::has_conflict(&txn, vehicle.id, input.start_date, input.end_date).await? {
        tracing::debug!(
            vehicle_id = %vehicle.id,
            start = %input.start_date,
            end = %input.end_date,
            "Booking rejected, dates overlap an active booking"
        );
        return Err(AppError::DateConflict);
    }

    if vehicle.status != VehicleStatus::Available {
        return Err(AppError::VehicleUnavailable);
    }

    let quote = calculate_rental_price(vehicle.price_per_day, input.start_date, input.end_date)?;
    let total_days = i32::try_from(quote.days)
        .map_err(|_| AppError::BadRequest("Rental period is too long".to_string()))?;

    let timestamp = now();
    let new_booking = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(caller.user_id),
        vehicle_id: Set(vehicle.id),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        total_days: Set(total_days),
        total_price: Set(quote.total),
        pickup_location: Set(input.pickup_location),
        dropoff_location: Set(input.dropoff_location),
        notes: Set(input.notes),
        status: Set(BookingStatus::Pending),
        created_at: Set(timestamp),
        updated_at: Set(timestamp),
    };
    let booking = new_booking.insert(&txn).await?;

    let vehicle_id = vehicle.id;
    let mut vehicle: vehicle::ActiveModel = vehicle.into();
    vehicle.status = Set(VehicleStatus::Rented);
    vehicle.updated_at = Set(timestamp);
    vehicle.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        booking_id = %booking.id,
        vehicle_id = %vehicle_id,
        user_id = %caller.user_id,
        days = booking.total_days,
        "Booking created"
    );

    Ok(booking)
}

/// Apply a status and/or notes change. Moving an active booking into a
/// terminal state releases the vehicle.
pub async fn update(
    db: &DatabaseConnection,
    caller: &Caller,
    booking_id: Uuid,
    changes: BookingChanges,
) -> AppResult<booking::Model> {
    let txn = db.begin().await?;

    let existing = find_authorized(&txn, caller, booking_id).await?;
    let previous = existing.status;

    let mut active: booking::ActiveModel = existing.into();

    if let Some(next) = changes.status {
        if !previous.can_transition_to(next) {
            return Err(AppError::InvalidTransition(format!(
                "Cannot change booking status from {} to {}",
                previous, next
            )));
        }
        active.status = Set(next);
    }

    if let Some(notes) = changes.notes {
        active.notes = Set(Some(notes));
    }

    let timestamp = now();
    active.updated_at = Set(timestamp);
    let updated = active.update(&txn).await?;

    if previous.is_active() && updated.status.is_terminal() {
        release_vehicle(&txn, updated.vehicle_id, updated.id, timestamp).await?;
    }

    txn.commit().await?;

    tracing::info!(
        booking_id = %updated.id,
        from = %previous,
        to = %updated.status,
        "Booking updated"
    );

    Ok(updated)
}

/// Soft-cancel a booking. Cancelling twice is harmless; the vehicle release is
/// issued every time.
pub async fn cancel(
    db: &DatabaseConnection,
    caller: &Caller,
    booking_id: Uuid,
) -> AppResult<booking::Model> {
    let txn = db.begin().await?;

    let existing = find_authorized(&txn, caller, booking_id).await?;
    let timestamp = now();
    let status = existing.status;

    let cancelled = match status {
        BookingStatus::Completed => {
            return Err(AppError::InvalidTransition(
                "Completed bookings cannot be cancelled".to_string(),
            ));
        }
        BookingStatus::Cancelled => existing,
        _ => {
            let mut active: booking::ActiveModel = existing.into();
            active.status = Set(BookingStatus::Cancelled);
            active.updated_at = Set(timestamp);
            active.update(&txn).await?
        }
    };

    release_vehicle(&txn, cancelled.vehicle_id, cancelled.id, timestamp).await?;

    txn.commit().await?;

    tracing::info!(booking_id = %cancelled.id, "Booking cancelled");

    Ok(cancelled)
}

/// Fetch one booking with its vehicle and owner, for the owner or an admin
pub async fn get(
    db: &DatabaseConnection,
    caller: &Caller,
    booking_id: Uuid,
) -> AppResult<BookingDetail> {
    let booking = find_authorized(db, caller, booking_id).await?;

    let vehicle = vehicle::Entity::find_by_id(booking.vehicle_id).one(db).await?;
    let owner = user::Entity::find_by_id(booking.user_id).one(db).await?;

    Ok(BookingDetail {
        booking,
        vehicle,
        user: owner.map(BookingOwner::from),
    })
}

/// The caller's own bookings, newest first. Admins get only their own here too.
pub async fn list_for_caller(
    db: &DatabaseConnection,
    caller: &Caller,
) -> AppResult<Vec<BookingWithVehicle>> {
    let rows = booking::Entity::find()
        .filter(booking::Column::UserId.eq(caller.user_id))
        .order_by_desc(booking::Column::CreatedAt)
        .find_also_related(vehicle::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(booking, vehicle)| BookingWithVehicle { booking, vehicle })
        .collect())
}

async fn find_authorized<C: ConnectionTrait>(
    db: &C,
    caller: &Caller,
    booking_id: Uuid,
) -> AppResult<booking::Model> {
    let booking = booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if !caller.can_access(booking.user_id) {
        return Err(AppError::Forbidden(
            "You can only access your own bookings".to_string(),
        ));
    }

    Ok(booking)
}

/// Mark the vehicle available again unless another active booking holds it
async fn release_vehicle<C: ConnectionTrait>(
    db: &C,
    vehicle_id: Uuid,
    released_by: Uuid,
    timestamp: DateTimeWithTimeZone,
) -> AppResult<()> {
    if availability::is_held_by_other(db, vehicle_id, released_by).await? {
        tracing::warn!(
            vehicle_id = %vehicle_id,
            "Vehicle still held by another active booking, keeping status"
        );
        return Ok(());
    }

    vehicle::Entity::update_many()
        .col_expr(vehicle::Column::Status, Expr::value(VehicleStatus::Available))
        .col_expr(vehicle::Column::UpdatedAt, Expr::value(timestamp))
        .filter(vehicle::Column::Id.eq(vehicle_id))
        .exec(db)
        .await?;

    tracing::info!(vehicle_id = %vehicle_id, "Vehicle released");

    Ok(())
}
