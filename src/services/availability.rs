use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::error::AppResult;
use crate::utils::dates::ranges_overlap;

/// Bookings that currently occupy the vehicle (pending or confirmed)
pub async fn active_bookings<C: ConnectionTrait>(
    db: &C,
    vehicle_id: Uuid,
) -> AppResult<Vec<booking::Model>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::VehicleId.eq(vehicle_id))
        .filter(booking::Column::Status.is_in(BookingStatus::ACTIVE))
        .all(db)
        .await?;

    Ok(bookings)
}

/// Whether `[start, end]` collides with an active booking on the vehicle.
/// Cancelled and completed bookings never conflict.
pub async fn has_conflict<C: ConnectionTrait>(
    db: &C,
    vehicle_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<bool> {
    let conflict = active_bookings(db, vehicle_id)
        .await?
        .iter()
        .any(|b| ranges_overlap(start, end, b.start_date, b.end_date));

    Ok(conflict)
}

/// Whether any active booking other than `booking_id` still holds the vehicle
pub async fn is_held_by_other<C: ConnectionTrait>(
    db: &C,
    vehicle_id: Uuid,
    booking_id: Uuid,
) -> AppResult<bool> {
    let held = active_bookings(db, vehicle_id)
        .await?
        .iter()
        .any(|b| b.id != booking_id);

    Ok(held)
}
