use sea_orm::{DatabaseConnection, EntityTrait, QuerySelect, TransactionTrait};
use uuid::Uuid;

use crate::entities::vehicle;
use crate::error::{AppError, AppResult};
use crate::services::availability;

/// Delete a vehicle that no active booking holds.
///
/// Takes the same row lock as booking creation, so a booking cannot slip in
/// between the check and the delete and be cascaded away with the vehicle.
pub async fn remove_vehicle(db: &DatabaseConnection, vehicle_id: Uuid) -> AppResult<()> {
    let txn = db.begin().await?;

    let vehicle = vehicle::Entity::find_by_id(vehicle_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let active = availability::active_bookings(&txn, vehicle.id).await?;
    if !active.is_empty() {
        tracing::debug!(
            vehicle_id = %vehicle.id,
            active = active.len(),
            "Vehicle deletion refused"
        );
        return Err(AppError::Conflict(
            "Vehicle has active bookings and cannot be deleted".to_string(),
        ));
    }

    vehicle::Entity::delete_by_id(vehicle.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(vehicle_id = %vehicle_id, "Vehicle deleted");

    Ok(())
}
