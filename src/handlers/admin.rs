use axum::{
    extract::State,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::user::{self, UserRole};
use crate::entities::vehicle::{self, VehicleStatus};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::utils::jwt::Claims;
use crate::AppState;

// ============ Dashboard ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_revenue: Decimal,
    pub active_bookings: u64,
    pub total_vehicles: u64,
    pub available_vehicles: u64,
    pub total_users: u64,
}

/// Headline numbers for the admin dashboard
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    // Revenue only counts bookings that were confirmed or ran to completion
    let total_revenue: Decimal = booking::Entity::find()
        .filter(booking::Column::Status.is_in([BookingStatus::Confirmed, BookingStatus::Completed]))
        .all(&state.db)
        .await?
        .iter()
        .map(|b| b.total_price)
        .sum();

    let active_bookings = booking::Entity::find()
        .filter(booking::Column::Status.is_in(BookingStatus::ACTIVE))
        .count(&state.db)
        .await?;

    let total_vehicles = vehicle::Entity::find().count(&state.db).await?;
    let available_vehicles = vehicle::Entity::find()
        .filter(vehicle::Column::Status.eq(VehicleStatus::Available))
        .count(&state.db)
        .await?;

    let total_users = user::Entity::find().count(&state.db).await?;

    Ok(Json(DashboardStats {
        total_revenue,
        active_bookings,
        total_vehicles,
        available_vehicles,
        total_users,
    }))
}

// ============ User Management ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            phone: u.phone,
            role: u.role,
            created_at: u.created_at.with_timezone(&Utc),
        }
    }
}

/// List all users (admin)
pub async fn list_all_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

/// Update user role (admin)
pub async fn update_user_role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    if user_id == claims.sub && payload.role != UserRole::Admin {
        return Err(AppError::BadRequest(
            "You cannot remove your own admin role".to_string(),
        ));
    }

    let user = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user.into();
    active.role = Set(payload.role);
    let updated = active.update(&state.db).await?;

    tracing::info!(user_id = %updated.id, role = ?updated.role, "User role changed");

    Ok(Json(updated.into()))
}

// ============ Bookings Management (Admin) ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBookingInfo {
    #[serde(flatten)]
    pub booking: booking::Model,
    pub vehicle_name: String,
    pub user_name: String,
    pub user_email: String,
}

/// List all bookings across users, newest first (admin)
pub async fn list_all_bookings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AdminBookingInfo>>> {
    let bookings = booking::Entity::find()
        .order_by_desc(booking::Column::CreatedAt)
        .find_also_related(vehicle::Entity)
        .all(&state.db)
        .await?;
    let users = user::Entity::find().all(&state.db).await?;

    let responses: Vec<AdminBookingInfo> = bookings
        .into_iter()
        .map(|(b, v)| {
            let user = users.iter().find(|u| u.id == b.user_id);
            AdminBookingInfo {
                vehicle_name: v.map(|v| v.name).unwrap_or_default(),
                user_name: user.map(|u| u.name.clone()).unwrap_or_default(),
                user_email: user.map(|u| u.email.clone()).unwrap_or_default(),
                booking: b,
            }
        })
        .collect();

    Ok(Json(responses))
}
