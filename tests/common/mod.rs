#![allow(dead_code)]

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    prelude::DateTimeWithTimeZone, ActiveModelTrait, ConnectOptions, Database, DatabaseConnection,
    EntityTrait, Set,
};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use rentride_backend::entities::user::{self, UserRole};
use rentride_backend::entities::vehicle::{self, VehicleStatus, VehicleType};
use rentride_backend::services::booking::NewBooking;
use rentride_backend::services::Caller;
use rentride_backend::{AppState, Config};

pub const JWT_SECRET: &str = "test-secret";

/// Fresh in-memory SQLite database with the real schema applied.
/// One connection only, otherwise every pooled connection sees its own database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open sqlite database");

    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// File-backed database shared by a multi-connection pool, for tests that
/// need transactions to run side by side.
pub async fn setup_file_db(dir: &Path) -> DatabaseConnection {
    let url = format!("sqlite://{}?mode=rwc", dir.join("rentride.db").display());
    let mut options = ConnectOptions::new(url);
    options.max_connections(4).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open sqlite database");

    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration_hours: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        admin_email: "admin@rentride.test".to_string(),
        admin_password: "admin123".to_string(),
    }
}

pub async fn setup_state() -> AppState {
    AppState {
        db: setup_db().await,
        config: test_config(),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub async fn insert_user(db: &DatabaseConnection, role: UserRole, password_hash: &str) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@rentride.test", Uuid::new_v4().simple())),
        password_hash: Set(password_hash.to_string()),
        name: Set("Test User".to_string()),
        phone: Set(None),
        role: Set(role),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

pub async fn insert_caller(db: &DatabaseConnection, role: UserRole) -> Caller {
    let user = insert_user(db, role, "unused").await;
    Caller::new(user.id, user.role)
}

pub async fn insert_vehicle(
    db: &DatabaseConnection,
    vehicle_type: VehicleType,
    price_per_day: i64,
) -> vehicle::Model {
    let now: DateTimeWithTimeZone = Utc::now().into();
    vehicle::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Test Vehicle".to_string()),
        brand: Set("Toyota".to_string()),
        model: Set("Corolla".to_string()),
        year: Set(2023),
        vehicle_type: Set(vehicle_type),
        description: Set(None),
        features: Set(None),
        price_per_day: Set(Decimal::from(price_per_day)),
        seats: Set(5),
        transmission: Set("Automatic".to_string()),
        fuel_type: Set("Petrol".to_string()),
        images: Set(None),
        thumbnail: Set(None),
        registration_no: Set(None),
        mileage: Set(None),
        status: Set(VehicleStatus::Available),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert vehicle")
}

pub fn new_booking(vehicle_id: Uuid, start: NaiveDate, end: NaiveDate) -> NewBooking {
    NewBooking {
        vehicle_id,
        start_date: start,
        end_date: end,
        pickup_location: "Downtown office".to_string(),
        dropoff_location: None,
        notes: None,
    }
}

pub async fn vehicle_status(db: &DatabaseConnection, id: Uuid) -> VehicleStatus {
    vehicle::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("Failed to load vehicle")
        .expect("Vehicle missing")
        .status
}

/// Overwrite the cached status the way an admin edit would
pub async fn set_vehicle_status(db: &DatabaseConnection, id: Uuid, status: VehicleStatus) {
    let vehicle = vehicle::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("Failed to load vehicle")
        .expect("Vehicle missing");

    let mut active: vehicle::ActiveModel = vehicle.into();
    active.status = Set(status);
    active.update(db).await.expect("Failed to update vehicle");
}
