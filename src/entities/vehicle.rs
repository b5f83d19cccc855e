use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum VehicleType {
    #[sea_orm(string_value = "CAR")]
    Car,
    #[sea_orm(string_value = "MOTORCYCLE")]
    Motorcycle,
    #[sea_orm(string_value = "BIKE")]
    Bike,
    #[sea_orm(string_value = "VAN")]
    Van,
    #[sea_orm(string_value = "TRUCK")]
    Truck,
    #[sea_orm(string_value = "SCOOTER")]
    Scooter,
}

/// Cached availability of a vehicle. `Rented` while an active booking holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum VehicleStatus {
    #[sea_orm(string_value = "AVAILABLE")]
    Available,
    #[sea_orm(string_value = "RENTED")]
    Rented,
    #[sea_orm(string_value = "MAINTENANCE")]
    Maintenance,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicle")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub description: Option<String>,
    pub features: Option<Json>,
    pub price_per_day: Decimal,
    pub seats: i32,
    pub transmission: String,
    pub fuel_type: String,
    pub images: Option<Json>,
    pub thumbnail: Option<String>,
    pub registration_no: Option<String>,
    pub mileage: Option<i32>,
    pub status: VehicleStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
