use sea_orm_migration::{prelude::*, schema::*};

use super::m20250601_000001_create_users::User;
use super::m20250601_000002_create_vehicles::Vehicle;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(uuid(Booking::UserId).not_null())
                    .col(uuid(Booking::VehicleId).not_null())
                    .col(date(Booking::StartDate).not_null())
                    .col(date(Booking::EndDate).not_null())
                    .col(integer(Booking::TotalDays).not_null())
                    .col(decimal_len(Booking::TotalPrice, 12, 2).not_null())
                    .col(string(Booking::PickupLocation).not_null())
                    .col(string_null(Booking::DropoffLocation))
                    .col(text_null(Booking::Notes))
                    .col(
                        string_len(Booking::Status, 16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Booking::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_user")
                            .from(Booking::Table, Booking::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_vehicle")
                            .from(Booking::Table, Booking::VehicleId)
                            .to(Vehicle::Table, Vehicle::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Availability checks scan active bookings per vehicle
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_vehicle_status")
                    .table(Booking::Table)
                    .col(Booking::VehicleId)
                    .col(Booking::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_user")
                    .table(Booking::Table)
                    .col(Booking::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    UserId,
    VehicleId,
    StartDate,
    EndDate,
    TotalDays,
    TotalPrice,
    PickupLocation,
    DropoffLocation,
    Notes,
    Status,
    CreatedAt,
    UpdatedAt,
}
