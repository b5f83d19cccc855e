use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vehicle::Table)
                    .if_not_exists()
                    .col(uuid(Vehicle::Id).primary_key())
                    .col(string_len(Vehicle::Name, 150).not_null())
                    .col(string_len(Vehicle::Brand, 100).not_null())
                    .col(string_len(Vehicle::Model, 100).not_null())
                    .col(integer(Vehicle::Year).not_null())
                    .col(string_len(Vehicle::VehicleType, 16).not_null())
                    .col(text_null(Vehicle::Description))
                    .col(json_null(Vehicle::Features))
                    .col(decimal_len(Vehicle::PricePerDay, 10, 2).not_null())
                    .col(integer(Vehicle::Seats).not_null())
                    .col(string_len(Vehicle::Transmission, 32).not_null())
                    .col(string_len(Vehicle::FuelType, 32).not_null())
                    .col(json_null(Vehicle::Images))
                    .col(string_null(Vehicle::Thumbnail))
                    .col(string_len_null(Vehicle::RegistrationNo, 32))
                    .col(integer_null(Vehicle::Mileage))
                    .col(
                        string_len(Vehicle::Status, 16)
                            .not_null()
                            .default("AVAILABLE"),
                    )
                    .col(
                        timestamp_with_time_zone(Vehicle::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Vehicle::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vehicle_type_status")
                    .table(Vehicle::Table)
                    .col(Vehicle::VehicleType)
                    .col(Vehicle::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vehicle::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Vehicle {
    Table,
    Id,
    Name,
    Brand,
    Model,
    Year,
    #[sea_orm(iden = "type")]
    VehicleType,
    Description,
    Features,
    PricePerDay,
    Seats,
    Transmission,
    FuelType,
    Images,
    Thumbnail,
    RegistrationNo,
    Mileage,
    Status,
    CreatedAt,
    UpdatedAt,
}
