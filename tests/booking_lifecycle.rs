mod common;

use rust_decimal::Decimal;
use sea_orm::{EntityTrait, PaginatorTrait};

use rentride_backend::entities::booking::{self, BookingStatus};
use rentride_backend::entities::user::UserRole;
use rentride_backend::entities::vehicle::{VehicleStatus, VehicleType};
use rentride_backend::error::AppError;
use rentride_backend::services::booking::{self as lifecycle, BookingChanges};
use rentride_backend::services::{availability, fleet};

use common::*;

#[tokio::test]
async fn test_rental_scenario() {
    let db = setup_db().await;
    let alice = insert_caller(&db, UserRole::User).await;
    let bob = insert_caller(&db, UserRole::User).await;
    let car = insert_vehicle(&db, VehicleType::Car, 100).await;

    // June 1-4 at 100/day
    let first = lifecycle::create(&db, &alice, new_booking(car.id, date(2025, 6, 1), date(2025, 6, 4)))
        .await
        .unwrap();

    assert_eq!(first.status, BookingStatus::Pending);
    assert_eq!(first.total_days, 3);
    assert_eq!(first.total_price, Decimal::from(310));
    assert_eq!(first.user_id, alice.user_id);
    assert_eq!(vehicle_status(&db, car.id).await, VehicleStatus::Rented);

    // June 3-5 overlaps on the 3rd and 4th
    let second = lifecycle::create(&db, &bob, new_booking(car.id, date(2025, 6, 3), date(2025, 6, 5))).await;
    assert!(matches!(second, Err(AppError::DateConflict)));

    lifecycle::cancel(&db, &alice, first.id).await.unwrap();
    assert_eq!(vehicle_status(&db, car.id).await, VehicleStatus::Available);

    let retry = lifecycle::create(&db, &bob, new_booking(car.id, date(2025, 6, 3), date(2025, 6, 5)))
        .await
        .unwrap();
    assert_eq!(retry.status, BookingStatus::Pending);
    assert_eq!(retry.total_days, 2);
    assert_eq!(vehicle_status(&db, car.id).await, VehicleStatus::Rented);
}

#[tokio::test]
async fn test_failed_create_leaves_no_partial_state() {
    let db = setup_db().await;
    let user = insert_caller(&db, UserRole::User).await;
    let van = insert_vehicle(&db, VehicleType::Van, 80).await;

    lifecycle::create(&db, &user, new_booking(van.id, date(2025, 7, 1), date(2025, 7, 3)))
        .await
        .unwrap();

    let result = lifecycle::create(&db, &user, new_booking(van.id, date(2025, 7, 2), date(2025, 7, 2))).await;
    assert!(matches!(result, Err(AppError::DateConflict)));

    assert_eq!(booking::Entity::find().count(&db).await.unwrap(), 1);
    assert_eq!(vehicle_status(&db, van.id).await, VehicleStatus::Rented);
}

#[tokio::test]
async fn test_create_preconditions() {
    let db = setup_db().await;
    let user = insert_caller(&db, UserRole::User).await;
    let truck = insert_vehicle(&db, VehicleType::Truck, 150).await;

    let missing = lifecycle::create(
        &db,
        &user,
        new_booking(uuid::Uuid::new_v4(), date(2025, 6, 1), date(2025, 6, 2)),
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let backwards = lifecycle::create(&db, &user, new_booking(truck.id, date(2025, 6, 5), date(2025, 6, 1))).await;
    assert!(matches!(backwards, Err(AppError::InvalidRange)));

    let mut no_pickup = new_booking(truck.id, date(2025, 6, 1), date(2025, 6, 2));
    no_pickup.pickup_location = "  ".to_string();
    let result = lifecycle::create(&db, &user, no_pickup).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    set_vehicle_status(&db, truck.id, VehicleStatus::Maintenance).await;
    let in_maintenance = lifecycle::create(&db, &user, new_booking(truck.id, date(2025, 6, 1), date(2025, 6, 2))).await;
    assert!(matches!(in_maintenance, Err(AppError::VehicleUnavailable)));

    assert_eq!(booking::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_rented_vehicle_rejects_non_overlapping_request() {
    let db = setup_db().await;
    let user = insert_caller(&db, UserRole::User).await;
    let bike = insert_vehicle(&db, VehicleType::Bike, 15).await;

    lifecycle::create(&db, &user, new_booking(bike.id, date(2025, 6, 1), date(2025, 6, 2)))
        .await
        .unwrap();

    let later = lifecycle::create(&db, &user, new_booking(bike.id, date(2025, 8, 1), date(2025, 8, 2))).await;
    assert!(matches!(later, Err(AppError::VehicleUnavailable)));
}

#[tokio::test]
async fn test_same_day_rental_is_one_day() {
    let db = setup_db().await;
    let user = insert_caller(&db, UserRole::User).await;
    let scooter = insert_vehicle(&db, VehicleType::Scooter, 25).await;

    let booking = lifecycle::create(&db, &user, new_booking(scooter.id, date(2025, 6, 1), date(2025, 6, 1)))
        .await
        .unwrap();

    assert_eq!(booking.total_days, 1);
    assert_eq!(booking.total_price, Decimal::from(35));
}

#[tokio::test]
async fn test_touching_ranges_conflict_and_release_respects_other_holds() {
    let db = setup_db().await;
    let user = insert_caller(&db, UserRole::User).await;
    let car = insert_vehicle(&db, VehicleType::Car, 60).await;

    let first = lifecycle::create(&db, &user, new_booking(car.id, date(2025, 6, 1), date(2025, 6, 4)))
        .await
        .unwrap();

    // An admin puts the car back on the market while the first booking is active
    set_vehicle_status(&db, car.id, VehicleStatus::Available).await;

    let touching = lifecycle::create(&db, &user, new_booking(car.id, date(2025, 6, 4), date(2025, 6, 6))).await;
    assert!(matches!(touching, Err(AppError::DateConflict)));

    let second = lifecycle::create(&db, &user, new_booking(car.id, date(2025, 6, 5), date(2025, 6, 7)))
        .await
        .unwrap();

    // Active bookings on the vehicle stay pairwise disjoint
    let active = availability::active_bookings(&db, car.id).await.unwrap();
    assert_eq!(active.len(), 2);
    assert!(!rentride_backend::utils::dates::ranges_overlap(
        active[0].start_date,
        active[0].end_date,
        active[1].start_date,
        active[1].end_date,
    ));

    // Cancelling one of them leaves the vehicle held by the other
    lifecycle::cancel(&db, &user, first.id).await.unwrap();
    assert_eq!(vehicle_status(&db, car.id).await, VehicleStatus::Rented);

    lifecycle::cancel(&db, &user, second.id).await.unwrap();
    assert_eq!(vehicle_status(&db, car.id).await, VehicleStatus::Available);
}

#[tokio::test]
async fn test_overlap_with_finished_bookings_is_allowed() {
    let db = setup_db().await;
    let user = insert_caller(&db, UserRole::User).await;
    let admin = insert_caller(&db, UserRole::Admin).await;
    let car = insert_vehicle(&db, VehicleType::Car, 50).await;

    // Completed: pending -> confirmed -> completed
    let completed = lifecycle::create(&db, &user, new_booking(car.id, date(2025, 6, 1), date(2025, 6, 5)))
        .await
        .unwrap();
    for status in [BookingStatus::Confirmed, BookingStatus::Completed] {
        lifecycle::update(
            &db,
            &admin,
            completed.id,
            BookingChanges {
                status: Some(status),
                notes: None,
            },
        )
        .await
        .unwrap();
    }
    assert_eq!(vehicle_status(&db, car.id).await, VehicleStatus::Available);

    // Cancelled
    let cancelled = lifecycle::create(&db, &user, new_booking(car.id, date(2025, 6, 2), date(2025, 6, 3)))
        .await
        .unwrap();
    lifecycle::cancel(&db, &user, cancelled.id).await.unwrap();

    let booking = lifecycle::create(&db, &user, new_booking(car.id, date(2025, 6, 1), date(2025, 6, 5)))
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_cancel_is_soft_and_idempotent() {
    let db = setup_db().await;
    let user = insert_caller(&db, UserRole::User).await;
    let car = insert_vehicle(&db, VehicleType::Car, 100).await;

    let booking = lifecycle::create(&db, &user, new_booking(car.id, date(2025, 9, 1), date(2025, 9, 3)))
        .await
        .unwrap();

    let once = lifecycle::cancel(&db, &user, booking.id).await.unwrap();
    let twice = lifecycle::cancel(&db, &user, booking.id).await.unwrap();

    assert_eq!(once.status, BookingStatus::Cancelled);
    assert_eq!(twice.status, BookingStatus::Cancelled);
    assert_eq!(vehicle_status(&db, car.id).await, VehicleStatus::Available);

    let stored = booking::Entity::find_by_id(booking.id).one(&db).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_confirmed_booking_can_be_cancelled() {
    let db = setup_db().await;
    let user = insert_caller(&db, UserRole::User).await;
    let car = insert_vehicle(&db, VehicleType::Car, 100).await;

    let booking = lifecycle::create(&db, &user, new_booking(car.id, date(2025, 9, 1), date(2025, 9, 3)))
        .await
        .unwrap();
    lifecycle::update(
        &db,
        &user,
        booking.id,
        BookingChanges {
            status: Some(BookingStatus::Confirmed),
            notes: None,
        },
    )
    .await
    .unwrap();

    let cancelled = lifecycle::cancel(&db, &user, booking.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(vehicle_status(&db, car.id).await, VehicleStatus::Available);
}

#[tokio::test]
async fn test_update_notes_and_cancel_through_update() {
    let db = setup_db().await;
    let user = insert_caller(&db, UserRole::User).await;
    let car = insert_vehicle(&db, VehicleType::Car, 100).await;

    let booking = lifecycle::create(&db, &user, new_booking(car.id, date(2025, 10, 1), date(2025, 10, 2)))
        .await
        .unwrap();

    let noted = lifecycle::update(
        &db,
        &user,
        booking.id,
        BookingChanges {
            status: None,
            notes: Some("Child seat please".to_string()),
        },
    )
    .await
    .unwrap();
    assert_eq!(noted.notes.as_deref(), Some("Child seat please"));
    assert_eq!(noted.status, BookingStatus::Pending);
    assert_eq!(vehicle_status(&db, car.id).await, VehicleStatus::Rented);

    let cancelled = lifecycle::update(
        &db,
        &user,
        booking.id,
        BookingChanges {
            status: Some(BookingStatus::Cancelled),
            notes: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(vehicle_status(&db, car.id).await, VehicleStatus::Available);

    let reopened = lifecycle::update(
        &db,
        &user,
        booking.id,
        BookingChanges {
            status: Some(BookingStatus::Pending),
            notes: None,
        },
    )
    .await;
    assert!(matches!(reopened, Err(AppError::InvalidTransition(_))));
}

#[tokio::test]
async fn test_ownership_rules() {
    let db = setup_db().await;
    let owner = insert_caller(&db, UserRole::User).await;
    let stranger = insert_caller(&db, UserRole::User).await;
    let admin = insert_caller(&db, UserRole::Admin).await;
    let car = insert_vehicle(&db, VehicleType::Car, 100).await;

    let booking = lifecycle::create(&db, &owner, new_booking(car.id, date(2025, 11, 1), date(2025, 11, 4)))
        .await
        .unwrap();

    assert!(matches!(
        lifecycle::get(&db, &stranger, booking.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        lifecycle::update(&db, &stranger, booking.id, BookingChanges::default()).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        lifecycle::cancel(&db, &stranger, booking.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        lifecycle::get(&db, &owner, uuid::Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));

    // Nothing changed by the rejected calls
    assert_eq!(vehicle_status(&db, car.id).await, VehicleStatus::Rented);

    let detail = lifecycle::get(&db, &admin, booking.id).await.unwrap();
    assert_eq!(detail.booking.id, booking.id);
    assert_eq!(detail.vehicle.map(|v| v.id), Some(car.id));
    assert_eq!(detail.user.map(|u| u.id), Some(owner.user_id));
}

#[tokio::test]
async fn test_listing_is_per_caller() {
    let db = setup_db().await;
    let alice = insert_caller(&db, UserRole::User).await;
    let admin = insert_caller(&db, UserRole::Admin).await;
    let car = insert_vehicle(&db, VehicleType::Car, 100).await;
    let van = insert_vehicle(&db, VehicleType::Van, 120).await;

    lifecycle::create(&db, &alice, new_booking(car.id, date(2025, 6, 1), date(2025, 6, 2)))
        .await
        .unwrap();
    lifecycle::create(&db, &admin, new_booking(van.id, date(2025, 6, 1), date(2025, 6, 2)))
        .await
        .unwrap();

    let mine = lifecycle::list_for_caller(&db, &alice).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].booking.user_id, alice.user_id);
    assert_eq!(mine[0].vehicle.as_ref().map(|v| v.id), Some(car.id));

    // Admins only see their own bookings through this listing too
    let admins = lifecycle::list_for_caller(&db, &admin).await.unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].booking.vehicle_id, van.id);
}

#[tokio::test]
async fn test_vehicle_removal_guard() {
    let db = setup_db().await;
    let user = insert_caller(&db, UserRole::User).await;
    let car = insert_vehicle(&db, VehicleType::Car, 100).await;

    let booking = lifecycle::create(&db, &user, new_booking(car.id, date(2025, 6, 1), date(2025, 6, 2)))
        .await
        .unwrap();

    assert!(matches!(
        fleet::remove_vehicle(&db, car.id).await,
        Err(AppError::Conflict(_))
    ));
    assert!(booking::Entity::find_by_id(booking.id).one(&db).await.unwrap().is_some());

    lifecycle::cancel(&db, &user, booking.id).await.unwrap();
    fleet::remove_vehicle(&db, car.id).await.unwrap();

    assert!(matches!(
        fleet::remove_vehicle(&db, car.id).await,
        Err(AppError::NotFound(_))
    ));
}

// SQLite serializes writers, so a loser may surface as a busy-database error
// instead of a domain error. Either way only one booking may survive.
fn is_expected_rejection(err: &AppError) -> bool {
    matches!(
        err,
        AppError::DateConflict | AppError::VehicleUnavailable | AppError::NotFound(_) | AppError::Database(_)
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_creates_book_once() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = setup_file_db(dir.path()).await;
    let alice = insert_caller(&db, UserRole::User).await;
    let bob = insert_caller(&db, UserRole::User).await;

    for _ in 0..10 {
        let car = insert_vehicle(&db, VehicleType::Car, 100).await;

        let (first, second) = tokio::join!(
            lifecycle::create(&db, &alice, new_booking(car.id, date(2025, 6, 1), date(2025, 6, 4))),
            lifecycle::create(&db, &bob, new_booking(car.id, date(2025, 6, 3), date(2025, 6, 5))),
        );

        let outcomes = [first, second];
        let booked = outcomes.iter().filter(|r| r.is_ok()).count();
        assert!(booked <= 1, "both overlapping requests were booked");

        for err in outcomes.iter().filter_map(|r| r.as_ref().err()) {
            assert!(is_expected_rejection(err), "unexpected error: {:?}", err);
        }

        let active = availability::active_bookings(&db, car.id).await.unwrap();
        assert_eq!(active.len(), booked);

        let expected = if booked == 1 {
            VehicleStatus::Rented
        } else {
            VehicleStatus::Available
        };
        assert_eq!(vehicle_status(&db, car.id).await, expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_removal_racing_create_keeps_accepted_booking() {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = setup_file_db(dir.path()).await;
    let user = insert_caller(&db, UserRole::User).await;

    for _ in 0..10 {
        let car = insert_vehicle(&db, VehicleType::Van, 90).await;

        let (removed, created) = tokio::join!(
            fleet::remove_vehicle(&db, car.id),
            lifecycle::create(&db, &user, new_booking(car.id, date(2025, 7, 1), date(2025, 7, 3))),
        );

        assert!(
            !(removed.is_ok() && created.is_ok()),
            "vehicle removed while a booking for it was accepted"
        );

        match created {
            Ok(booking) => {
                let stored = booking::Entity::find_by_id(booking.id).one(&db).await.unwrap();
                assert!(stored.is_some(), "accepted booking disappeared");
            }
            Err(err) => assert!(is_expected_rejection(&err), "unexpected error: {:?}", err),
        }

        if let Err(err) = removed {
            assert!(
                matches!(err, AppError::Conflict(_) | AppError::Database(_)),
                "unexpected error: {:?}",
                err
            );
        }
    }
}
