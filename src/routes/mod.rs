use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{admin, auth, bookings, vehicles};
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::user_rate_limit::create_user_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // IP-based limiter for anonymous traffic, user-based for authenticated traffic
    let public_governor = create_public_governor();
    let user_governor = create_user_governor();

    // Public routes
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    let profile_routes = Router::new()
        .route("/me", get(auth::me))
        .layer(user_governor.clone())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Vehicle browsing is public, mutations are admin only
    let vehicle_browse_routes = Router::new()
        .route("/", get(vehicles::list_vehicles))
        .route("/{id}", get(vehicles::get_vehicle))
        .layer(public_governor);

    let vehicle_admin_routes = Router::new()
        .route("/", post(vehicles::create_vehicle))
        .route(
            "/{id}",
            put(vehicles::update_vehicle).delete(vehicles::delete_vehicle),
        )
        .layer(user_governor.clone())
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Booking routes (any authenticated user; ownership is checked per booking)
    let booking_routes = Router::new()
        .route("/", get(bookings::my_bookings).post(bookings::create_booking))
        .route(
            "/{id}",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::cancel_booking),
        )
        .layer(user_governor.clone())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin panel (requires auth + admin role)
    let admin_routes = Router::new()
        .route("/stats", get(admin::stats))
        .route("/users", get(admin::list_all_users))
        .route("/users/{id}/role", put(admin::update_user_role))
        .route("/bookings", get(admin::list_all_bookings))
        .layer(user_governor)
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes.merge(profile_routes))
        .nest("/api/vehicles", vehicle_browse_routes.merge(vehicle_admin_routes))
        .nest("/api/bookings", booking_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
}
