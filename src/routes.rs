// src/routes.rs

use axum::{
    Json, Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, listings, regions, users},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, landlord_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, listings, regions, users).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let listing_routes = Router::new()
        .route("/", get(listings::list_listings))
        .route("/{id}", get(listings::get_listing))
        // Creation requires landlord or admin; owner comes from the token.
        .merge(
            Router::new()
                .route("/", post(listings::create_listing))
                .layer(middleware::from_fn(landlord_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let region_routes = Router::new()
        .route("/", get(regions::list_regions))
        .route("/provinces", get(regions::list_provinces))
        .route("/townships/{province}", get(regions::townships_by_province))
        .merge(
            Router::new()
                .route("/", post(regions::create_region))
                .layer(middleware::from_fn(admin_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let user_routes = Router::new()
        .route(
            "/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route(
            "/save-listing/{listing_id}",
            post(users::toggle_saved_listing),
        )
        .merge(
            Router::new()
                .route("/my-listings", get(users::my_listings))
                .layer(middleware::from_fn(landlord_middleware)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/listings", listing_routes)
        .nest("/api/regions", region_routes)
        .nest("/api/users", user_routes)
        .route("/api/health", get(health_check))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK", "message": "Rentals API is running" }))
}
