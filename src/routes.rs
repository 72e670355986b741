// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, patch, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, challenge, completion, leaderboard},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public routes: challenges, completions, leaderboard, admin login.
/// * Admin routes sit behind the bearer token check followed by the role check.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let challenge_routes = Router::new()
        .route(
            "/active",
            get(challenge::get_active)
                .post(challenge::assign)
                .delete(challenge::clear),
        )
        .route(
            "/complete",
            get(completion::history).post(completion::complete),
        );

    let admin_routes = Router::new()
        .route(
            "/students",
            get(admin::list_students).post(admin::create_student),
        )
        .route("/students/{id}", delete(admin::delete_student))
        .route("/users/{id}/visibility", patch(admin::update_visibility))
        .route("/reset-points", post(admin::reset_points))
        // Auth runs first, then the admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .route("/login", post(admin::login));

    Router::new()
        .nest("/api/challenges", challenge_routes)
        .route("/api/leaderboard", get(leaderboard::get_leaderboard))
        .nest("/api/admin", admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
