pub mod health;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::auth::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, career, instructors, students};

pub fn build_router(state: AppState) -> Router {
    // Everything except /health and sign-in sits behind the bearer-token
    // middleware; instructor-only handlers additionally check the role claim.
    let protected = Router::new()
        .route("/api/auth/me", get(auth::handlers::handle_me))
        .route("/api/student/profile", get(students::handlers::handle_profile))
        .route(
            "/api/student/onboarding",
            put(students::handlers::handle_onboarding),
        )
        .route(
            "/api/student/handles",
            put(students::handlers::handle_update_handles),
        )
        .route("/api/student/refresh", post(students::handlers::handle_refresh))
        .route("/api/student/scores", get(students::handlers::handle_scores))
        .route(
            "/api/student/leaderboard",
            get(students::handlers::handle_leaderboard),
        )
        .route("/api/instructor", post(instructors::handlers::handle_register))
        .route(
            "/api/instructor/profile",
            get(instructors::handlers::handle_profile),
        )
        .route(
            "/api/instructor/students",
            get(instructors::handlers::handle_list_students),
        )
        .route(
            "/api/instructor/refresh-batch",
            post(instructors::handlers::handle_refresh_batch),
        )
        .route("/api/career/ats-score", post(career::handlers::handle_ats_score))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/auth/google", post(auth::handlers::handle_google_sign_in))
        .merge(protected)
        .with_state(state)
}
