use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(handlers::register))
        .route("/user/verify", post(handlers::verify))
        .route("/user/forgot-password", post(handlers::forgot_password))
        .route("/user/reset-password/:token", post(handlers::reset_password))
        .route("/users", get(handlers::list_users))
        .route("/user/login", post(handlers::login))
        .route("/user/:id", get(handlers::get_user))
        .route("/user/updateProfile", post(handlers::update_profile))
        // Profile images arrive inline in the multipart body.
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}
