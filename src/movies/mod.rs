use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod search;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/movie/add-to-favorites/:userId",
            post(handlers::add_to_favorites),
        )
        .route(
            "/movies/get-favorite-movies/:userId",
            get(handlers::get_favorites),
        )
        .route(
            "/movie/remove-from-favorites/:userId",
            put(handlers::remove_from_favorites),
        )
        .route("/movies", get(handlers::search_movies))
}
