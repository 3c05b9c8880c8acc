use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    movies::{
        dto::{
            AddFavoriteRequest, AddFavoriteResponse, FavoritesResponse, MessageResponse,
            RemoveFavoriteRequest, SearchQuery, SearchResponse,
        },
        repo::{self, Movie},
        search::{matches_filters, paginate, with_high_res_artwork, SearchFilters},
    },
    state::AppState,
    users::repo::User,
};

/// POST /movie/add-to-favorites/:userId
#[instrument(skip(state, payload))]
pub async fn add_to_favorites(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AddFavoriteRequest>,
) -> Result<Json<AddFavoriteResponse>, ApiError> {
    let movie_data = payload
        .movie_data
        .ok_or_else(|| ApiError::validation("Movie data is incomplete"))?;
    let track_id = movie_data
        .track_id
        .ok_or_else(|| ApiError::validation("Movie data is incomplete"))?;

    // Find-or-create by the catalog's natural key. The movie row persists
    // even if the user lookup below fails.
    let movie = match Movie::find_by_track_id(&state.db, track_id).await? {
        Some(m) => m,
        None => Movie::create(&state.db, &movie_data).await?,
    };

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if repo::is_favorite(&state.db, user.id, movie.id).await? {
        warn!(user_id = %user.id, movie_id = %movie.id, "already a favorite");
        return Err(ApiError::conflict("Movie is already in favorites"));
    }

    repo::add_favorite(&state.db, user.id, movie.id).await?;

    info!(user_id = %user.id, movie_id = %movie.id, "favorite added");
    Ok(Json(AddFavoriteResponse {
        message: "Movie added to favorites".into(),
        success: true,
    }))
}

/// GET /movies/get-favorite-movies/:userId
#[instrument(skip(state))]
pub async fn get_favorites(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let favorites = repo::list_favorites(&state.db, user.id).await?;
    Ok(Json(FavoritesResponse { favorites }))
}

/// PUT /movie/remove-from-favorites/:userId
#[instrument(skip(state, payload))]
pub async fn remove_from_favorites(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RemoveFavoriteRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let movie_id = parse_movie_id(payload.movie_id)?;

    let removed = repo::remove_favorite(&state.db, user.id, movie_id).await?;
    if removed == 0 {
        return Err(ApiError::validation("Movie not found in favorites"));
    }

    info!(user_id = %user.id, movie_id = %movie_id, "favorite removed");
    Ok(Json(MessageResponse {
        message: "Movie removed from favorites".into(),
    }))
}

/// The frontend contract returns 404, not 400, for a missing or empty
/// movieId. A malformed id is simply not in the favorites list.
fn parse_movie_id(movie_id: Option<String>) -> Result<Uuid, ApiError> {
    let raw = movie_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::not_found("MovieId not received"))?;
    raw.parse()
        .map_err(|_| ApiError::validation("Movie not found in favorites"))
}

/// GET /movies — catalog pass-through with in-process filtering.
#[instrument(skip(state))]
pub async fn search_movies(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let fetched = state
        .catalog
        .search_movies(&q.term, state.config.catalog.fetch_limit)
        .await
        .context("catalog search")?;

    let filters = SearchFilters::new(q.genre, q.price_range, q.year_range);

    let filtered: Vec<_> = fetched
        .into_iter()
        .filter(|m| matches_filters(m, &filters))
        .map(with_high_res_artwork)
        .collect();

    let (data, total_pages, total_results) = paginate(filtered, q.offset, q.limit);

    Ok(Json(SearchResponse {
        success: true,
        data,
        total_pages,
        total_results,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn missing_or_empty_movie_id_is_not_received() {
        let err = parse_movie_id(None).unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "MovieId not received");

        let err = parse_movie_id(Some(String::new())).unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn malformed_movie_id_reads_as_not_in_favorites() {
        let err = parse_movie_id(Some("not-a-uuid".into())).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Movie not found in favorites");
    }

    #[test]
    fn well_formed_movie_id_parses() {
        let id = Uuid::new_v4();
        assert_eq!(parse_movie_id(Some(id.to_string())).unwrap(), id);
    }
}
