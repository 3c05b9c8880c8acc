use serde::{Deserialize, Serialize};

use crate::catalog::CatalogMovie;
use crate::movies::repo::Movie;

/// Catalog record as submitted by the frontend when favoriting. Everything
/// is optional at the wire level; the handler rejects a missing trackId and
/// the repo fills defaults for the rest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePayload {
    pub track_id: Option<i64>,
    pub track_name: Option<String>,
    pub track_price: Option<f64>,
    pub artist_name: Option<String>,
    pub release_date: Option<String>,
    pub long_description: Option<String>,
    pub short_description: Option<String>,
    pub primary_genre_name: Option<String>,
    #[serde(rename = "cast")]
    pub cast_members: Option<String>,
    #[serde(rename = "artworkUrl100")]
    pub artwork_url_100: Option<String>,
    pub artwork_url_high_res: Option<String>,
    pub preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    pub movie_data: Option<MoviePayload>,
}

#[derive(Debug, Serialize)]
pub struct AddFavoriteResponse {
    pub message: String,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<Movie>,
}

/// The id arrives as a raw string so a malformed value reaches the handler
/// instead of being rejected by the extractor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFavoriteRequest {
    pub movie_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default = "default_term")]
    pub term: String,
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub genre: Option<String>,
    #[serde(rename = "priceRange")]
    pub price_range: Option<String>,
    #[serde(rename = "yearRange")]
    pub year_range: Option<String>,
}

fn default_term() -> String {
    "star".into()
}
fn default_limit() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub data: Vec<CatalogMovie>,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
    #[serde(rename = "totalResults")]
    pub total_results: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_query_defaults() {
        let q: SearchQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.term, "star");
        assert_eq!(q.offset, 0);
        assert_eq!(q.limit, 10);
        assert!(q.genre.is_none());
    }

    #[test]
    fn add_favorite_request_tolerates_partial_payload() {
        let req: AddFavoriteRequest =
            serde_json::from_str(r#"{"movieData":{"trackName":"Solo"}}"#).unwrap();
        let data = req.movie_data.unwrap();
        assert!(data.track_id.is_none());
        assert_eq!(data.track_name.as_deref(), Some("Solo"));

        let empty: AddFavoriteRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.movie_data.is_none());
    }

    #[test]
    fn remove_request_accepts_any_movie_id_string() {
        let req: RemoveFavoriteRequest =
            serde_json::from_str(r#"{"movieId":"not-a-uuid"}"#).unwrap();
        assert_eq!(req.movie_id.as_deref(), Some("not-a-uuid"));

        let empty: RemoveFavoriteRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.movie_id.is_none());
    }
}
