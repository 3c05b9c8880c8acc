use axum::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CatalogConfig;

/// One result item from the movie catalog. Known fields are typed for
/// filtering; everything else rides along untouched in `extra` so the
/// client sees the full upstream record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMovie {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_genre_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_url_100: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_url_high_res: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<CatalogMovie>,
}

/// Movie catalog lookup. Injected so tests can substitute a fixed result set.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search_movies(&self, term: &str, limit: u32) -> anyhow::Result<Vec<CatalogMovie>>;
}

pub struct ItunesCatalog {
    http: reqwest::Client,
    base_url: String,
}

impl ItunesCatalog {
    pub fn new(cfg: &CatalogConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: cfg.base_url.clone(),
        }
    }
}

#[async_trait]
impl CatalogClient for ItunesCatalog {
    async fn search_movies(&self, term: &str, limit: u32) -> anyhow::Result<Vec<CatalogMovie>> {
        let resp = self
            .http
            .get(&self.base_url)
            .query(&[
                ("term", term),
                ("media", "movie"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<SearchResponse>()
            .await?;
        debug!(term, count = resp.results.len(), "catalog search");
        Ok(resp.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_fields_round_trip_through_extra() {
        let raw = serde_json::json!({
            "trackId": 42,
            "trackName": "Star Wars",
            "trackPrice": 9.99,
            "primaryGenreName": "Sci-Fi & Fantasy",
            "collectionName": "Star Wars Collection",
            "trackTimeMillis": 7260000
        });
        let movie: CatalogMovie = serde_json::from_value(raw).unwrap();
        assert_eq!(movie.track_id, Some(42));
        assert_eq!(movie.extra["collectionName"], "Star Wars Collection");

        let back = serde_json::to_value(&movie).unwrap();
        assert_eq!(back["trackTimeMillis"], 7260000);
        // Absent optional fields must not serialize as null.
        assert!(back.get("releaseDate").is_none());
    }
}
