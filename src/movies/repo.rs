use anyhow::anyhow;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use crate::movies::dto::MoviePayload;

/// Movie record shared by every user who favorites it. Immutable after
/// creation except for timestamps.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: Uuid,
    pub track_id: i64,
    pub track_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_price: Option<f64>,
    pub artist_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub release_date: OffsetDateTime,
    pub long_description: String,
    pub short_description: String,
    pub primary_genre_name: String,
    #[serde(rename = "cast")]
    pub cast_members: String,
    #[serde(rename = "artworkUrl100")]
    pub artwork_url_100: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artwork_url_high_res: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const MOVIE_COLUMNS: &str = "id, track_id, track_name, track_price, artist_name, release_date, \
     long_description, short_description, primary_genre_name, cast_members, \
     artwork_url_100, artwork_url_high_res, preview_url, created_at, updated_at";

impl Movie {
    pub async fn find_by_track_id(db: &PgPool, track_id: i64) -> anyhow::Result<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE track_id = $1"
        ))
        .bind(track_id)
        .fetch_optional(db)
        .await?;
        Ok(movie)
    }

    /// Insert a movie from a catalog payload, filling defaults for fields
    /// the payload omits. A missing release date falls back to now().
    pub async fn create(db: &PgPool, payload: &MoviePayload) -> anyhow::Result<Movie> {
        let track_id = payload.track_id.ok_or_else(|| anyhow!("missing trackId"))?;
        let track_name = payload
            .track_name
            .as_deref()
            .ok_or_else(|| anyhow!("missing trackName"))?;
        let genre = payload
            .primary_genre_name
            .as_deref()
            .ok_or_else(|| anyhow!("missing primaryGenreName"))?;
        let artwork = payload
            .artwork_url_100
            .as_deref()
            .ok_or_else(|| anyhow!("missing artworkUrl100"))?;

        let release_date = payload
            .release_date
            .as_deref()
            .and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok());

        let movie = sqlx::query_as::<_, Movie>(&format!(
            "INSERT INTO movies (track_id, track_name, track_price, artist_name, release_date, \
             long_description, short_description, primary_genre_name, cast_members, \
             artwork_url_100, artwork_url_high_res, preview_url) \
             VALUES ($1, $2, $3, COALESCE($4, 'Not listed'), COALESCE($5, now()), \
             COALESCE($6, 'No description available.'), COALESCE($7, 'No description available.'), \
             $8, COALESCE($9, 'Not listed'), $10, $11, $12) \
             RETURNING {MOVIE_COLUMNS}"
        ))
        .bind(track_id)
        .bind(track_name)
        .bind(payload.track_price)
        .bind(payload.artist_name.as_deref())
        .bind(release_date)
        .bind(payload.long_description.as_deref())
        .bind(payload.short_description.as_deref())
        .bind(genre)
        .bind(payload.cast_members.as_deref())
        .bind(artwork)
        .bind(payload.artwork_url_high_res.as_deref())
        .bind(payload.preview_url.as_deref())
        .fetch_one(db)
        .await?;
        Ok(movie)
    }
}

pub async fn is_favorite(db: &PgPool, user_id: Uuid, movie_id: Uuid) -> anyhow::Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM user_favorites WHERE user_id = $1 AND movie_id = $2)",
    )
    .bind(user_id)
    .bind(movie_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

pub async fn add_favorite(db: &PgPool, user_id: Uuid, movie_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO user_favorites (user_id, movie_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(movie_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn remove_favorite(db: &PgPool, user_id: Uuid, movie_id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND movie_id = $2")
        .bind(user_id)
        .bind(movie_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Favorites expanded to full movie records, in the order they were added.
pub async fn list_favorites(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Movie>> {
    let movies = sqlx::query_as::<_, Movie>(
        "SELECT m.* FROM user_favorites f JOIN movies m ON m.id = f.movie_id \
         WHERE f.user_id = $1 ORDER BY f.added_at",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(movies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_serializes_with_frontend_field_names() {
        let movie = Movie {
            id: Uuid::new_v4(),
            track_id: 42,
            track_name: "Star Wars".into(),
            track_price: Some(9.99),
            artist_name: "George Lucas".into(),
            release_date: OffsetDateTime::UNIX_EPOCH,
            long_description: "A long time ago...".into(),
            short_description: "No description available.".into(),
            primary_genre_name: "Sci-Fi & Fantasy".into(),
            cast_members: "Not listed".into(),
            artwork_url_100: "https://a.local/100x100bb.jpg".into(),
            artwork_url_high_res: Some("https://a.local/600x600bb.jpg".into()),
            preview_url: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["trackId"], 42);
        assert_eq!(json["cast"], "Not listed");
        assert_eq!(json["artworkUrl100"], "https://a.local/100x100bb.jpg");
        assert_eq!(json["artworkUrlHighRes"], "https://a.local/600x600bb.jpg");
        assert!(json.get("previewUrl").is_none());
    }

    fn payload(track_id: i64) -> MoviePayload {
        MoviePayload {
            track_id: Some(track_id),
            track_name: Some("Star Wars".into()),
            track_price: Some(9.99),
            artist_name: None,
            release_date: Some("1977-05-25T07:00:00Z".into()),
            long_description: None,
            short_description: None,
            primary_genre_name: Some("Sci-Fi & Fantasy".into()),
            cast_members: None,
            artwork_url_100: Some("https://a.local/100x100bb.jpg".into()),
            artwork_url_high_res: None,
            preview_url: None,
        }
    }

    async fn seed_user(pool: &PgPool) -> crate::users::repo::User {
        crate::users::repo::User::create(
            pool,
            "Ada",
            "ada@example.com",
            "$argon2id$fake",
            "a1b2c3",
            None,
        )
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn create_fills_defaults_for_omitted_fields(pool: PgPool) {
        let movie = Movie::create(&pool, &payload(42)).await.unwrap();
        assert_eq!(movie.track_id, 42);
        assert_eq!(movie.artist_name, "Not listed");
        assert_eq!(movie.cast_members, "Not listed");
        assert_eq!(movie.long_description, "No description available.");
        assert_eq!(movie.release_date.year(), 1977);

        let found = Movie::find_by_track_id(&pool, 42).await.unwrap().unwrap();
        assert_eq!(found.id, movie.id);
    }

    #[sqlx::test]
    async fn duplicate_favorite_is_rejected_by_storage(pool: PgPool) {
        let user = seed_user(&pool).await;
        let movie = Movie::create(&pool, &payload(42)).await.unwrap();

        assert!(!is_favorite(&pool, user.id, movie.id).await.unwrap());
        add_favorite(&pool, user.id, movie.id).await.unwrap();
        assert!(is_favorite(&pool, user.id, movie.id).await.unwrap());

        assert!(add_favorite(&pool, user.id, movie.id).await.is_err());

        let favorites = list_favorites(&pool, user.id).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, movie.id);
    }

    #[sqlx::test]
    async fn removing_a_non_favorite_changes_nothing(pool: PgPool) {
        let user = seed_user(&pool).await;
        let movie = Movie::create(&pool, &payload(42)).await.unwrap();
        add_favorite(&pool, user.id, movie.id).await.unwrap();

        let removed = remove_favorite(&pool, user.id, Uuid::new_v4()).await.unwrap();
        assert_eq!(removed, 0);
        assert_eq!(list_favorites(&pool, user.id).await.unwrap().len(), 1);

        let removed = remove_favorite(&pool, user.id, movie.id).await.unwrap();
        assert_eq!(removed, 1);
        assert!(list_favorites(&pool, user.id).await.unwrap().is_empty());
    }
}
