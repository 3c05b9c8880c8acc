use lazy_static::lazy_static;
use regex::Regex;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::catalog::CatalogMovie;

#[derive(Debug, Default, Clone)]
pub struct SearchFilters {
    pub genre: Option<String>,
    pub price_range: Option<String>,
    pub year_range: Option<String>,
}

impl SearchFilters {
    /// An empty query parameter behaves as if it were absent.
    pub fn new(
        genre: Option<String>,
        price_range: Option<String>,
        year_range: Option<String>,
    ) -> Self {
        Self {
            genre: genre.filter(|s| !s.is_empty()),
            price_range: price_range.filter(|s| !s.is_empty()),
            year_range: year_range.filter(|s| !s.is_empty()),
        }
    }
}

/// Parse a "min-max" range. An empty bound ("-10", "5-") is zero, so "-10"
/// means 0 to 10. Non-numeric or missing bounds become NaN, which makes
/// every comparison against them fail, so a malformed range matches only
/// items that skip the filter entirely.
fn parse_range(raw: &str) -> (f64, f64) {
    let mut parts = raw.splitn(2, '-');
    let min = parts.next().map(parse_bound).unwrap_or(f64::NAN);
    let max = parts.next().map(parse_bound).unwrap_or(f64::NAN);
    (min, max)
}

fn parse_bound(s: &str) -> f64 {
    if s.is_empty() {
        0.0
    } else {
        s.parse().unwrap_or(f64::NAN)
    }
}

fn release_year(raw: &str) -> Option<i32> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .map(|d| d.year())
        .ok()
        .or_else(|| raw.get(0..4)?.parse().ok())
}

/// Each filter is skipped both when its parameter is absent and when the
/// item lacks the filtered field.
pub fn matches_filters(movie: &CatalogMovie, filters: &SearchFilters) -> bool {
    if let (Some(wanted), Some(genre)) = (&filters.genre, &movie.primary_genre_name) {
        if !genre.to_lowercase().contains(&wanted.to_lowercase()) {
            return false;
        }
    }

    if let (Some(range), Some(price)) = (&filters.price_range, movie.track_price) {
        let (min, max) = parse_range(range);
        if !(price >= min && price <= max) {
            return false;
        }
    }

    if let (Some(range), Some(date)) = (&filters.year_range, &movie.release_date) {
        let (min, max) = parse_range(range);
        match release_year(date) {
            Some(year) => {
                let year = year as f64;
                if !(year >= min && year <= max) {
                    return false;
                }
            }
            // An unparseable date can never satisfy a year filter.
            None => return false,
        }
    }

    true
}

/// Derive the 600x600 artwork URL from the low-res one by substituting the
/// resolution segment.
pub fn with_high_res_artwork(mut movie: CatalogMovie) -> CatalogMovie {
    lazy_static! {
        static ref RES_RE: Regex = Regex::new(r"/\d+x\d+bb\.jpg$").unwrap();
    }
    movie.artwork_url_high_res = movie
        .artwork_url_100
        .as_deref()
        .map(|url| RES_RE.replace(url, "/600x600bb.jpg").into_owned());
    movie
}

/// Slice out one page and report total filtered count and page count.
pub fn paginate(
    movies: Vec<CatalogMovie>,
    offset: usize,
    limit: usize,
) -> (Vec<CatalogMovie>, usize, usize) {
    let total_results = movies.len();
    let total_pages = if limit > 0 {
        (total_results + limit - 1) / limit
    } else {
        0
    };
    let page = movies.into_iter().skip(offset).take(limit).collect();
    (page, total_pages, total_results)
}
