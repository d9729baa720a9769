//! Snapshot loader for the restaurant SQLite database.
//!
//! The database holds four tables:
//!
//! - `restaurants(id, name, address, rating, price_level, user_ratings_total,
//!   lat, lng, place_tags, business_status)`
//! - `place_details(id, serves_vegetarian_food, dine_in, takeout, delivery,
//!   website, formatted_phone_number, open_times)`
//! - `reviews(id, author_name, author_url, profile_photo_url, rating, text,
//!   time)` where `time` is in Unix seconds
//! - `photos(id, photo_reference)`
//!
//! Out-of-range values never fail a load: they are logged and treated as
//! missing.

use std::collections::{HashMap, HashSet};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::DateTime;
use log::{info, warn};
use rusqlite::{Connection, OpenFlags, Row};
use savour_core::{
    Amenities, ListingDetails, PriceLevel, Restaurant, RestaurantError, RestaurantId, Review,
    Snapshot, SnapshotError, validate_rating, wgs84_point,
};
use thiserror::Error;

use crate::artefact::is_file;

/// Marker identifying an active contributor profile link.
const CONTRIBUTOR_LINK_MARKER: &str = "contrib";

const RESTAURANTS_QUERY: &str = "
    SELECT r.id, r.name, r.address, r.rating, r.price_level, r.user_ratings_total,
           r.lat, r.lng, r.place_tags,
           COALESCE(pd.serves_vegetarian_food, 0), COALESCE(pd.dine_in, 0),
           COALESCE(pd.takeout, 0), COALESCE(pd.delivery, 0),
           pd.website, pd.formatted_phone_number, pd.open_times,
           EXISTS (SELECT 1 FROM photos p WHERE p.id = r.id)
    FROM restaurants r
    LEFT JOIN place_details pd ON pd.id = r.id
    WHERE ?1 = 0 OR r.business_status IS NULL OR r.business_status = 'OPERATIONAL'
    ORDER BY r.rowid";

const REVIEWS_QUERY: &str = "
    SELECT id, rating, text, time, author_url, profile_photo_url
    FROM reviews
    WHERE ?1 = 0 OR (text IS NOT NULL AND text != '')
    ORDER BY rowid";

/// Error raised while loading a snapshot from SQLite.
#[derive(Debug, Error)]
pub enum SnapshotLoadError {
    /// The database file does not exist.
    #[error("database file not found at {path}")]
    MissingDatabase {
        /// Requested location.
        path: Utf8PathBuf,
    },
    /// Opening the database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the database.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Querying a table failed.
    #[error("failed to query {table}: {source}")]
    Query {
        /// Table being read.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The loaded rows do not form a valid snapshot.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Options controlling which rows enter the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Keep only restaurants with at least this many written reviews.
    pub min_reviews: usize,
    /// Skip restaurants whose business status is set to anything other than
    /// `OPERATIONAL`.
    pub operational_only: bool,
    /// Skip reviews with null or empty text.
    pub written_only: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            min_reviews: 0,
            operational_only: true,
            written_only: true,
        }
    }
}

/// Load every restaurant and review into an immutable [`Snapshot`].
///
/// Restaurants and reviews keep their table order. Reviews that reference an
/// unknown or filtered-out restaurant are dropped, as are reviews without
/// text while [`LoadOptions::written_only`] is set.
///
/// # Errors
/// Returns [`SnapshotLoadError`] when the file is missing, cannot be opened,
/// lacks a required table, or contains duplicate restaurant ids.
pub fn load_snapshot(
    path: &Utf8Path,
    options: LoadOptions,
) -> Result<Snapshot, SnapshotLoadError> {
    if !is_file(path) {
        return Err(SnapshotLoadError::MissingDatabase {
            path: path.to_path_buf(),
        });
    }
    let connection =
        Connection::open_with_flags(path.as_std_path(), OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| SnapshotLoadError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;

    let restaurants = read_restaurants(&connection, options.operational_only)?;
    let reviews = read_reviews(&connection, options.written_only)?;
    let (kept_restaurants, kept_reviews) =
        apply_review_threshold(restaurants, reviews, options.min_reviews);

    let snapshot = Snapshot::new(kept_restaurants, kept_reviews)?;
    info!(
        "loaded {} restaurants and {} reviews from {path}",
        snapshot.restaurant_count(),
        snapshot.review_count()
    );
    Ok(snapshot)
}

fn apply_review_threshold(
    restaurants: Vec<Restaurant>,
    reviews: Vec<Review>,
    min_reviews: usize,
) -> (Vec<Restaurant>, Vec<Review>) {
    if min_reviews == 0 {
        return (restaurants, reviews);
    }
    let mut written: HashMap<&RestaurantId, usize> = HashMap::new();
    for review in reviews.iter().filter(|review| review.text.is_some()) {
        let count = written.entry(&review.restaurant_id).or_default();
        *count = count.saturating_add(1);
    }
    let eligible: HashSet<RestaurantId> = written
        .into_iter()
        .filter(|(_, count)| *count >= min_reviews)
        .map(|(id, _)| id.clone())
        .collect();

    let before = restaurants.len();
    let kept: Vec<Restaurant> = restaurants
        .into_iter()
        .filter(|restaurant| eligible.contains(&restaurant.id))
        .collect();
    info!(
        "kept {} of {before} restaurants with at least {min_reviews} written reviews",
        kept.len()
    );
    let kept_reviews = reviews
        .into_iter()
        .filter(|review| eligible.contains(&review.restaurant_id))
        .collect();
    (kept, kept_reviews)
}

fn read_restaurants(
    connection: &Connection,
    operational_only: bool,
) -> Result<Vec<Restaurant>, SnapshotLoadError> {
    let query_err = |source| SnapshotLoadError::Query {
        table: "restaurants",
        source,
    };
    let mut statement = connection.prepare(RESTAURANTS_QUERY).map_err(query_err)?;
    let mut rows = statement
        .query([i64::from(operational_only)])
        .map_err(query_err)?;

    let mut restaurants = Vec::new();
    while let Some(row) = rows.next().map_err(query_err)? {
        if let Some(restaurant) = restaurant_from_row(row).map_err(query_err)? {
            restaurants.push(restaurant);
        }
    }
    Ok(restaurants)
}

fn restaurant_from_row(row: &Row<'_>) -> Result<Option<Restaurant>, rusqlite::Error> {
    let id: String = row.get(0)?;
    let name: Option<String> = row.get(1)?;
    let Ok(mut restaurant) = Restaurant::new(id.as_str(), name.unwrap_or_default()) else {
        warn!("skipping restaurant row with a blank id");
        return Ok(None);
    };

    restaurant.address = row.get::<_, Option<String>>(2)?.unwrap_or_default();
    restaurant.rating = row
        .get::<_, Option<f64>>(3)?
        .and_then(|raw| lenient(&id, "rating", rating_from_sql(raw)));
    restaurant.price_level = row
        .get::<_, Option<i64>>(4)?
        .and_then(|raw| lenient(&id, "price level", price_from_sql(raw)));
    restaurant.review_count = row
        .get::<_, Option<i64>>(5)?
        .map_or(0, |raw| u32::try_from(raw.max(0)).unwrap_or(u32::MAX));
    let lat: Option<f64> = row.get(6)?;
    let lng: Option<f64> = row.get(7)?;
    restaurant.location = match (lat, lng) {
        (Some(lat_deg), Some(lng_deg)) => lenient(&id, "location", wgs84_point(lat_deg, lng_deg)),
        _ => None,
    };
    restaurant.tags = row.get::<_, Option<String>>(8)?.unwrap_or_default();
    restaurant.amenities = Amenities {
        vegetarian: row.get::<_, i64>(9)? != 0,
        dine_in: row.get::<_, i64>(10)? != 0,
        takeout: row.get::<_, i64>(11)? != 0,
        delivery: row.get::<_, i64>(12)? != 0,
    };
    restaurant.details = ListingDetails {
        website: non_empty(row.get(13)?),
        phone: non_empty(row.get(14)?),
        hours: non_empty(row.get(15)?),
        photos: row.get::<_, i64>(16)? != 0,
    };
    Ok(Some(restaurant))
}

fn read_reviews(
    connection: &Connection,
    written_only: bool,
) -> Result<Vec<Review>, SnapshotLoadError> {
    let query_err = |source| SnapshotLoadError::Query {
        table: "reviews",
        source,
    };
    let mut statement = connection.prepare(REVIEWS_QUERY).map_err(query_err)?;
    let mut rows = statement
        .query([i64::from(written_only)])
        .map_err(query_err)?;

    let mut reviews = Vec::new();
    let mut skipped = 0_usize;
    while let Some(row) = rows.next().map_err(query_err)? {
        match review_from_row(row).map_err(query_err)? {
            Some(review) => reviews.push(review),
            None => skipped = skipped.saturating_add(1),
        }
    }
    if skipped > 0 {
        warn!("skipped {skipped} reviews with an invalid rating or timestamp");
    }
    Ok(reviews)
}

fn review_from_row(row: &Row<'_>) -> Result<Option<Review>, rusqlite::Error> {
    let id: String = row.get(0)?;
    let rating: Option<f64> = row.get(1)?;
    let text: Option<String> = row.get(2)?;
    let time: Option<i64> = row.get(3)?;
    let author_url: Option<String> = row.get(4)?;
    let photo_url: Option<String> = row.get(5)?;

    let Some(published_at) = time.and_then(|secs| DateTime::from_timestamp(secs, 0)) else {
        return Ok(None);
    };
    let Some(Ok(valid_rating)) = rating.map(rating_from_sql) else {
        return Ok(None);
    };
    let Ok(review) = Review::new(RestaurantId::new(id), valid_rating, published_at) else {
        return Ok(None);
    };
    let has_link = author_url.is_some_and(|url| url.contains(CONTRIBUTOR_LINK_MARKER));
    Ok(Some(
        review
            .with_text(text.unwrap_or_default())
            .with_reviewer(non_empty(photo_url), has_link),
    ))
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "ratings are validated to 0..=5 after narrowing"
)]
fn rating_from_sql(raw: f64) -> Result<f32, RestaurantError> {
    validate_rating(raw as f32)
}

fn price_from_sql(raw: i64) -> Result<PriceLevel, RestaurantError> {
    u8::try_from(raw)
        .map_err(|_| RestaurantError::InvalidPriceLevel { level: u8::MAX })
        .and_then(PriceLevel::new)
}

/// Turn a validation failure into a missing value with a warning.
fn lenient<T>(id: &str, field: &str, value: Result<T, RestaurantError>) -> Option<T> {
    value
        .map_err(|err| warn!("restaurant {id}: ignoring {field}: {err}"))
        .ok()
}

fn non_empty(value: Option<String>) -> bool {
    value.is_some_and(|text| !text.trim().is_empty())
}
