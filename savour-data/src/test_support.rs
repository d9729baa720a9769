//! SQLite and embedding store fixture writers shared by tests.

use std::io::{BufWriter, Write};

use bincode::serialize_into;
use camino::Utf8Path;
use rusqlite::{Connection, Transaction, params};

use crate::store::{EMBEDDING_STORE_MAGIC, EMBEDDING_STORE_VERSION, StorePayload};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS restaurants (
        id TEXT PRIMARY KEY,
        name TEXT,
        address TEXT,
        rating REAL,
        price_level INTEGER,
        user_ratings_total INTEGER,
        lat REAL,
        lng REAL,
        place_tags TEXT,
        business_status TEXT
    );
    CREATE TABLE IF NOT EXISTS place_details (
        id TEXT PRIMARY KEY,
        serves_vegetarian_food INTEGER,
        dine_in INTEGER,
        takeout INTEGER,
        delivery INTEGER,
        website TEXT,
        formatted_phone_number TEXT,
        open_times TEXT
    );
    CREATE TABLE IF NOT EXISTS reviews (
        id TEXT,
        author_name TEXT,
        author_url TEXT,
        profile_photo_url TEXT,
        rating REAL,
        text TEXT,
        time INTEGER
    );
    CREATE TABLE IF NOT EXISTS photos (
        id TEXT,
        photo_reference TEXT
    );";

/// A `restaurants` row with its `place_details` and `photos` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureRestaurant {
    /// Place id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Raw rating column.
    pub rating: f64,
    /// Raw price tier column.
    pub price_level: Option<i64>,
    /// Raw rating count column.
    pub user_ratings_total: i64,
    /// Raw latitude column.
    pub lat: Option<f64>,
    /// Raw longitude column.
    pub lng: Option<f64>,
    /// Raw tag text.
    pub tags: String,
    /// Business status; `None` leaves the column null.
    pub business_status: Option<String>,
    /// Serves vegetarian food.
    pub vegetarian: bool,
    /// Offers dine-in.
    pub dine_in: bool,
    /// Offers takeout.
    pub takeout: bool,
    /// Offers delivery.
    pub delivery: bool,
    /// Website column.
    pub website: Option<String>,
    /// Phone column.
    pub phone: Option<String>,
    /// Opening hours column.
    pub hours: Option<String>,
    /// Number of photo rows.
    pub photos: usize,
}

impl FixtureRestaurant {
    /// An operational restaurant in central Austin with no listing details.
    #[must_use]
    pub fn new(id: &str, name: &str, rating: f64, price_level: Option<i64>) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            address: format!("{name} Street"),
            rating,
            price_level,
            user_ratings_total: 10,
            lat: Some(30.2672),
            lng: Some(-97.7431),
            tags: String::new(),
            business_status: Some("OPERATIONAL".to_owned()),
            vegetarian: false,
            dine_in: false,
            takeout: false,
            delivery: false,
            website: None,
            phone: None,
            hours: None,
            photos: 0,
        }
    }
}

/// A `reviews` row.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureReview {
    /// Place id the review belongs to.
    pub restaurant_id: String,
    /// Reviewer name.
    pub author_name: String,
    /// Reviewer profile URL.
    pub author_url: Option<String>,
    /// Reviewer photo URL.
    pub profile_photo_url: Option<String>,
    /// Raw rating column.
    pub rating: f64,
    /// Review text.
    pub text: String,
    /// Publication time in Unix seconds.
    pub time: i64,
}

impl FixtureReview {
    /// An anonymous review.
    #[must_use]
    pub fn new(restaurant_id: &str, rating: f64, text: &str, time: i64) -> Self {
        Self {
            restaurant_id: restaurant_id.to_owned(),
            author_name: "Reviewer".to_owned(),
            author_url: None,
            profile_photo_url: None,
            rating,
            text: text.to_owned(),
            time,
        }
    }
}

/// Create the schema at `path` and insert the given rows in order.
///
/// # Errors
/// Returns the `rusqlite` error of the first failing statement.
pub fn write_fixture_database(
    path: &Utf8Path,
    restaurants: &[FixtureRestaurant],
    reviews: &[FixtureReview],
) -> Result<(), rusqlite::Error> {
    let mut connection = Connection::open(path.as_std_path())?;
    let transaction = connection.transaction()?;
    transaction.execute_batch(SCHEMA)?;
    insert_restaurants(&transaction, restaurants)?;
    insert_reviews(&transaction, reviews)?;
    transaction.commit()
}

fn insert_restaurants(
    transaction: &Transaction<'_>,
    restaurants: &[FixtureRestaurant],
) -> Result<(), rusqlite::Error> {
    let mut restaurant_stmt = transaction.prepare(
        "INSERT INTO restaurants (id, name, address, rating, price_level, user_ratings_total,
             lat, lng, place_tags, business_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    let mut details_stmt = transaction.prepare(
        "INSERT INTO place_details (id, serves_vegetarian_food, dine_in, takeout, delivery,
             website, formatted_phone_number, open_times)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    let mut photo_stmt =
        transaction.prepare("INSERT INTO photos (id, photo_reference) VALUES (?1, ?2)")?;

    for restaurant in restaurants {
        restaurant_stmt.execute(params![
            restaurant.id,
            restaurant.name,
            restaurant.address,
            restaurant.rating,
            restaurant.price_level,
            restaurant.user_ratings_total,
            restaurant.lat,
            restaurant.lng,
            restaurant.tags,
            restaurant.business_status,
        ])?;
        details_stmt.execute(params![
            restaurant.id,
            restaurant.vegetarian,
            restaurant.dine_in,
            restaurant.takeout,
            restaurant.delivery,
            restaurant.website,
            restaurant.phone,
            restaurant.hours,
        ])?;
        for index in 0..restaurant.photos {
            photo_stmt.execute(params![restaurant.id, format!("photo-{index}")])?;
        }
    }
    Ok(())
}

fn insert_reviews(
    transaction: &Transaction<'_>,
    reviews: &[FixtureReview],
) -> Result<(), rusqlite::Error> {
    let mut statement = transaction.prepare(
        "INSERT INTO reviews (id, author_name, author_url, profile_photo_url, rating, text, time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for review in reviews {
        statement.execute(params![
            review.restaurant_id,
            review.author_name,
            review.author_url,
            review.profile_photo_url,
            review.rating,
            review.text,
            review.time,
        ])?;
    }
    Ok(())
}

/// Write a store file without validating that ids and vectors agree.
///
/// # Errors
/// Returns the `bincode` error when the file cannot be written.
pub fn write_unchecked_store(
    path: &Utf8Path,
    ids: &[&str],
    vectors: &[Vec<f32>],
) -> Result<(), bincode::Error> {
    let payload = StorePayload {
        ids: ids.iter().map(|id| (*id).to_owned()).collect(),
        vectors: vectors.to_vec(),
    };
    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    serialize_into(&mut writer, &EMBEDDING_STORE_MAGIC)?;
    serialize_into(&mut writer, &EMBEDDING_STORE_VERSION)?;
    serialize_into(&mut writer, &payload)?;
    writer.flush()?;
    Ok(())
}
