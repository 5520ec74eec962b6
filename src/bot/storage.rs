//! File-backed storage for community data.
//!
//! Everything the bot owns itself (submitted places, reviews, profiles,
//! likes) lives in JSON files under `DATA_DIR`. Catalog places shown to
//! users are cached here too so card actions can resolve them by id
//! after the search that produced them is gone.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::bot::models::{status, Place, Review, UserProfile};

const PLACES_FILE: &str = "places.json";
const REVIEWS_FILE: &str = "reviews.json";
const PROFILES_FILE: &str = "profiles.json";
const LIKES_FILE: &str = "likes.json";

#[derive(Default)]
struct StorageInner {
    places: HashMap<String, Place>,
    reviews: HashMap<String, Review>,
    profiles: HashMap<i64, UserProfile>,
    // keyed "user_id:place_id", value +1 or -1
    likes: HashMap<String, i32>,
}

pub struct JsonStorage {
    data_dir: PathBuf,
    inner: Mutex<StorageInner>,
}

impl JsonStorage {
    pub fn new(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;

        let inner = StorageInner {
            places: load_map(&data_dir.join(PLACES_FILE)),
            reviews: load_map(&data_dir.join(REVIEWS_FILE)),
            profiles: load_map(&data_dir.join(PROFILES_FILE)),
            likes: load_map(&data_dir.join(LIKES_FILE)),
        };

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            inner: Mutex::new(inner),
        })
    }

    /// All places, optionally narrowed to one status.
    pub fn list_places(&self, status: Option<&str>) -> Vec<Place> {
        let inner = self.inner.lock().unwrap();
        let mut places: Vec<Place> = inner
            .places
            .values()
            .filter(|place| status.is_none_or(|s| place.status == s))
            .cloned()
            .collect();
        places.sort_by(|a, b| a.name.cmp(&b.name));
        places
    }

    pub fn get_place(&self, place_id: &str) -> Option<Place> {
        self.inner.lock().unwrap().places.get(place_id).cloned()
    }

    /// Insert or replace a place and persist.
    pub fn upsert_place(&self, place: Place) {
        let mut inner = self.inner.lock().unwrap();
        inner.places.insert(place.id.clone(), place);
        self.save(PLACES_FILE, &inner.places);
    }

    /// Cache a catalog place without clobbering a community submission
    /// that happens to share the id.
    pub fn cache_place(&self, place: &Place) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.places.contains_key(&place.id) {
            inner.places.insert(place.id.clone(), place.clone());
            self.save(PLACES_FILE, &inner.places);
        }
    }

    pub fn set_place_status(&self, place_id: &str, status: &str) -> Option<Place> {
        let mut inner = self.inner.lock().unwrap();
        let place = inner.places.get_mut(place_id)?;
        place.status = status.to_string();
        let updated = place.clone();
        self.save(PLACES_FILE, &inner.places);
        Some(updated)
    }

    /// Places submitted by this user, any status.
    pub fn list_user_places(&self, user_id: i64) -> Vec<Place> {
        let inner = self.inner.lock().unwrap();
        let mut places: Vec<Place> = inner
            .places
            .values()
            .filter(|place| place.created_by == Some(user_id))
            .cloned()
            .collect();
        places.sort_by(|a, b| a.name.cmp(&b.name));
        places
    }

    /// Pending submissions, oldest first, for the moderation queue.
    pub fn list_pending_places(&self) -> Vec<Place> {
        let inner = self.inner.lock().unwrap();
        let mut places: Vec<Place> = inner
            .places
            .values()
            .filter(|place| place.status == status::PENDING)
            .cloned()
            .collect();
        places.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        places
    }

    pub fn get_profile(&self, user_id: i64) -> UserProfile {
        let mut inner = self.inner.lock().unwrap();
        inner
            .profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::new(user_id))
            .clone()
    }

    /// Toggle a favorite; returns `true` when the place is now a favorite.
    pub fn toggle_favorite(&self, user_id: i64, place_id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let profile = inner
            .profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::new(user_id));

        let added = if profile.favorites.contains(place_id) {
            profile.favorites.remove(place_id);
            false
        } else {
            profile.favorites.insert(place_id.to_string());
            true
        };

        self.save(PROFILES_FILE, &inner.profiles);
        added
    }

    pub fn is_favorite(&self, user_id: i64, place_id: &str) -> bool {
        let inner = self.inner.lock().unwrap();
        inner
            .profiles
            .get(&user_id)
            .map(|profile| profile.favorites.contains(place_id))
            .unwrap_or(false)
    }

    pub fn list_favorites(&self, user_id: i64) -> Vec<Place> {
        let inner = self.inner.lock().unwrap();
        let Some(profile) = inner.profiles.get(&user_id) else {
            return Vec::new();
        };
        let mut places: Vec<Place> = profile
            .favorites
            .iter()
            .filter_map(|id| inner.places.get(id).cloned())
            .collect();
        places.sort_by(|a, b| a.name.cmp(&b.name));
        places
    }

    /// Record a like (+1) or dislike (-1); the latest vote wins.
    pub fn record_like(&self, user_id: i64, place_id: &str, delta: i32) {
        let mut inner = self.inner.lock().unwrap();
        inner.likes.insert(format!("{user_id}:{place_id}"), delta);
        self.save(LIKES_FILE, &inner.likes);
    }

    /// Net like score across users, used to break rating ties.
    pub fn like_score(&self, place_id: &str) -> i32 {
        let inner = self.inner.lock().unwrap();
        let suffix = format!(":{place_id}");
        inner
            .likes
            .iter()
            .filter(|(key, _)| key.ends_with(&suffix))
            .map(|(_, delta)| delta)
            .sum()
    }

    pub fn add_review(&self, review: Review) {
        let mut inner = self.inner.lock().unwrap();
        inner.reviews.insert(review.id.clone(), review.clone());
        self.save(REVIEWS_FILE, &inner.reviews);

        // Keep the card's rating in sync with its local reviews.
        let ratings: Vec<f64> = inner
            .reviews
            .values()
            .filter(|r| r.place_id == review.place_id && r.status == status::APPROVED)
            .map(|r| r.rating)
            .collect();
        if !ratings.is_empty() {
            if let Some(place) = inner.places.get_mut(&review.place_id) {
                place.rating = ratings.iter().sum::<f64>() / ratings.len() as f64;
                self.save(PLACES_FILE, &inner.places);
            }
        }
    }

    pub fn list_reviews(&self, place_id: &str, status: Option<&str>) -> Vec<Review> {
        let inner = self.inner.lock().unwrap();
        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|review| review.place_id == place_id)
            .filter(|review| status.is_none_or(|s| review.status == s))
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reviews
    }

    fn save<T: Serialize>(&self, file: &str, data: &T) {
        let path = self.data_dir.join(file);
        let serialized = match serde_json::to_string_pretty(data) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!("Failed to serialize {file}: {e}");
                return;
            }
        };
        if let Err(e) = fs::write(&path, serialized) {
            warn!("Failed to write {}: {e}", path.display());
        }
    }
}

fn load_map<K, V>(path: &Path) -> HashMap<K, V>
where
    K: DeserializeOwned + std::cmp::Eq + std::hash::Hash,
    V: DeserializeOwned,
{
    let Ok(content) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    match serde_json::from_str(&content) {
        Ok(map) => map,
        Err(e) => {
            warn!("Ignoring corrupt storage file {}: {e}", path.display());
            HashMap::new()
        }
    }
}
