//! JSON storage round trips through a temporary data directory.

use nomad_places::bot::models::{status, utc_now, Place, Review};
use nomad_places::bot::storage::JsonStorage;
use tempfile::tempdir;

fn make_place(id: &str, name: &str, status: &str) -> Place {
    Place {
        id: id.to_string(),
        name: name.to_string(),
        category: Some("cafes".to_string()),
        address: Some("Main street 1".to_string()),
        description: None,
        price_level: Some("budget".to_string()),
        rating: 0.0,
        status: status.to_string(),
        created_by: Some(42),
        created_at: Some(utc_now()),
        contacts: None,
        latitude: None,
        longitude: None,
        score: None,
    }
}

#[test]
fn test_places_survive_reload() {
    let dir = tempdir().unwrap();

    {
        let storage = JsonStorage::new(dir.path()).unwrap();
        storage.upsert_place(make_place("p1", "Blue Door", status::APPROVED));
        storage.upsert_place(make_place("p2", "Red Door", status::PENDING));
    }

    // A fresh instance reads the same files back
    let storage = JsonStorage::new(dir.path()).unwrap();
    assert_eq!(storage.list_places(None).len(), 2);
    assert_eq!(storage.list_places(Some(status::APPROVED)).len(), 1);
    assert_eq!(
        storage.get_place("p2").unwrap().status,
        status::PENDING.to_string()
    );
}

#[test]
fn test_moderation_status_transition() {
    let dir = tempdir().unwrap();
    let storage = JsonStorage::new(dir.path()).unwrap();

    storage.upsert_place(make_place("p1", "Blue Door", status::PENDING));
    assert_eq!(storage.list_pending_places().len(), 1);

    let approved = storage.set_place_status("p1", status::APPROVED).unwrap();
    assert_eq!(approved.status, status::APPROVED.to_string());
    assert!(storage.list_pending_places().is_empty());

    assert!(storage.set_place_status("missing", status::APPROVED).is_none());
}

#[test]
fn test_favorites_toggle_and_listing() {
    let dir = tempdir().unwrap();
    let storage = JsonStorage::new(dir.path()).unwrap();

    storage.upsert_place(make_place("p1", "Blue Door", status::APPROVED));

    assert!(!storage.is_favorite(7, "p1"));
    assert!(storage.toggle_favorite(7, "p1"));
    assert!(storage.is_favorite(7, "p1"));
    assert_eq!(storage.list_favorites(7).len(), 1);

    // Second toggle removes it
    assert!(!storage.toggle_favorite(7, "p1"));
    assert!(storage.list_favorites(7).is_empty());

    // Another user is unaffected
    assert!(storage.list_favorites(8).is_empty());
}

#[test]
fn test_likes_latest_vote_wins() {
    let dir = tempdir().unwrap();
    let storage = JsonStorage::new(dir.path()).unwrap();

    storage.record_like(1, "p1", 1);
    storage.record_like(2, "p1", 1);
    assert_eq!(storage.like_score("p1"), 2);

    storage.record_like(1, "p1", -1);
    assert_eq!(storage.like_score("p1"), 0);
}

#[test]
fn test_reviews_update_place_rating() {
    let dir = tempdir().unwrap();
    let storage = JsonStorage::new(dir.path()).unwrap();

    storage.upsert_place(make_place("p1", "Blue Door", status::APPROVED));

    storage.add_review(Review {
        id: "r1".to_string(),
        place_id: "p1".to_string(),
        user_id: 7,
        rating: 5.0,
        text: "great".to_string(),
        status: status::APPROVED.to_string(),
        created_at: "2025-01-01T10:00:00Z".to_string(),
    });
    storage.add_review(Review {
        id: "r2".to_string(),
        place_id: "p1".to_string(),
        user_id: 8,
        rating: 3.0,
        text: String::new(),
        status: status::APPROVED.to_string(),
        created_at: "2025-01-02T10:00:00Z".to_string(),
    });

    let reviews = storage.list_reviews("p1", Some(status::APPROVED));
    assert_eq!(reviews.len(), 2);
    // Newest first
    assert_eq!(reviews[0].id, "r2");

    let place = storage.get_place("p1").unwrap();
    assert_eq!(place.rating, 4.0);
}

#[test]
fn test_cache_place_never_overwrites() {
    let dir = tempdir().unwrap();
    let storage = JsonStorage::new(dir.path()).unwrap();

    storage.upsert_place(make_place("p1", "Blue Door", status::APPROVED));
    storage.cache_place(&make_place("p1", "Impostor", status::ACTIVE));

    assert_eq!(storage.get_place("p1").unwrap().name, "Blue Door");

    storage.cache_place(&make_place("p2", "Catalog Place", status::ACTIVE));
    assert_eq!(storage.get_place("p2").unwrap().name, "Catalog Place");
}

#[test]
fn test_user_places_listing() {
    let dir = tempdir().unwrap();
    let storage = JsonStorage::new(dir.path()).unwrap();

    storage.upsert_place(make_place("p1", "Mine", status::PENDING));
    let mut other = make_place("p2", "Theirs", status::APPROVED);
    other.created_by = Some(99);
    storage.upsert_place(other);

    let mine = storage.list_user_places(42);
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].name, "Mine");
}

#[test]
fn test_corrupt_file_is_ignored() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("places.json"), "not json at all").unwrap();

    let storage = JsonStorage::new(dir.path()).unwrap();
    assert!(storage.list_places(None).is_empty());
}
