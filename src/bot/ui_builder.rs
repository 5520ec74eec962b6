//! Inline keyboards and card text.
//!
//! Callback data is stable across locales; only button labels are
//! localized. Formats: `menu:*`, `find:*`, `category:{slug}`,
//! `price:{slug}`, `rating:{slug}`, `place:{id}:{action}`,
//! `profile:*`, `moderate:{id}:{verdict}`.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::bot::models::Place;
use crate::localization::t_lang;

/// Category slugs with their label keys and the OpenStreetMap value
/// used when querying the catalog API.
pub const CATEGORIES: &[(&str, &str, Option<&str>)] = &[
    ("restaurants", "category-restaurants", Some("restaurant")),
    ("bars", "category-bars", Some("bar")),
    ("cafes", "category-cafes", Some("cafe")),
    ("parks", "category-parks", Some("park")),
    ("museums", "category-museums", Some("museum")),
    ("cinema", "category-cinema", Some("cinema")),
    ("theatre", "category-theatre", Some("theatre")),
    ("shopping", "category-shopping", Some("mall")),
    ("clubs", "category-clubs", Some("nightclub")),
    ("any", "category-any", None),
];

pub const PRICE_LEVELS: &[(&str, &str)] = &[
    ("budget", "price-budget"),
    ("mid", "price-mid"),
    ("premium", "price-premium"),
    ("any", "price-any"),
];

pub const MIN_RATINGS: &[(&str, Option<f64>)] =
    &[("any", None), ("4.0", Some(4.0)), ("4.5", Some(4.5))];

/// OSM category value for a slug, `None` for "any" or unknown slugs.
pub fn osm_category(slug: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(s, _, _)| *s == slug)
        .and_then(|(_, _, osm)| *osm)
}

pub fn category_label(slug: &str, lang: Option<&str>) -> String {
    match CATEGORIES.iter().find(|(s, _, _)| *s == slug) {
        Some((_, key, _)) => t_lang(key, lang),
        None => slug.to_string(),
    }
}

pub fn price_label(slug: &str, lang: Option<&str>) -> String {
    match PRICE_LEVELS.iter().find(|(s, _)| *s == slug) {
        Some((_, key)) => t_lang(key, lang),
        None => slug.to_string(),
    }
}

pub fn main_menu(lang: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            t_lang("btn-find", lang),
            "menu:find",
        )],
        vec![InlineKeyboardButton::callback(
            t_lang("btn-add", lang),
            "menu:add",
        )],
        vec![
            InlineKeyboardButton::callback(t_lang("btn-profile", lang), "menu:profile"),
            InlineKeyboardButton::callback(t_lang("btn-tops", lang), "menu:tops"),
        ],
        vec![InlineKeyboardButton::callback(
            t_lang("btn-help", lang),
            "menu:help",
        )],
    ])
}

pub fn find_menu(lang: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback(t_lang("btn-find-category", lang), "find:category"),
            InlineKeyboardButton::callback(t_lang("btn-find-random", lang), "find:random"),
        ],
        vec![
            InlineKeyboardButton::callback(t_lang("btn-find-search", lang), "find:search"),
            InlineKeyboardButton::callback(t_lang("btn-find-nearby", lang), "find:nearby"),
        ],
        vec![InlineKeyboardButton::callback(
            t_lang("btn-back-menu", lang),
            "find:menu",
        )],
    ])
}

pub fn category_keyboard(lang: Option<&str>) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for pair in CATEGORIES.chunks(2) {
        rows.push(
            pair.iter()
                .map(|(slug, key, _)| {
                    InlineKeyboardButton::callback(t_lang(key, lang), format!("category:{slug}"))
                })
                .collect(),
        );
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn price_keyboard(lang: Option<&str>) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for pair in PRICE_LEVELS.chunks(2) {
        rows.push(
            pair.iter()
                .map(|(slug, key)| {
                    InlineKeyboardButton::callback(t_lang(key, lang), format!("price:{slug}"))
                })
                .collect(),
        );
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn rating_keyboard(lang: Option<&str>) -> InlineKeyboardMarkup {
    let row: Vec<InlineKeyboardButton> = MIN_RATINGS
        .iter()
        .map(|(slug, min)| {
            let label = match min {
                Some(min) => format!("{min:.1}+"),
                None => t_lang("rating-any", lang),
            };
            InlineKeyboardButton::callback(label, format!("rating:{slug}"))
        })
        .collect();
    InlineKeyboardMarkup::new(vec![row])
}

/// Actions under a place card.
pub fn place_actions(
    place_id: &str,
    is_favorite: bool,
    lang: Option<&str>,
) -> InlineKeyboardMarkup {
    let favorite_label = if is_favorite {
        t_lang("btn-favorite-in", lang)
    } else {
        t_lang("btn-favorite-add", lang)
    };

    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback(favorite_label, format!("place:{place_id}:favorite")),
            InlineKeyboardButton::callback(t_lang("btn-next", lang), "place:next"),
        ],
        vec![
            InlineKeyboardButton::callback(
                t_lang("btn-reviews", lang),
                format!("place:{place_id}:reviews"),
            ),
            InlineKeyboardButton::callback(
                t_lang("btn-address", lang),
                format!("place:{place_id}:address"),
            ),
            InlineKeyboardButton::callback(
                t_lang("btn-rate", lang),
                format!("place:{place_id}:rate"),
            ),
        ],
        vec![
            InlineKeyboardButton::callback("👍", format!("place:{place_id}:like")),
            InlineKeyboardButton::callback("👎", format!("place:{place_id}:dislike")),
            InlineKeyboardButton::callback(t_lang("btn-menu", lang), "place:menu"),
        ],
    ])
}

pub fn profile_menu(lang: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback(t_lang("btn-favorites", lang), "profile:favorites"),
            InlineKeyboardButton::callback(t_lang("btn-my-places", lang), "profile:mine"),
        ],
        vec![InlineKeyboardButton::callback(
            t_lang("btn-back-menu", lang),
            "place:menu",
        )],
    ])
}

pub fn moderation_keyboard(place_id: &str, lang: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            t_lang("btn-approve", lang),
            format!("moderate:{place_id}:approve"),
        ),
        InlineKeyboardButton::callback(
            t_lang("btn-reject", lang),
            format!("moderate:{place_id}:reject"),
        ),
    ]])
}

/// The card text shown for one place.
pub fn format_place_card(place: &Place, summary: &str, lang: Option<&str>) -> String {
    let name = if place.name.is_empty() {
        t_lang("card-unnamed", lang)
    } else {
        place.name.clone()
    };

    let mut lines = vec![format!("📍 {name}")];

    if let Some(category) = &place.category {
        lines.push(format!(
            "{}: {}",
            t_lang("card-category", lang),
            category_label(category, lang)
        ));
    }
    if let Some(price) = &place.price_level {
        lines.push(format!(
            "{}: {}",
            t_lang("card-price", lang),
            price_label(price, lang)
        ));
    }
    if place.rating > 0.0 {
        lines.push(format!("{}: {:.1} ⭐", t_lang("card-rating", lang), place.rating));
    }
    if let Some(address) = &place.address {
        lines.push(format!("{}: {address}", t_lang("card-address", lang)));
    }
    if let Some(description) = &place.description {
        lines.push(description.clone());
    }
    if !summary.is_empty() {
        lines.push(String::new());
        lines.push(format!("💬 {summary}"));
    }

    lines.join("\n")
}

/// One line per place for list views.
pub fn format_place_line(place: &Place, lang: Option<&str>) -> String {
    let name = if place.name.is_empty() {
        t_lang("card-unnamed", lang)
    } else {
        place.name.clone()
    };
    if place.rating > 0.0 {
        format!("• {name} ({:.1} ⭐)", place.rating)
    } else {
        format!("• {name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_place() -> Place {
        Place {
            id: "p1".to_string(),
            name: "Blue Door Cafe".to_string(),
            category: Some("cafes".to_string()),
            address: Some("Arbat, 12".to_string()),
            description: Some("cozy".to_string()),
            price_level: Some("budget".to_string()),
            rating: 4.5,
            status: "approved".to_string(),
            created_by: None,
            created_at: None,
            contacts: None,
            latitude: None,
            longitude: None,
            score: None,
        }
    }

    #[test]
    fn test_osm_category_mapping() {
        assert_eq!(osm_category("restaurants"), Some("restaurant"));
        assert_eq!(osm_category("any"), None);
        assert_eq!(osm_category("unknown"), None);
    }

    #[test]
    fn test_category_keyboard_covers_all_slugs() {
        let keyboard = category_keyboard(Some("en"));
        let buttons: usize = keyboard.inline_keyboard.iter().map(Vec::len).sum();
        assert_eq!(buttons, CATEGORIES.len());
    }

    #[test]
    fn test_place_card_contains_fields() {
        let card = format_place_card(&sample_place(), "", Some("en"));
        assert!(card.contains("Blue Door Cafe"));
        assert!(card.contains("Arbat, 12"));
        assert!(card.contains("4.5"));
    }

    #[test]
    fn test_place_card_unnamed_fallback() {
        let mut place = sample_place();
        place.name = String::new();
        let card = format_place_card(&place, "", Some("en"));
        assert!(card.contains(&t_lang("card-unnamed", Some("en"))));
    }

    #[test]
    fn test_place_actions_callback_format() {
        let keyboard = place_actions("abc-123", false, Some("en"));
        let all: Vec<String> = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                    Some(data.clone())
                }
                _ => None,
            })
            .collect();
        assert!(all.contains(&"place:abc-123:favorite".to_string()));
        assert!(all.contains(&"place:next".to_string()));
        assert!(all.contains(&"place:abc-123:like".to_string()));
    }
}
