//! Inline keyboard callbacks: menus, guided search steps, card actions
//! and moderation verdicts.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use crate::api_client::PlacesApiClient;
use crate::bot::dialogue::{BotDialogue, BotDialogueState, PlaceDraft};
use crate::bot::message_handler::confirmation_text;
use crate::bot::models::{status, Place};
use crate::bot::recommend::{
    filter_places, merge_results, random_place, top_places, ReviewSummaryService, SearchFilters,
};
use crate::bot::storage::JsonStorage;
use crate::bot::ui_builder::{
    category_keyboard, find_menu, format_place_line, main_menu, osm_category, price_keyboard,
    profile_menu, rating_keyboard, MIN_RATINGS,
};
use crate::bot::{present_results, send_place_card, AdminIds, HandlerResult};
use crate::localization::{t_args_lang, t_lang};

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: BotDialogue,
    storage: Arc<JsonStorage>,
    client: Arc<PlacesApiClient>,
    summaries: Arc<ReviewSummaryService>,
    admin_ids: AdminIds,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(data) = q.data.clone() else {
        return Ok(());
    };
    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let lang = q.from.language_code.clone();
    let lang = lang.as_deref();
    let user_id = q.from.id.0 as i64;

    let parts: Vec<&str> = data.split(':').collect();
    match parts.as_slice() {
        ["menu", item] => {
            handle_menu(&bot, chat_id, &dialogue, &storage, *item, user_id, lang).await?
        }
        ["find", item] => {
            handle_find(
                &bot, chat_id, &dialogue, &storage, &summaries, *item, user_id, lang,
            )
            .await?
        }
        ["category", slug] => {
            handle_category_choice(&bot, chat_id, &dialogue, *slug, lang).await?
        }
        ["price", slug] => handle_price_choice(&bot, chat_id, &dialogue, *slug, lang).await?,
        ["rating", slug] => {
            handle_rating_choice(
                &bot, chat_id, &dialogue, &storage, &client, &summaries, *slug, user_id, lang,
            )
            .await?
        }
        ["place", "next"] => {
            handle_next(&bot, chat_id, &dialogue, &storage, &summaries, user_id, lang).await?
        }
        ["place", "menu"] => {
            dialogue.update(BotDialogueState::Idle).await?;
            bot.send_message(chat_id, t_lang("menu-title", lang))
                .reply_markup(main_menu(lang))
                .await?;
        }
        ["place", place_id, action] => {
            handle_place_action(
                &bot, chat_id, &dialogue, &storage, &client, place_id, action, user_id, lang,
            )
            .await?
        }
        ["profile", item] => {
            handle_profile(&bot, chat_id, &storage, *item, user_id, lang).await?
        }
        ["moderate", place_id, verdict] => {
            handle_moderation(&bot, chat_id, &storage, &admin_ids, place_id, verdict, user_id, lang)
                .await?
        }
        _ => {}
    }

    Ok(())
}

async fn handle_menu(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &BotDialogue,
    storage: &Arc<JsonStorage>,
    item: &str,
    user_id: i64,
    lang: Option<&str>,
) -> HandlerResult {
    match item {
        "find" => {
            bot.send_message(chat_id, t_lang("find-prompt", lang))
                .reply_markup(find_menu(lang))
                .await?;
        }
        "add" => {
            dialogue.update(BotDialogueState::AddAwaitingName).await?;
            bot.send_message(chat_id, t_lang("add-name-prompt", lang))
                .await?;
        }
        "profile" => {
            let profile = storage.get_profile(user_id);
            let favorites = profile.favorites.len().to_string();
            let submitted = storage.list_user_places(user_id).len().to_string();
            let summary = t_args_lang(
                "profile-summary",
                &[("favorites", favorites.as_str()), ("submitted", submitted.as_str())],
                lang,
            );
            bot.send_message(chat_id, summary)
                .reply_markup(profile_menu(lang))
                .await?;
        }
        "tops" => {
            let top = top_places(storage.list_places(None), |id| storage.like_score(id), 3);
            if top.is_empty() {
                bot.send_message(chat_id, t_lang("tops-empty", lang)).await?;
            } else {
                let mut lines = vec![t_lang("tops-title", lang)];
                lines.extend(top.iter().map(|place| format_place_line(place, lang)));
                bot.send_message(chat_id, lines.join("\n")).await?;
            }
        }
        "help" => {
            bot.send_message(chat_id, t_lang("help-text", lang)).await?;
        }
        _ => {}
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_find(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &BotDialogue,
    storage: &Arc<JsonStorage>,
    summaries: &Arc<ReviewSummaryService>,
    item: &str,
    user_id: i64,
    lang: Option<&str>,
) -> HandlerResult {
    match item {
        "menu" => {
            dialogue.update(BotDialogueState::Idle).await?;
            bot.send_message(chat_id, t_lang("menu-title", lang))
                .reply_markup(main_menu(lang))
                .await?;
        }
        "category" => {
            dialogue
                .update(BotDialogueState::SearchSelectingCategory)
                .await?;
            bot.send_message(chat_id, t_lang("choose-category", lang))
                .reply_markup(category_keyboard(lang))
                .await?;
        }
        "search" => {
            dialogue
                .update(BotDialogueState::AwaitingSearchQuery)
                .await?;
            bot.send_message(chat_id, t_lang("search-prompt", lang))
                .await?;
        }
        "random" => {
            // Community submissions plus every catalog card seen so far.
            let known = storage.list_places(None);

            match random_place(&known) {
                Some(place) => {
                    send_place_card(bot, chat_id, &place, storage, summaries, user_id, lang)
                        .await?;
                }
                None => {
                    bot.send_message(chat_id, t_lang("random-empty", lang)).await?;
                }
            }
        }
        "nearby" => {
            bot.send_message(chat_id, t_lang("nearby-coming-soon", lang))
                .await?;
        }
        _ => {}
    }
    Ok(())
}

fn slug_filter(slug: &str) -> Option<String> {
    if slug == "any" {
        None
    } else {
        Some(slug.to_string())
    }
}

async fn handle_category_choice(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &BotDialogue,
    slug: &str,
    lang: Option<&str>,
) -> HandlerResult {
    match dialogue.get().await?.unwrap_or_default() {
        BotDialogueState::SearchSelectingCategory => {
            dialogue
                .update(BotDialogueState::SearchSelectingPrice {
                    category: slug_filter(slug),
                })
                .await?;
            bot.send_message(chat_id, t_lang("choose-price", lang))
                .reply_markup(price_keyboard(lang))
                .await?;
        }
        BotDialogueState::AddSelectingCategory { name } => {
            dialogue
                .update(BotDialogueState::AddAwaitingAddress {
                    name,
                    category: slug_filter(slug),
                })
                .await?;
            bot.send_message(chat_id, t_lang("add-address-prompt", lang))
                .await?;
        }
        _ => {
            bot.send_message(chat_id, t_lang("no-active-search", lang))
                .await?;
        }
    }
    Ok(())
}

async fn handle_price_choice(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &BotDialogue,
    slug: &str,
    lang: Option<&str>,
) -> HandlerResult {
    match dialogue.get().await?.unwrap_or_default() {
        BotDialogueState::SearchSelectingPrice { category } => {
            dialogue
                .update(BotDialogueState::SearchSelectingRating {
                    category,
                    price: slug_filter(slug),
                })
                .await?;
            bot.send_message(chat_id, t_lang("choose-rating", lang))
                .reply_markup(rating_keyboard(lang))
                .await?;
        }
        BotDialogueState::AddSelectingPrice {
            name,
            category,
            address,
            description,
        } => {
            let draft = PlaceDraft {
                name,
                category,
                address,
                description,
                price_level: slug_filter(slug),
            };
            let summary = confirmation_text(&draft, lang);
            dialogue
                .update(BotDialogueState::AddAwaitingConfirm { draft })
                .await?;
            bot.send_message(chat_id, summary).await?;
        }
        _ => {
            bot.send_message(chat_id, t_lang("no-active-search", lang))
                .await?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_rating_choice(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &BotDialogue,
    storage: &Arc<JsonStorage>,
    client: &Arc<PlacesApiClient>,
    summaries: &Arc<ReviewSummaryService>,
    slug: &str,
    user_id: i64,
    lang: Option<&str>,
) -> HandlerResult {
    let BotDialogueState::SearchSelectingRating { category, price } =
        dialogue.get().await?.unwrap_or_default()
    else {
        bot.send_message(chat_id, t_lang("no-active-search", lang))
            .await?;
        return Ok(());
    };

    let min_rating = MIN_RATINGS
        .iter()
        .find(|(s, _)| *s == slug)
        .and_then(|(_, min)| *min);

    info!(
        "User {user_id} guided search: category={category:?} price={price:?} min_rating={min_rating:?}"
    );

    // The catalog filters category server-side; price and rating are
    // bot-side concepts applied to the merged list. Without a category
    // the catalog has nothing to go on, so only local data is searched.
    let api_places: Vec<Place> = match category.as_deref().and_then(osm_category) {
        Some(osm) => {
            let api_results = client.search_places(None, Some(osm), 20).await;
            api_results.iter().map(Place::from_api).collect()
        }
        None => Vec::new(),
    };

    let local = filter_places(
        storage.list_places(None),
        &SearchFilters {
            category: category.clone(),
            ..Default::default()
        },
    );

    let merged = filter_places(
        merge_results(api_places, local),
        &SearchFilters {
            price_level: price,
            min_rating,
            ..Default::default()
        },
    );

    present_results(
        bot, chat_id, dialogue, merged, storage, summaries, user_id, lang,
    )
    .await
}

async fn handle_next(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &BotDialogue,
    storage: &Arc<JsonStorage>,
    summaries: &Arc<ReviewSummaryService>,
    user_id: i64,
    lang: Option<&str>,
) -> HandlerResult {
    let BotDialogueState::Browsing { place_ids, index } = dialogue.get().await?.unwrap_or_default()
    else {
        bot.send_message(chat_id, t_lang("no-active-search", lang))
            .await?;
        return Ok(());
    };

    let next = index + 1;
    let Some(place) = place_ids.get(next).and_then(|id| storage.get_place(id)) else {
        dialogue.update(BotDialogueState::Idle).await?;
        bot.send_message(chat_id, t_lang("results-exhausted", lang))
            .await?;
        return Ok(());
    };

    send_place_card(bot, chat_id, &place, storage, summaries, user_id, lang).await?;
    dialogue
        .update(BotDialogueState::Browsing {
            place_ids,
            index: next,
        })
        .await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_place_action(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &BotDialogue,
    storage: &Arc<JsonStorage>,
    client: &Arc<PlacesApiClient>,
    place_id: &str,
    action: &str,
    user_id: i64,
    lang: Option<&str>,
) -> HandlerResult {
    match action {
        "favorite" => {
            let added = storage.toggle_favorite(user_id, place_id);
            let key = if added {
                "favorites-added"
            } else {
                "favorites-removed"
            };
            bot.send_message(chat_id, t_lang(key, lang)).await?;
        }
        "reviews" => {
            let reviews = storage.list_reviews(place_id, Some(status::APPROVED));
            if reviews.is_empty() {
                bot.send_message(chat_id, t_lang("reviews-empty", lang))
                    .await?;
            } else {
                let mut lines = vec![t_lang("reviews-title", lang)];
                lines.extend(reviews.iter().take(5).map(|review| {
                    if review.text.is_empty() {
                        format!("• {:.0} ⭐", review.rating)
                    } else {
                        format!("• {:.0} ⭐ {}", review.rating, review.text)
                    }
                }));
                bot.send_message(chat_id, lines.join("\n")).await?;
            }
        }
        "address" => {
            let mut place = storage.get_place(place_id);
            // A stale cached card may lack an address the catalog has.
            if place.as_ref().is_none_or(|p| p.address.is_none()) {
                if let Ok(api_id) = uuid::Uuid::parse_str(place_id) {
                    if let Some(fresh) = client.get_place(api_id).await {
                        place = Some(Place::from_api_place(&fresh));
                    }
                }
            }

            let text = match place.as_ref().and_then(|p| p.address.clone()) {
                Some(address) => match place.as_ref().and_then(|p| p.contacts.clone()) {
                    Some(contacts) => format!("📍 {address}\n📞 {contacts}"),
                    None => format!("📍 {address}"),
                },
                None => t_lang("address-unknown", lang),
            };
            bot.send_message(chat_id, text).await?;
        }
        "like" => {
            storage.record_like(user_id, place_id, 1);
            bot.send_message(chat_id, t_lang("like-recorded", lang))
                .await?;
        }
        "dislike" => {
            storage.record_like(user_id, place_id, -1);
            bot.send_message(chat_id, t_lang("dislike-recorded", lang))
                .await?;
        }
        "rate" => {
            dialogue
                .update(BotDialogueState::AwaitingRating {
                    place_id: place_id.to_string(),
                })
                .await?;
            bot.send_message(chat_id, t_lang("rate-prompt", lang))
                .await?;
        }
        _ => {}
    }
    Ok(())
}

async fn handle_profile(
    bot: &Bot,
    chat_id: ChatId,
    storage: &Arc<JsonStorage>,
    item: &str,
    user_id: i64,
    lang: Option<&str>,
) -> HandlerResult {
    let (places, empty_key) = match item {
        "favorites" => (storage.list_favorites(user_id), "favorites-empty"),
        "mine" => (storage.list_user_places(user_id), "my-places-empty"),
        _ => return Ok(()),
    };

    if places.is_empty() {
        bot.send_message(chat_id, t_lang(empty_key, lang)).await?;
    } else {
        let lines: Vec<String> = places
            .iter()
            .map(|place| format_place_line(place, lang))
            .collect();
        bot.send_message(chat_id, lines.join("\n")).await?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_moderation(
    bot: &Bot,
    chat_id: ChatId,
    storage: &Arc<JsonStorage>,
    admin_ids: &AdminIds,
    place_id: &str,
    verdict: &str,
    user_id: i64,
    lang: Option<&str>,
) -> HandlerResult {
    if !admin_ids.contains(user_id as u64) {
        bot.send_message(chat_id, t_lang("admin-no-rights", lang))
            .await?;
        return Ok(());
    }

    let new_status = match verdict {
        "approve" => status::APPROVED,
        "reject" => status::REJECTED,
        _ => return Ok(()),
    };

    match storage.set_place_status(place_id, new_status) {
        Some(place) => {
            info!("Moderator {user_id} set place '{}' to {new_status}", place.name);
            let key = if new_status == status::APPROVED {
                "admin-approved"
            } else {
                "admin-rejected"
            };
            bot.send_message(chat_id, t_args_lang(key, &[("name", place.name.as_str())], lang))
                .await?;
        }
        None => {
            bot.send_message(chat_id, t_lang("admin-place-not-found", lang))
                .await?;
        }
    }
    Ok(())
}
