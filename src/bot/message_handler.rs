//! Text messages: commands, free-text search, and the typed steps of
//! the guided flows.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;
use uuid::Uuid;

use crate::api_client::PlacesApiClient;
use crate::bot::dialogue::{
    optional_field, validate_place_name, BotDialogue, BotDialogueState, PlaceDraft,
};
use crate::bot::models::{status, utc_now, Place, Review};
use crate::bot::recommend::{filter_places, merge_results, ReviewSummaryService, SearchFilters};
use crate::bot::storage::JsonStorage;
use crate::bot::ui_builder::{
    category_keyboard, format_place_card, main_menu, moderation_keyboard,
};
use crate::bot::{present_results, AdminIds, HandlerResult};
use crate::localization::{t_args_lang, t_lang};

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    storage: Arc<JsonStorage>,
    client: Arc<PlacesApiClient>,
    summaries: Arc<ReviewSummaryService>,
    admin_ids: AdminIds,
) -> HandlerResult {
    let lang = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.clone());
    let lang = lang.as_deref();
    let user_id = msg.from.as_ref().map(|user| user.id.0 as i64).unwrap_or(0);

    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, t_lang("fallback-unknown", lang))
            .await?;
        return Ok(());
    };

    match text {
        "/start" => {
            info!("User {user_id} started the bot");
            dialogue.update(BotDialogueState::Idle).await?;
            bot.send_message(msg.chat.id, t_lang("welcome", lang))
                .reply_markup(main_menu(lang))
                .await?;
        }
        "/menu" => {
            dialogue.update(BotDialogueState::Idle).await?;
            bot.send_message(msg.chat.id, t_lang("menu-title", lang))
                .reply_markup(main_menu(lang))
                .await?;
        }
        "/help" => {
            bot.send_message(msg.chat.id, t_lang("help-text", lang))
                .await?;
        }
        "/admin" => {
            handle_admin_command(&bot, &msg, &storage, &admin_ids, user_id, lang).await?;
        }
        _ => {
            handle_dialogue_text(
                &bot, &msg, &dialogue, &storage, &client, &summaries, user_id, text, lang,
            )
            .await?;
        }
    }

    Ok(())
}

async fn handle_admin_command(
    bot: &Bot,
    msg: &Message,
    storage: &JsonStorage,
    admin_ids: &AdminIds,
    user_id: i64,
    lang: Option<&str>,
) -> HandlerResult {
    if !admin_ids.contains(user_id as u64) {
        bot.send_message(msg.chat.id, t_lang("admin-no-rights", lang))
            .await?;
        return Ok(());
    }

    let pending = storage.list_pending_places();
    if pending.is_empty() {
        bot.send_message(msg.chat.id, t_lang("admin-empty", lang))
            .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, t_lang("admin-title", lang))
        .await?;
    for place in pending {
        bot.send_message(msg.chat.id, format_place_card(&place, "", lang))
            .reply_markup(moderation_keyboard(&place.id, lang))
            .await?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_dialogue_text(
    bot: &Bot,
    msg: &Message,
    dialogue: &BotDialogue,
    storage: &Arc<JsonStorage>,
    client: &Arc<PlacesApiClient>,
    summaries: &Arc<ReviewSummaryService>,
    user_id: i64,
    text: &str,
    lang: Option<&str>,
) -> HandlerResult {
    let state = dialogue.get().await?.unwrap_or_default();

    match state {
        BotDialogueState::AwaitingSearchQuery => {
            info!("User {user_id} searches for '{text}'");
            let api_results = client.search_places(Some(text), None, 10).await;
            let api_places: Vec<Place> = api_results.iter().map(Place::from_api).collect();

            let filters = SearchFilters {
                query: Some(text.to_string()),
                ..Default::default()
            };
            let local = filter_places(storage.list_places(None), &filters);

            let merged = merge_results(api_places, local);
            present_results(
                bot, msg.chat.id, dialogue, merged, storage, summaries, user_id, lang,
            )
            .await?;
        }
        BotDialogueState::AwaitingRating { place_id } => {
            let Ok(rating) = text.trim().parse::<i16>() else {
                bot.send_message(msg.chat.id, t_lang("rate-invalid", lang))
                    .await?;
                return Ok(());
            };
            if !(1..=5).contains(&rating) {
                bot.send_message(msg.chat.id, t_lang("rate-invalid", lang))
                    .await?;
                return Ok(());
            }

            storage.add_review(Review {
                id: Uuid::new_v4().to_string(),
                place_id: place_id.clone(),
                user_id,
                rating: f64::from(rating),
                text: String::new(),
                status: status::APPROVED.to_string(),
                created_at: utc_now(),
            });
            // Catalog places also get the rating relayed upstream.
            if let Ok(api_id) = Uuid::parse_str(&place_id) {
                client.submit_rating(api_id, user_id, rating).await;
            }

            dialogue.update(BotDialogueState::Idle).await?;
            bot.send_message(msg.chat.id, t_lang("rate-saved", lang))
                .await?;
        }
        BotDialogueState::AddAwaitingName => {
            let Some(name) = validate_place_name(text) else {
                bot.send_message(msg.chat.id, t_lang("add-name-invalid", lang))
                    .await?;
                return Ok(());
            };
            dialogue
                .update(BotDialogueState::AddSelectingCategory { name })
                .await?;
            bot.send_message(msg.chat.id, t_lang("add-category-prompt", lang))
                .reply_markup(category_keyboard(lang))
                .await?;
        }
        BotDialogueState::AddAwaitingAddress { name, category } => {
            let address = optional_field(text);
            dialogue
                .update(BotDialogueState::AddAwaitingDescription {
                    name,
                    category,
                    address,
                })
                .await?;
            bot.send_message(msg.chat.id, t_lang("add-description-prompt", lang))
                .await?;
        }
        BotDialogueState::AddAwaitingDescription {
            name,
            category,
            address,
        } => {
            let description = optional_field(text);
            dialogue
                .update(BotDialogueState::AddSelectingPrice {
                    name,
                    category,
                    address,
                    description,
                })
                .await?;
            bot.send_message(msg.chat.id, t_lang("add-price-prompt", lang))
                .reply_markup(crate::bot::ui_builder::price_keyboard(lang))
                .await?;
        }
        BotDialogueState::AddAwaitingConfirm { draft } => {
            handle_submission_confirm(bot, msg, dialogue, storage, user_id, text, draft, lang)
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, t_lang("fallback-unknown", lang))
                .await?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn handle_submission_confirm(
    bot: &Bot,
    msg: &Message,
    dialogue: &BotDialogue,
    storage: &Arc<JsonStorage>,
    user_id: i64,
    text: &str,
    draft: PlaceDraft,
    lang: Option<&str>,
) -> HandlerResult {
    match text.trim().to_lowercase().as_str() {
        "yes" | "y" | "да" | "д" => {
            let place = Place {
                id: Uuid::new_v4().to_string(),
                name: draft.name,
                category: draft.category,
                address: draft.address,
                description: draft.description,
                price_level: draft.price_level,
                rating: 0.0,
                status: status::PENDING.to_string(),
                created_by: Some(user_id),
                created_at: Some(utc_now()),
                contacts: None,
                latitude: None,
                longitude: None,
                score: None,
            };
            info!("User {user_id} submitted place '{}'", place.name);
            storage.upsert_place(place);

            dialogue.update(BotDialogueState::Idle).await?;
            bot.send_message(msg.chat.id, t_lang("add-saved", lang))
                .reply_markup(main_menu(lang))
                .await?;
        }
        "no" | "n" | "нет" | "н" => {
            dialogue.update(BotDialogueState::Idle).await?;
            bot.send_message(msg.chat.id, t_lang("add-cancelled", lang))
                .reply_markup(main_menu(lang))
                .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, t_lang("confirm-hint", lang))
                .await?;
        }
    }
    Ok(())
}

/// The confirmation summary sent before a draft is submitted.
pub fn confirmation_text(draft: &PlaceDraft, lang: Option<&str>) -> String {
    let not_specified = t_lang("not-specified", lang);
    let category = draft
        .category
        .as_deref()
        .map(|slug| crate::bot::ui_builder::category_label(slug, lang))
        .unwrap_or_else(|| not_specified.clone());
    let price = draft
        .price_level
        .as_deref()
        .map(|slug| crate::bot::ui_builder::price_label(slug, lang))
        .unwrap_or_else(|| not_specified.clone());
    let address = draft.address.clone().unwrap_or(not_specified);

    t_args_lang(
        "add-confirm",
        &[
            ("name", draft.name.as_str()),
            ("category", category.as_str()),
            ("address", address.as_str()),
            ("price", price.as_str()),
        ],
        lang,
    )
}
