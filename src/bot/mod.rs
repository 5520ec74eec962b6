//! Telegram bot: menus, guided search, community submissions.

pub mod callback_handler;
pub mod dialogue;
pub mod message_handler;
pub mod models;
pub mod recommend;
pub mod storage;
pub mod ui_builder;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;

use crate::bot::dialogue::{BotDialogue, BotDialogueState};
use crate::bot::models::{status, Place};
use crate::bot::recommend::ReviewSummaryService;
use crate::bot::storage::JsonStorage;
use crate::bot::ui_builder::{format_place_card, place_actions};
use crate::localization::t_lang;

pub type HandlerResult = Result<()>;

/// Telegram user ids allowed to moderate submissions.
#[derive(Debug, Clone, Default)]
pub struct AdminIds(pub HashSet<u64>);

impl AdminIds {
    pub fn contains(&self, user_id: u64) -> bool {
        self.0.contains(&user_id)
    }
}

/// Send one place card with its action keyboard.
pub async fn send_place_card(
    bot: &Bot,
    chat_id: ChatId,
    place: &Place,
    storage: &JsonStorage,
    summaries: &ReviewSummaryService,
    user_id: i64,
    lang: Option<&str>,
) -> HandlerResult {
    storage.cache_place(place);

    let reviews = storage.list_reviews(&place.id, Some(status::APPROVED));
    let summary = summaries.summarize(place, &reviews, lang);
    let text = format_place_card(place, &summary, lang);
    let keyboard = place_actions(&place.id, storage.is_favorite(user_id, &place.id), lang);

    bot.send_message(chat_id, text)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

/// Show the first card of a result set and remember the rest for the
/// "next" button.
pub async fn present_results(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: &BotDialogue,
    places: Vec<Place>,
    storage: &Arc<JsonStorage>,
    summaries: &Arc<ReviewSummaryService>,
    user_id: i64,
    lang: Option<&str>,
) -> HandlerResult {
    if places.is_empty() {
        dialogue.update(BotDialogueState::Idle).await?;
        bot.send_message(chat_id, t_lang("search-no-results", lang))
            .await?;
        return Ok(());
    }

    for place in &places {
        storage.cache_place(place);
    }

    send_place_card(bot, chat_id, &places[0], storage, summaries, user_id, lang).await?;

    let place_ids = places.into_iter().map(|place| place.id).collect();
    dialogue
        .update(BotDialogueState::Browsing {
            place_ids,
            index: 0,
        })
        .await?;
    Ok(())
}
