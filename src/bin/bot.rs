//! Telegram bot entry point.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nomad_places::api_client::PlacesApiClient;
use nomad_places::bot::callback_handler::callback_handler;
use nomad_places::bot::dialogue::BotDialogueState;
use nomad_places::bot::message_handler::message_handler;
use nomad_places::bot::recommend::ReviewSummaryService;
use nomad_places::bot::storage::JsonStorage;
use nomad_places::bot::AdminIds;
use nomad_places::config::BotSettings;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = BotSettings::from_env()?;
    info!(
        "Starting bot, API at {}, data in {}",
        settings.api_base_url, settings.data_dir
    );

    let storage = Arc::new(JsonStorage::new(Path::new(&settings.data_dir))?);
    let client = Arc::new(PlacesApiClient::new(&settings.api_base_url));
    let summaries = Arc::new(ReviewSummaryService::new());
    let admin_ids = AdminIds(settings.admin_ids.clone());

    let bot = Bot::new(&settings.token);

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<BotDialogueState>, BotDialogueState>()
                .endpoint(message_handler),
        )
        .branch(
            Update::filter_callback_query()
                .enter_dialogue::<CallbackQuery, InMemStorage<BotDialogueState>, BotDialogueState>()
                .endpoint(callback_handler),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![
            storage,
            client,
            summaries,
            admin_ids,
            InMemStorage::<BotDialogueState>::new()
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
