mod autovoc;
mod config;
mod context;
mod event;
mod handler;
mod helper;
mod logging;
mod persistent_state;
mod plugin;
#[cfg(test)]
mod test_utils;
mod voice;
mod volatile_state;

use serenity::{
    all::{GatewayIntents, Http},
    Client,
};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = crate::config::Config::load().await?;
    let token = cfg.general.discord_token.clone();

    let channels = crate::persistent_state::AutoVocMap::load(cfg.state_path()?).await;
    let songbird = Songbird::serenity();
    let backend = crate::voice::SongbirdBackend::new(songbird.clone(), Arc::new(Http::new(&token)));
    let autovoc = crate::autovoc::AutoVoc::new(channels, backend, cfg.autovoc.settings());
    let handler = handler::Handler::new(cfg, Arc::new(autovoc));

    // Things we want discord to tell us about.
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;
    client
        .data
        .write()
        .await
        .insert::<crate::context::ShardManagerKey>(client.shard_manager.clone());

    client.start().await.map_err(Into::into)
}
