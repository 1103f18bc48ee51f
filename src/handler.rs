use crate::{
    config::Config,
    context::{AutoVocService, Context},
    event::Event,
};
use serenity::all::{Message, Ready, VoiceState};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Discord event handler
pub struct Handler {
    cfg: RwLock<Config>,
    autovoc: Arc<AutoVocService>,
}

impl<'a> Handler {
    pub fn new(cfg: Config, autovoc: Arc<AutoVocService>) -> Self {
        Self {
            cfg: RwLock::new(cfg),
            autovoc,
        }
    }

    fn ctx(&'a self, discord_ctx: &'a serenity::all::Context) -> Context<'a> {
        Context {
            cfg: &self.cfg,
            autovoc: &self.autovoc,
            cache: &discord_ctx.cache,
            http: &discord_ctx.http,
            cache_http: discord_ctx,
        }
    }
}

#[serenity::async_trait]
impl serenity::all::EventHandler for Handler {
    async fn ready(&self, discord_ctx: serenity::all::Context, ready: Ready) {
        Event::Ready(ready).handle(self.ctx(&discord_ctx)).await;
    }

    async fn message(&self, discord_ctx: serenity::all::Context, msg: Message) {
        Event::Message(msg).handle(self.ctx(&discord_ctx)).await;
    }

    async fn voice_state_update(
        &self,
        discord_ctx: serenity::all::Context,
        old: Option<VoiceState>,
        new: VoiceState,
    ) {
        Event::VoiceStateUpdate { old, new }
            .handle(self.ctx(&discord_ctx))
            .await;
    }
}
