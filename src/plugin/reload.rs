use crate::{
    context::Context,
    event::{Event, EventHandled},
    log_internal,
    plugin::{usage_line, Plugin},
};
use anyhow::Result;

pub struct Reload;

#[serenity::async_trait]
impl Plugin for Reload {
    fn name(&self) -> &'static str {
        "reload"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        Some(usage_line(ctx, self.name(), "reload config (prefix and owners)").await)
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some(_) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        // Timings and the state file are fixed for the session; only the command settings apply.
        ctx.cfg.write().await.reload().await?;
        log_internal!("Configuration reloaded");
        Ok(EventHandled::Yes)
    }
}
