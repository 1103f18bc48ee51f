use crate::{
    context::Context,
    event::{Event, EventHandled},
    log_internal,
    logging::PrintColor,
    plugin::Plugin,
};
use anyhow::Result;

/// Startup banner once the connection to Discord is ready.
pub struct Ready;

#[serenity::async_trait]
impl Plugin for Ready {
    fn name(&self) -> &'static str {
        "ready"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::Ready(ready) = event else {
            return Ok(EventHandled::No);
        };

        let prefix = ctx.cfg.read().await.general.command_prefix.clone();
        let configured = ctx.autovoc.list().await.len();

        log_internal!("Logged in as {} ({})", ready.user.color(), ready.user.id);
        log_internal!("Command prefix: {}", prefix);
        log_internal!(
            "Auto-reconnect configured for {} guild(s), {} visible",
            configured,
            ready.guilds.len()
        );

        Ok(EventHandled::Yes)
    }
}
