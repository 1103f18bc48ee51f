use crate::{
    autovoc::{Decision, VoiceStateChange},
    context::Context,
    event::{Event, EventHandled},
    plugin::Plugin,
};
use anyhow::Result;

/// Feeds our own voice state changes to the auto-reconnect service.
pub struct Reconnect;

#[serenity::async_trait]
impl Plugin for Reconnect {
    fn name(&self) -> &'static str {
        "reconnect"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Event::VoiceStateUpdate { old, new } = event else {
            return Ok(EventHandled::No);
        };

        let me = ctx.cache.current_user().id;
        let Some(change) = VoiceStateChange::for_account(me, old.as_ref(), new) else {
            return Ok(EventHandled::No);
        };

        match ctx.autovoc.on_voice_state(change).await {
            // The service logs what it scheduled.
            Decision::Reconnect { .. } => Ok(EventHandled::Yes),
            Decision::Ignore(_) => Ok(EventHandled::No),
        }
    }
}
