use crate::{
    context::Context,
    event::{Event, EventHandled},
    plugin::{autovoc_commands::target_channel, usage_line, Plugin},
};
use anyhow::Result;

pub struct Join;

/// Same as `autovoc_stop`: a manual leave shouldn't be undone by the next reconnect.
pub struct Leave;

#[serenity::async_trait]
impl Plugin for Join {
    fn name(&self) -> &'static str {
        "join"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        Some(
            usage_line(
                ctx,
                "join [channel-id]",
                "join a voice channel, by default the one you are in",
            )
            .await,
        )
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };
        if msg.guild_id.is_none() {
            return Ok(EventHandled::Yes);
        }

        if let Some(channel_id) = target_channel(ctx, msg, args) {
            ctx.autovoc.join(channel_id).await;
        }
        Ok(EventHandled::Yes)
    }
}

#[serenity::async_trait]
impl Plugin for Leave {
    fn name(&self) -> &'static str {
        "leave"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        let cooldown = ctx.autovoc.settings().leave_cooldown.as_secs() / 60;
        Some(
            usage_line(
                ctx,
                self.name(),
                &format!(
                    "leave voice, stop auto-reconnecting, and stay out for {} min\n\
                     |  Aliases: quit, leavevc",
                    cooldown
                ),
            )
            .await,
        )
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event
            .is_any_bot_cmd(ctx, &[self.name(), "quit", "leavevc"])
            .await
        else {
            return Ok(EventHandled::No);
        };
        let Some(guild_id) = msg.guild_id else {
            return Ok(EventHandled::Yes);
        };

        ctx.autovoc.disable(guild_id).await;
        Ok(EventHandled::Yes)
    }
}
