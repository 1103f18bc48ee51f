use crate::{
    context::Context,
    event::{Event, EventHandled},
    log_error, log_internal,
    plugin::{usage_line, Plugin},
};
use anyhow::Result;
use serenity::all::ActivityData;

// Streaming activities need a stream URL to show up as such.
const STREAM_URL: &str = "https://www.twitch.tv/discord";

/// `rpc <type> <text>`
pub struct Rpc;

/// `rpc_game <text>`
pub struct RpcGame;

/// `rpc_stop`
pub struct RpcStop;

/// Build an activity from a type name and its text.  Unknown types are "playing".
fn activity(kind: &str, text: &str) -> Result<ActivityData> {
    Ok(match kind.to_lowercase().as_str() {
        "streaming" => ActivityData::streaming(text, STREAM_URL)?,
        "listening" => ActivityData::listening(text),
        "watching" => ActivityData::watching(text),
        "competing" => ActivityData::competing(text),
        _ => ActivityData::playing(text),
    })
}

#[serenity::async_trait]
impl Plugin for Rpc {
    fn name(&self) -> &'static str {
        "rpc"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        Some(
            usage_line(
                ctx,
                "rpc <type> <text>",
                "set your activity\n\
                 |  Types: playing, streaming, listening, watching, competing",
            )
            .await,
        )
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((_, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let Some((kind, text)) = args.split_once(char::is_whitespace) else {
            log_error!("Usage: rpc <type> <text>");
            return Ok(EventHandled::Yes);
        };
        let text = text.trim();

        ctx.cache_http.set_activity(Some(activity(kind, text)?));
        log_internal!("Activity set: {} {}", kind, text);
        Ok(EventHandled::Yes)
    }
}

#[serenity::async_trait]
impl Plugin for RpcGame {
    fn name(&self) -> &'static str {
        "rpc_game"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        Some(usage_line(ctx, "rpc_game <game>", "shortcut for `rpc playing <game>`").await)
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((_, game)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };
        if game.is_empty() {
            log_error!("Usage: rpc_game <game>");
            return Ok(EventHandled::Yes);
        }

        ctx.cache_http
            .set_activity(Some(ActivityData::playing(game)));
        log_internal!("Playing {}", game);
        Ok(EventHandled::Yes)
    }
}

#[serenity::async_trait]
impl Plugin for RpcStop {
    fn name(&self) -> &'static str {
        "rpc_stop"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        Some(usage_line(ctx, self.name(), "clear your activity").await)
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some(_) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        ctx.cache_http.set_activity(None);
        log_internal!("Activity cleared");
        Ok(EventHandled::Yes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::all::ActivityType;

    #[test]
    fn activity_kinds() {
        assert_eq!(activity("Listening", "x").unwrap().kind, ActivityType::Listening);
        assert_eq!(activity("watching", "x").unwrap().kind, ActivityType::Watching);
        assert_eq!(activity("competing", "x").unwrap().kind, ActivityType::Competing);
        assert_eq!(activity("streaming", "x").unwrap().kind, ActivityType::Streaming);
        assert_eq!(activity("dancing", "x").unwrap().kind, ActivityType::Playing);
        assert_eq!(activity("playing", "chess").unwrap().name, "chess");
    }
}
