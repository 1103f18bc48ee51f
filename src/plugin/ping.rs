use crate::{
    context::{Context, ShardManagerKey},
    event::{Event, EventHandled},
    plugin::{usage_line, Plugin},
};
use anyhow::Result;
use std::time::Duration;

pub struct Ping;

/// Latest heartbeat round-trip of the shard this event arrived on.  None until the gateway has
/// acknowledged a heartbeat.
async fn heartbeat_latency(ctx: &Context<'_>) -> Option<Duration> {
    let data = ctx.cache_http.data.read().await;
    let shard_manager = data.get::<ShardManagerKey>()?;
    let runners = shard_manager.runners.lock().await;
    runners.get(&ctx.cache_http.shard_id)?.latency
}

fn pong(latency: Option<Duration>) -> String {
    match latency {
        Some(latency) => format!("Pong! {}ms", latency.as_millis()),
        None => "Pong! (no heartbeat yet)".to_owned(),
    }
}

#[serenity::async_trait]
impl Plugin for Ping {
    fn name(&self) -> &'static str {
        "ping"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        Some(usage_line(ctx, self.name(), "show gateway latency").await)
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let latency = heartbeat_latency(ctx).await;
        msg.channel_id.say(ctx.cache_http, pong(latency)).await?;
        Ok(EventHandled::Yes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pong_reports_millis() {
        assert_eq!(pong(Some(Duration::from_millis(42))), "Pong! 42ms");
        assert_eq!(pong(None), "Pong! (no heartbeat yet)");
    }
}
