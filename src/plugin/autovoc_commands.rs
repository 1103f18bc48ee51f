use crate::{
    context::Context,
    event::{Event, EventHandled},
    helper::MessageHelper,
    log_error,
    logging::PrintIdColor,
    persistent_state::parse_id,
    plugin::{usage_line, Plugin},
};
use anyhow::Result;
use serenity::all::{ChannelId, GuildId, Message};

/// `autovoc [channel-id]`: keep this account in a voice channel of the current guild.
pub struct AutoVocEnable;

/// `autovoc_stop`: stop auto-reconnecting here, leave voice, and stay out for a while.
pub struct AutoVocStop;

/// `autovoc_list`: post every configured guild and channel.
pub struct AutoVocList;

/// `autovoc_remove [guild-id]`: forget a guild's channel without leaving voice.
pub struct AutoVocRemove;

/// Channel named by the first argument, else the one the author is sitting in.
pub(super) fn target_channel(ctx: &Context, msg: &Message, args: &str) -> Option<ChannelId> {
    match args.split_whitespace().next() {
        Some(arg) => match parse_id(arg) {
            Some(id) => Some(ChannelId::new(id)),
            None => {
                log_error!("`{}` is not a channel id", arg);
                None
            }
        },
        None => {
            let channel = msg.author_voice_channel(ctx);
            if channel.is_none() {
                log_error!("No channel id given and not in a voice channel");
            }
            channel
        }
    }
}

#[serenity::async_trait]
impl Plugin for AutoVocEnable {
    fn name(&self) -> &'static str {
        "autovoc"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        Some(
            usage_line(
                ctx,
                "autovoc [channel-id]",
                "stay connected to a voice channel in this server\n\
                 |  Without [channel-id], uses the voice channel you are in",
            )
            .await,
        )
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };
        let Some(guild_id) = msg.guild_id else {
            return Ok(EventHandled::Yes);
        };
        let Some(channel_id) = target_channel(ctx, msg, args) else {
            return Ok(EventHandled::Yes);
        };

        // Events for this guild will reconnect to the channel, so it has to live here.
        match ctx.autovoc.gateway().channel_guild(channel_id).await {
            Some(owner) if owner == guild_id => {}
            Some(owner) => {
                log_error!(
                    "{} belongs to {}, not {}",
                    channel_id.id_color(),
                    owner.id_color(),
                    guild_id.id_color()
                );
                return Ok(EventHandled::Yes);
            }
            None => {
                log_error!("{} is not a voice channel", channel_id.id_color());
                return Ok(EventHandled::Yes);
            }
        }

        ctx.autovoc.enable(guild_id, channel_id).await;
        Ok(EventHandled::Yes)
    }
}

#[serenity::async_trait]
impl Plugin for AutoVocStop {
    fn name(&self) -> &'static str {
        "autovoc_stop"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        Some(
            usage_line(
                ctx,
                self.name(),
                "stop auto-reconnecting in this server and leave voice",
            )
            .await,
        )
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };
        let Some(guild_id) = msg.guild_id else {
            return Ok(EventHandled::Yes);
        };

        ctx.autovoc.disable(guild_id).await;
        Ok(EventHandled::Yes)
    }
}

#[serenity::async_trait]
impl Plugin for AutoVocList {
    fn name(&self) -> &'static str {
        "autovoc_list"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        Some(usage_line(ctx, self.name(), "list auto-reconnect channels").await)
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let entries = ctx.autovoc.list().await;
        if entries.is_empty() {
            msg.channel_id
                .say(ctx.cache_http, "No auto-reconnect configured")
                .await?;
            return Ok(EventHandled::Yes);
        }

        let mut reply = String::from("**Auto-reconnect channels:**\n");
        for (guild_id, channel_id) in entries {
            reply.push_str(&format!(
                "- **{}** -> {}\n",
                guild_name(ctx, guild_id),
                channel_name(ctx, channel_id).await
            ));
        }

        msg.channel_id.say(ctx.cache_http, reply).await?;
        Ok(EventHandled::Yes)
    }
}

fn guild_name(ctx: &Context, guild_id: GuildId) -> String {
    guild_id
        .name(ctx.cache)
        .unwrap_or_else(|| format!("Guild {}", guild_id))
}

async fn channel_name(ctx: &Context<'_>, channel_id: ChannelId) -> String {
    channel_id
        .name(ctx.cache_http)
        .await
        .unwrap_or_else(|_| format!("Channel {}", channel_id))
}

#[serenity::async_trait]
impl Plugin for AutoVocRemove {
    fn name(&self) -> &'static str {
        "autovoc_remove"
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        Some(
            usage_line(
                ctx,
                "autovoc_remove [server-id]",
                "forget a server's auto-reconnect channel without leaving voice\n\
                 |  Aliases: autovoc_rm, autovoc_delete",
            )
            .await,
        )
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event
            .is_any_bot_cmd(ctx, &[self.name(), "autovoc_rm", "autovoc_delete"])
            .await
        else {
            return Ok(EventHandled::No);
        };

        let guild_id = match args.split_whitespace().next() {
            Some(arg) => match parse_id(arg) {
                Some(id) => GuildId::new(id),
                None => {
                    log_error!("`{}` is not a server id", arg);
                    return Ok(EventHandled::Yes);
                }
            },
            None => match msg.guild_id {
                Some(guild_id) => guild_id,
                None => return Ok(EventHandled::Yes),
            },
        };

        if !ctx.autovoc.remove(guild_id).await {
            log_error!("No auto-reconnect configured for {}", guild_id.id_color());
        }
        Ok(EventHandled::Yes)
    }
}
