use crate::{
    context::Context,
    event::{Event, EventHandled},
    log_internal,
    logging::PrintIdColor,
    plugin::{usage_line, Plugin},
};
use anyhow::Result;
use serenity::all::EditMember;

/// Server-side mute or deafen of our own account in the current guild.
pub struct ServerVoiceToggle {
    name: &'static str,
    alias: Option<&'static str>,
    description: &'static str,
    mute: Option<bool>,
    deafen: Option<bool>,
}

pub const MUTE: ServerVoiceToggle = ServerVoiceToggle {
    name: "mute",
    alias: Some("mic_mute"),
    description: "server-mute your microphone (alias: mic_mute)",
    mute: Some(true),
    deafen: None,
};

pub const UNMUTE: ServerVoiceToggle = ServerVoiceToggle {
    name: "unmute",
    alias: Some("mic_unmute"),
    description: "undo a server mute (alias: mic_unmute)",
    mute: Some(false),
    deafen: None,
};

pub const DEAF: ServerVoiceToggle = ServerVoiceToggle {
    name: "deaf",
    alias: None,
    description: "server-deafen yourself",
    mute: None,
    deafen: Some(true),
};

pub const UNDEAF: ServerVoiceToggle = ServerVoiceToggle {
    name: "undeaf",
    alias: None,
    description: "undo a server deafen",
    mute: None,
    deafen: Some(false),
};

#[serenity::async_trait]
impl Plugin for ServerVoiceToggle {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn usage(&self, ctx: &Context) -> Option<String> {
        Some(usage_line(ctx, self.name, self.description).await)
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let mut cmds = vec![self.name];
        cmds.extend(self.alias);
        let Some((msg, _)) = event.is_any_bot_cmd(ctx, &cmds).await else {
            return Ok(EventHandled::No);
        };
        let Some(guild_id) = msg.guild_id else {
            return Ok(EventHandled::Yes);
        };

        let mut edit = EditMember::new();
        if let Some(mute) = self.mute {
            edit = edit.mute(mute);
        }
        if let Some(deafen) = self.deafen {
            edit = edit.deafen(deafen);
        }

        let me = ctx.cache.current_user().id;
        guild_id.edit_member(ctx.cache_http, me, edit).await?;
        log_internal!("{} in {}", self.name, guild_id.id_color());
        Ok(EventHandled::Yes)
    }
}
