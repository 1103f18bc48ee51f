use crate::{
    context::Context,
    event::{Event, EventHandled},
};
use anyhow::Result;

mod audio;
mod autovoc_commands;
mod debug;
mod help;
mod ping;
mod presence;
mod ready;
mod reconnect;
mod reload;
mod voice_commands;

#[serenity::async_trait]
pub trait Plugin: Sync + Send {
    /// Plugin name.  Used for debug, and as the command word for command plugins
    fn name(&self) -> &'static str;
    /// Help message line.  None if no help message
    async fn usage(&self, ctx: &Context) -> Option<String>;
    /// Potentially handle event.  Returns:
    /// - Ok(EventHandled::Yes) if the event has been handled and no other plugin should attempt to
    /// handle it
    /// - Ok(EventHandled::No) if another plugin should attempt to handle the event
    /// - Err if an error occurred
    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled>;
}

/// Ordered list of available plugins
pub fn plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        // Core operations
        Box::new(debug::Debug),
        Box::new(ready::Ready),
        Box::new(help::Help),
        Box::new(reload::Reload),
        // Keep the account in its configured voice channels
        Box::new(reconnect::Reconnect),
        Box::new(autovoc_commands::AutoVocEnable),
        Box::new(autovoc_commands::AutoVocStop),
        Box::new(autovoc_commands::AutoVocList),
        Box::new(autovoc_commands::AutoVocRemove),
        Box::new(voice_commands::Join),
        Box::new(voice_commands::Leave),
        // Server-side voice toggles
        Box::new(audio::MUTE),
        Box::new(audio::UNMUTE),
        Box::new(audio::DEAF),
        Box::new(audio::UNDEAF),
        // Presence
        Box::new(presence::Rpc),
        Box::new(presence::RpcGame),
        Box::new(presence::RpcStop),
        Box::new(ping::Ping),
    ]
}

/// `<prefix><cmd> - <description>`, with the prefix currently configured.
pub async fn usage_line(ctx: &Context<'_>, cmd: &str, description: &str) -> String {
    let prefix = &ctx.cfg.read().await.general.command_prefix;
    format!("{}{} - {}", prefix, cmd, description)
}
