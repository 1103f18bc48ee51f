use crate::{
    context::Context,
    event::{Event, EventHandled},
    log_event,
    logging::*,
    plugin::Plugin,
};
use anyhow::Result;
use serenity::all::UserId;

/// Prints debug information about our own account's activity to stdout
pub struct Debug;

/// Everything other accounts do in our guilds is noise here.
fn is_own_activity(event: &Event, me: UserId) -> bool {
    match event {
        Event::Ready(_) => true,
        Event::Message(msg) => msg.author.id == me,
        Event::VoiceStateUpdate { new, .. } => new.user_id == me,
    }
}

#[serenity::async_trait]
impl Plugin for Debug {
    fn name(&self) -> &'static str {
        "debug"
    }

    async fn usage(&self, _ctx: &Context) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context, event: &Event) -> Result<EventHandled> {
        let me = ctx.cache.current_user().id;
        if !is_own_activity(event, me) {
            return Ok(EventHandled::No);
        }

        match event {
            Event::Ready(ready) => {
                log_event!(
                    "Connected to {} server(s) as {}",
                    ready.guilds.len(),
                    ready.user.color(),
                );
            }
            Event::Message(msg) => {
                let prefix = ctx.cfg.read().await.general.command_prefix.clone();
                if msg.content.starts_with(&prefix) {
                    log_event!(
                        "{}{}{}{}{} {}",
                        msg.guild_id.color(ctx.http).await,
                        Glue {}.color(),
                        msg.channel_id.color(ctx.http).await,
                        Glue {}.color(),
                        msg.author.color(),
                        msg.content,
                    );
                }
            }
            Event::VoiceStateUpdate { old, new } => {
                match (old.as_ref().and_then(|old| old.channel_id), new.channel_id) {
                    (Some(old_id), Some(new_id)) if old_id == new_id => {
                        // State change within same channel, e.g. mute/unmute
                        // Not currently debug logging this
                    }
                    (Some(old_id), Some(new_id)) => log_event!(
                        "Moved VC channel from \"{}\" to \"{}\" in {}",
                        old_id.color(ctx.http).await,
                        new_id.color(ctx.http).await,
                        new.guild_id.color(ctx.http).await,
                    ),
                    (Some(old_id), None) => log_event!(
                        "Left VC channel \"{}\" in {}",
                        old_id.color(ctx.http).await,
                        new.guild_id.color(ctx.http).await,
                    ),
                    (None, Some(new_id)) => log_event!(
                        "Joined VC channel \"{}\" in {}",
                        new_id.color(ctx.http).await,
                        new.guild_id.color(ctx.http).await,
                    ),
                    (None, None) => log_event!("Unknown voice state update"),
                }
            }
        }

        Ok(EventHandled::No)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::voice_state;

    #[test]
    fn only_own_voice_states_are_logged() {
        let me = UserId::new(1);

        let mine = Event::VoiceStateUpdate {
            old: None,
            new: voice_state(1, Some(123), Some(456)),
        };
        assert!(is_own_activity(&mine, me));

        let theirs = Event::VoiceStateUpdate {
            old: Some(voice_state(2, Some(123), None)),
            new: voice_state(2, Some(123), Some(456)),
        };
        assert!(!is_own_activity(&theirs, me));
    }
}
