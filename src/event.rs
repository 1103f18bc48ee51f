//! The Serenity crate we're using for the Discord API is designed around callbacks to handle
//! events.  The handler translates those callbacks into this Event enum, which is then offered to
//! each plugin in turn.

use crate::{context::Context, helper::MessageHelper, log_error};
use serenity::all::{Message, Ready, VoiceState};

/// A Discord event
pub enum Event {
    Ready(Ready),
    Message(Message),
    VoiceStateUpdate {
        old: Option<VoiceState>,
        new: VoiceState,
    },
}

impl Event {
    // When an event occurs, iterate over all the plugins to see if any can/should handle it.
    pub async fn handle(self, ctx: Context<'_>) {
        let mut processed = false;

        for plugin in crate::plugin::plugins() {
            match plugin.handle(&ctx, &self).await {
                Ok(EventHandled::Yes) => {
                    processed = true;
                    break;
                }
                Ok(EventHandled::No) => continue,
                Err(err) => {
                    processed = true;
                    log_error!("Error in plugin {}: {:#}", plugin.name(), err);
                }
            }
        }

        // Whatever the outcome, a processed command message goes away.
        if let Event::Message(msg) = &self {
            if processed && self.command_name(&ctx).await.is_some() {
                msg.delete_quietly(&ctx).await;
            }
        }
    }

    /// The command word of a prefixed message, e.g. `join` for `&join 123`.
    async fn command_name(&self, ctx: &Context<'_>) -> Option<&str> {
        let Event::Message(msg) = self else {
            return None;
        };
        let prefix = ctx.cfg.read().await.general.command_prefix.clone();
        split_command(&msg.content, &prefix).map(|(name, _)| name)
    }

    // Check if a message should be interpreted as a bot command.
    //
    // These are prefixed with the configured prefix, e. g. `&cmd foo bar baz`, and only accepted
    // from ourselves or an owner.  Returns the message along with everything after the command
    // word.
    pub async fn is_bot_cmd(&self, ctx: &Context<'_>, cmd: &str) -> Option<(&Message, &str)> {
        self.is_any_bot_cmd(ctx, &[cmd]).await
    }

    pub async fn is_any_bot_cmd(
        &self,
        ctx: &Context<'_>,
        cmds: &[&str],
    ) -> Option<(&Message, &str)> {
        let Event::Message(msg) = self else {
            return None;
        };

        let prefix = ctx.cfg.read().await.general.command_prefix.clone();
        let (name, args) = split_command(&msg.content, &prefix)?;
        if !cmds.contains(&name) {
            return None;
        }

        if !msg.is_from_owner(ctx).await {
            return None;
        }

        Some((msg, args))
    }
}

/// Split `<prefix><name> <args...>` into the command name and the trimmed remainder.
fn split_command<'a>(content: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    if prefix.is_empty() {
        return None;
    }
    let rest = content.strip_prefix(prefix)?;
    let name = rest.split_whitespace().next()?;
    // A space right after the prefix means it isn't a command, e.g. "& so on".
    if !rest.starts_with(name) {
        return None;
    }
    Some((name, rest[name.len()..].trim()))
}

pub enum EventHandled {
    Yes,
    No,
}

#[cfg(test)]
mod tests {
    use super::split_command;

    #[test]
    fn splits_name_and_args() {
        assert_eq!(split_command("&join 123", "&"), Some(("join", "123")));
        assert_eq!(
            split_command("&rpc listening  some  song ", "&"),
            Some(("rpc", "listening  some  song"))
        );
        assert_eq!(split_command("&leave", "&"), Some(("leave", "")));
    }

    #[test]
    fn rejects_non_commands() {
        assert_eq!(split_command("join 123", "&"), None);
        assert_eq!(split_command("& join", "&"), None);
        assert_eq!(split_command("&", "&"), None);
        assert_eq!(split_command("&join", ""), None);
    }

    #[test]
    fn multi_char_prefix() {
        assert_eq!(split_command("!!ping", "!!"), Some(("ping", "")));
        assert_eq!(split_command("!ping", "!!"), None);
    }
}
