//! Miscellaneous convenience methods

use crate::context::Context;
use serenity::all::ChannelId;

#[serenity::async_trait]
pub trait MessageHelper {
    async fn is_from_owner(&self, ctx: &Context) -> bool;
    fn author_voice_channel(&self, ctx: &Context) -> Option<ChannelId>;
    async fn delete_quietly(&self, ctx: &Context);
}

#[serenity::async_trait]
impl MessageHelper for serenity::all::Message {
    /// Commands are taken from the account we run as, plus any configured owners.
    async fn is_from_owner(&self, ctx: &Context) -> bool {
        if self.author.id == ctx.cache.current_user().id {
            return true;
        }

        ctx.cfg.read().await.general.owners.contains(&self.author.id)
    }

    /// Voice channel the author is sitting in within the message's guild, per the cache.
    fn author_voice_channel(&self, ctx: &Context) -> Option<ChannelId> {
        let guild = self.guild(ctx.cache)?;
        guild
            .voice_states
            .get(&self.author.id)
            .and_then(|state| state.channel_id)
    }

    /// Commands shouldn't leave traces in the channel.  Not being allowed to delete is fine.
    async fn delete_quietly(&self, ctx: &Context) {
        let _ = self.delete(ctx.cache_http).await;
    }
}
