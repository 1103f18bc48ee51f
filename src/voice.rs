//! Idempotent connect/disconnect on top of the platform's voice primitives.

use crate::{
    log_error, log_internal,
    logging::PrintIdColor,
    volatile_state::Cooldowns,
};
use anyhow::{anyhow, Result};
use serenity::all::{ChannelId, ChannelType, GuildId, Http};
use songbird::{error::JoinError, Songbird};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// The raw voice operations of the platform.  Implementations report failures as errors; the
/// gateway decides what to make of them.
#[serenity::async_trait]
pub trait VoiceBackend: Send + Sync + 'static {
    /// Guild owning the voice channel, or None if it doesn't exist or isn't a voice channel.
    async fn channel_guild(&self, channel_id: ChannelId) -> Option<GuildId>;
    /// Channel our session in this guild is currently connected to.
    async fn current_channel(&self, guild_id: GuildId) -> Option<ChannelId>;
    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<()>;
    async fn leave(&self, guild_id: GuildId) -> Result<()>;
}

/// Connects and disconnects voice sessions, turning "already there" and "already gone" into
/// no-ops and refusing guilds under cooldown.  Never returns an error.
pub struct VoiceGateway<B> {
    backend: B,
    cooldowns: Arc<Mutex<Cooldowns>>,
    switch_settle: Duration,
}

impl<B: VoiceBackend> VoiceGateway<B> {
    pub fn new(backend: B, cooldowns: Arc<Mutex<Cooldowns>>, switch_settle: Duration) -> Self {
        Self {
            backend,
            cooldowns,
            switch_settle,
        }
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn channel_guild(&self, channel_id: ChannelId) -> Option<GuildId> {
        self.backend.channel_guild(channel_id).await
    }

    /// Connect to `channel_id`.  Returns the connected channel, or None if the channel is
    /// unresolvable, the guild is cooling down, or the platform refused.
    pub async fn connect(&self, channel_id: ChannelId) -> Option<ChannelId> {
        let Some(guild_id) = self.backend.channel_guild(channel_id).await else {
            log_error!(
                "Cannot connect to {}: not a reachable voice channel",
                channel_id.id_color()
            );
            return None;
        };

        if self.cooling_down(guild_id) {
            log_internal!(
                "Cooldown active for {}, not connecting to {}",
                guild_id.id_color(),
                channel_id.id_color()
            );
            return None;
        }

        match self.backend.current_channel(guild_id).await {
            Some(current) if current == channel_id => {
                log_internal!("Already connected to {}", channel_id.id_color());
                return Some(channel_id);
            }
            Some(current) => {
                // Let the old session's teardown finish before asking for a new one.
                if let Err(e) = self.backend.leave(guild_id).await {
                    log_error!(
                        "Could not leave {} to switch channels: {:#}",
                        current.id_color(),
                        e
                    );
                    return None;
                }
                tokio::time::sleep(self.switch_settle).await;
            }
            None => {}
        }

        match self.backend.join(guild_id, channel_id).await {
            Ok(()) => {
                log_internal!(
                    "Connected to {} in {}",
                    channel_id.id_color(),
                    guild_id.id_color()
                );
                Some(channel_id)
            }
            Err(e) => {
                log_error!("Could not connect to {}: {:#}", channel_id.id_color(), e);
                None
            }
        }
    }

    /// Disconnect whatever session we have in the guild, if any.
    pub async fn disconnect(&self, guild_id: GuildId) {
        if self.backend.current_channel(guild_id).await.is_none() {
            return;
        }

        match self.backend.leave(guild_id).await {
            Ok(()) => log_internal!("Disconnected from {}", guild_id.id_color()),
            Err(e) => log_error!("Could not disconnect from {}: {:#}", guild_id.id_color(), e),
        }
    }

    fn cooling_down(&self, guild_id: GuildId) -> bool {
        self.cooldowns
            .lock()
            .map(|cooldowns| cooldowns.is_active(guild_id))
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_active(guild_id))
    }
}

/// Voice sessions through songbird.  Channels are looked up over HTTP so that resolution also
/// works for channels not (yet) in the cache.
pub struct SongbirdBackend {
    manager: Arc<Songbird>,
    http: Arc<Http>,
}

impl SongbirdBackend {
    pub fn new(manager: Arc<Songbird>, http: Arc<Http>) -> Self {
        Self { manager, http }
    }
}

#[serenity::async_trait]
impl VoiceBackend for SongbirdBackend {
    async fn channel_guild(&self, channel_id: ChannelId) -> Option<GuildId> {
        let channel = channel_id.to_channel(&self.http).await.ok()?.guild()?;
        match channel.kind {
            ChannelType::Voice | ChannelType::Stage => Some(channel.guild_id),
            _ => None,
        }
    }

    async fn current_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        let call = self.manager.get(guild_id)?;
        let channel = call.lock().await.current_channel()?;
        Some(ChannelId::new(channel.0.get()))
    }

    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<()> {
        self.manager
            .join(guild_id, channel_id)
            .await
            .map(|_| ())
            .map_err(|e| anyhow!("voice join failed: {}", e))
    }

    async fn leave(&self, guild_id: GuildId) -> Result<()> {
        match self.manager.remove(guild_id).await {
            Ok(()) | Err(JoinError::NoCall) => Ok(()),
            Err(e) => Err(anyhow!("voice leave failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{BackendCall, FakeBackend};

    const GUILD: GuildId = GuildId::new(123);
    const CHANNEL: ChannelId = ChannelId::new(456);
    const OTHER: ChannelId = ChannelId::new(789);

    fn gateway(backend: FakeBackend) -> (VoiceGateway<FakeBackend>, Arc<Mutex<Cooldowns>>) {
        let cooldowns = Arc::new(Mutex::new(Cooldowns::new()));
        let gateway = VoiceGateway::new(backend, cooldowns.clone(), Duration::from_millis(500));
        (gateway, cooldowns)
    }

    #[tokio::test(start_paused = true)]
    async fn connect_joins_when_disconnected() {
        let (gateway, _) = gateway(FakeBackend::with_channels(&[(CHANNEL, GUILD)]));

        assert_eq!(gateway.connect(CHANNEL).await, Some(CHANNEL));
        assert_eq!(
            gateway.backend().calls(),
            vec![BackendCall::Join(GUILD, CHANNEL)]
        );
        assert_eq!(gateway.backend().current(GUILD), Some(CHANNEL));
    }

    #[tokio::test(start_paused = true)]
    async fn connect_twice_is_idempotent() {
        let (gateway, _) = gateway(FakeBackend::with_channels(&[(CHANNEL, GUILD)]));

        gateway.connect(CHANNEL).await;
        assert_eq!(gateway.connect(CHANNEL).await, Some(CHANNEL));
        assert_eq!(gateway.backend().calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_elsewhere_leaves_then_settles() {
        let backend = FakeBackend::with_channels(&[(CHANNEL, GUILD), (OTHER, GUILD)]);
        backend.set_current(GUILD, OTHER);
        let (gateway, _) = gateway(backend);

        let start = tokio::time::Instant::now();
        assert_eq!(gateway.connect(CHANNEL).await, Some(CHANNEL));

        assert_eq!(
            gateway.backend().calls(),
            vec![BackendCall::Leave(GUILD), BackendCall::Join(GUILD, CHANNEL)]
        );
        let joined_at = gateway.backend().last_call_at().unwrap();
        assert!(joined_at - start >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn connect_refused_during_cooldown() {
        let (gateway, cooldowns) = gateway(FakeBackend::with_channels(&[(CHANNEL, GUILD)]));
        cooldowns.lock().unwrap().set(GUILD, Duration::from_secs(300));

        assert_eq!(gateway.connect(CHANNEL).await, None);
        assert!(gateway.backend().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn connect_unknown_channel_is_none() {
        let (gateway, _) = gateway(FakeBackend::with_channels(&[]));

        assert_eq!(gateway.connect(CHANNEL).await, None);
        assert!(gateway.backend().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn connect_failure_is_swallowed() {
        let backend = FakeBackend::with_channels(&[(CHANNEL, GUILD)]);
        backend.fail_joins(true);
        let (gateway, _) = gateway(backend);

        assert_eq!(gateway.connect(CHANNEL).await, None);
        assert_eq!(gateway.backend().current(GUILD), None);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_is_noop_without_session() {
        let (gateway, _) = gateway(FakeBackend::with_channels(&[(CHANNEL, GUILD)]));

        gateway.disconnect(GUILD).await;
        assert!(gateway.backend().calls().is_empty());

        gateway.connect(CHANNEL).await;
        gateway.disconnect(GUILD).await;
        gateway.disconnect(GUILD).await;
        assert_eq!(
            gateway.backend().calls(),
            vec![BackendCall::Join(GUILD, CHANNEL), BackendCall::Leave(GUILD)]
        );
    }
}
