//! Keeps the account sitting in each guild's configured voice channel.
//!
//! Every voice state change of our own account goes through [`decide`].  If the account ended up
//! somewhere other than the configured channel, one reconnect task is started for the guild.  It
//! waits for the platform to settle and then connects through the [`VoiceGateway`].  A guild
//! never has more than one reconnect task in flight, and the task clears its marker however it
//! exits.
//!
//! Manual leaves put the guild on cooldown, which blocks both automatic and manual connects until
//! it expires.

use crate::{
    log_error, log_internal,
    logging::PrintIdColor,
    persistent_state::AutoVocMap,
    voice::{VoiceBackend, VoiceGateway},
    volatile_state::{Cooldowns, PendingReconnects},
};
use serenity::all::{ChannelId, GuildId, UserId, VoiceState};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::sync::RwLock;

/// Timing knobs.  See the `[autovoc]` config section.
#[derive(Clone, Copy, Debug)]
pub struct Settings {
    /// Wait between noticing we're in the wrong place and reconnecting.
    pub reconnect_delay: Duration,
    /// Wait between leaving one channel and joining another in the same guild.
    pub switch_settle: Duration,
    /// How long a manual leave blocks reconnects.
    pub leave_cooldown: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(2),
            switch_settle: Duration::from_millis(500),
            leave_cooldown: Duration::from_secs(5 * 60),
        }
    }
}

/// A voice state change of our own account, reduced to what reconnecting cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoiceStateChange {
    pub guild_id: Option<GuildId>,
    pub old_channel: Option<ChannelId>,
    pub new_channel: Option<ChannelId>,
}

impl VoiceStateChange {
    /// Normalize a platform voice state update.  None if it's about some other account.
    pub fn for_account(me: UserId, old: Option<&VoiceState>, new: &VoiceState) -> Option<Self> {
        if new.user_id != me {
            return None;
        }

        Some(Self {
            guild_id: new.guild_id.or_else(|| old.and_then(|old| old.guild_id)),
            old_channel: old.and_then(|old| old.channel_id),
            new_channel: new.channel_id,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    NoGuild,
    NotConfigured,
    AlreadyConnected,
    CoolingDown,
    AlreadyPending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Ignore(IgnoreReason),
    Reconnect { guild_id: GuildId, channel_id: ChannelId },
}

/// Whether a voice state change calls for a reconnect.  Checks run in order and the first match
/// wins.
///
/// `configured`, `cooling_down` and `pending` describe the guild the change belongs to.
pub fn decide(
    change: &VoiceStateChange,
    configured: Option<ChannelId>,
    cooling_down: bool,
    pending: bool,
) -> Decision {
    let Some(guild_id) = change.guild_id else {
        return Decision::Ignore(IgnoreReason::NoGuild);
    };
    let Some(channel_id) = configured else {
        return Decision::Ignore(IgnoreReason::NotConfigured);
    };
    if change.new_channel == Some(channel_id) {
        return Decision::Ignore(IgnoreReason::AlreadyConnected);
    }
    if cooling_down {
        return Decision::Ignore(IgnoreReason::CoolingDown);
    }
    if pending {
        return Decision::Ignore(IgnoreReason::AlreadyPending);
    }
    Decision::Reconnect {
        guild_id,
        channel_id,
    }
}

fn describe(channel: Option<ChannelId>) -> String {
    match channel {
        Some(channel_id) => channel_id.id_color(),
        None => "no channel".to_owned(),
    }
}

/// Auto-reconnect service.  Built once at startup and shared behind an `Arc` by the event
/// handlers and commands.
pub struct AutoVoc<B> {
    channels: RwLock<AutoVocMap>,
    cooldowns: Arc<Mutex<Cooldowns>>,
    pending: PendingReconnects,
    gateway: VoiceGateway<B>,
    settings: Settings,
}

impl<B: VoiceBackend> AutoVoc<B> {
    pub fn new(channels: AutoVocMap, backend: B, settings: Settings) -> Self {
        let cooldowns = Arc::new(Mutex::new(Cooldowns::new()));
        Self {
            channels: RwLock::new(channels),
            gateway: VoiceGateway::new(backend, cooldowns.clone(), settings.switch_settle),
            cooldowns,
            pending: PendingReconnects::new(),
            settings,
        }
    }

    pub fn gateway(&self) -> &VoiceGateway<B> {
        &self.gateway
    }

    #[cfg(test)]
    pub fn pending(&self) -> &PendingReconnects {
        &self.pending
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn configured(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.channels.read().await.get(guild_id)
    }

    pub async fn list(&self) -> Vec<(GuildId, ChannelId)> {
        self.channels.read().await.list()
    }

    pub fn is_cooling_down(&self, guild_id: GuildId) -> bool {
        self.with_cooldowns(|cooldowns| cooldowns.is_active(guild_id))
    }

    pub fn set_cooldown(&self, guild_id: GuildId, duration: Duration) {
        self.with_cooldowns(|cooldowns| cooldowns.set(guild_id, duration));
    }

    /// Remember `channel_id` as the guild's channel and connect to it once right away.
    pub async fn enable(&self, guild_id: GuildId, channel_id: ChannelId) -> Option<ChannelId> {
        self.channels.write().await.enable(guild_id, channel_id).await;
        log_internal!(
            "Auto-reconnect enabled for {} -> {}",
            guild_id.id_color(),
            channel_id.id_color()
        );
        self.gateway.connect(channel_id).await
    }

    /// Forget the guild's channel without touching the voice session.  Returns whether there was
    /// one.
    pub async fn remove(&self, guild_id: GuildId) -> bool {
        let removed = self.channels.write().await.disable(guild_id).await;
        if removed {
            log_internal!("Auto-reconnect removed for {}", guild_id.id_color());
        }
        removed
    }

    /// Stop auto-reconnecting, leave voice, and stay out for the leave cooldown.  The cooldown is
    /// set before disconnecting so the resulting voice state change is already suppressed.
    pub async fn disable(&self, guild_id: GuildId) {
        self.channels.write().await.disable(guild_id).await;
        self.set_cooldown(guild_id, self.settings.leave_cooldown);
        self.gateway.disconnect(guild_id).await;
        log_internal!(
            "Auto-reconnect disabled for {}, cooling down for {}s",
            guild_id.id_color(),
            self.settings.leave_cooldown.as_secs()
        );
    }

    /// Manual join.  Goes through the same cooldown check as reconnects.
    pub async fn join(&self, channel_id: ChannelId) -> Option<ChannelId> {
        self.gateway.connect(channel_id).await
    }

    /// React to a voice state change of our own account.
    pub async fn on_voice_state(self: &Arc<Self>, change: VoiceStateChange) -> Decision {
        let (configured, cooling_down, pending) = match change.guild_id {
            Some(guild_id) => (
                self.configured(guild_id).await,
                self.is_cooling_down(guild_id),
                self.pending.contains(guild_id),
            ),
            None => (None, false, false),
        };

        let decision = decide(&change, configured, cooling_down, pending);
        let Decision::Reconnect {
            guild_id,
            channel_id,
        } = decision
        else {
            return decision;
        };

        let this = Arc::clone(self);
        let started = self.pending.try_start(guild_id, move |guard| {
            tokio::spawn(async move {
                let _guard = guard;
                this.reconnect(guild_id, channel_id).await;
            });
        });
        // Another event may have claimed the guild since we looked.
        if !started {
            return Decision::Ignore(IgnoreReason::AlreadyPending);
        }

        log_internal!(
            "Went from {} to {} instead of {} in {}, reconnecting in {}ms",
            describe(change.old_channel),
            describe(change.new_channel),
            channel_id.id_color(),
            guild_id.id_color(),
            self.settings.reconnect_delay.as_millis()
        );
        decision
    }

    async fn reconnect(&self, guild_id: GuildId, scheduled_for: ChannelId) {
        tokio::time::sleep(self.settings.reconnect_delay).await;

        // The target may have been changed or removed while we waited.
        let Some(channel_id) = self.configured(guild_id).await else {
            log_internal!(
                "Auto-reconnect for {} was removed, dropping reconnect to {}",
                guild_id.id_color(),
                scheduled_for.id_color()
            );
            return;
        };

        match self.gateway.channel_guild(channel_id).await {
            Some(owner) if owner == guild_id => {}
            Some(owner) => {
                log_error!(
                    "Configured {} of {} belongs to {}, giving up on this reconnect",
                    channel_id.id_color(),
                    guild_id.id_color(),
                    owner.id_color()
                );
                return;
            }
            None => {
                log_internal!(
                    "Configured {} of {} can't be found, giving up on this reconnect",
                    channel_id.id_color(),
                    guild_id.id_color()
                );
                return;
            }
        }

        self.gateway.connect(channel_id).await;
    }

    fn with_cooldowns<T>(&self, f: impl FnOnce(&mut Cooldowns) -> T) -> T {
        let mut cooldowns = self
            .cooldowns
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut cooldowns)
    }
}
