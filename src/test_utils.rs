//! Shared helpers for the unit tests.

use crate::{
    autovoc::{AutoVoc, Settings},
    persistent_state::AutoVocMap,
    voice::VoiceBackend,
};
use anyhow::{anyhow, Result};
use serenity::all::{ChannelId, GuildId, VoiceState};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendCall {
    Join(GuildId, ChannelId),
    Leave(GuildId),
}

#[derive(Default)]
struct FakeState {
    channels: HashMap<ChannelId, GuildId>,
    connected: HashMap<GuildId, ChannelId>,
    calls: Vec<(Instant, BackendCall)>,
    fail_joins: bool,
    join_latency: Duration,
    joins_in_flight: usize,
    max_joins_in_flight: usize,
}

/// In-memory voice platform.  Knows a fixed set of voice channels and records every join and
/// leave, with the (virtual) time it happened.
#[derive(Default)]
pub struct FakeBackend(Mutex<FakeState>);

impl FakeBackend {
    pub fn with_channels(channels: &[(ChannelId, GuildId)]) -> Self {
        let backend = Self::default();
        backend.state().channels = channels.iter().copied().collect();
        backend
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.0.lock().unwrap()
    }

    pub fn set_current(&self, guild_id: GuildId, channel_id: ChannelId) {
        self.state().connected.insert(guild_id, channel_id);
    }

    /// Simulate being kicked out of voice by someone else.
    pub fn drop_session(&self, guild_id: GuildId) {
        self.state().connected.remove(&guild_id);
    }

    pub fn add_channel(&self, channel_id: ChannelId, guild_id: GuildId) {
        self.state().channels.insert(channel_id, guild_id);
    }

    pub fn delete_channel(&self, channel_id: ChannelId) {
        self.state().channels.remove(&channel_id);
    }

    pub fn current(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.state().connected.get(&guild_id).copied()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state().calls.iter().map(|(_, call)| *call).collect()
    }

    pub fn joins(&self) -> Vec<(Instant, BackendCall)> {
        self.state()
            .calls
            .iter()
            .filter(|(_, call)| matches!(call, BackendCall::Join(..)))
            .copied()
            .collect()
    }

    pub fn last_call_at(&self) -> Option<Instant> {
        self.state().calls.last().map(|(at, _)| *at)
    }

    pub fn fail_joins(&self, fail: bool) {
        self.state().fail_joins = fail;
    }

    pub fn set_join_latency(&self, latency: Duration) {
        self.state().join_latency = latency;
    }

    pub fn max_joins_in_flight(&self) -> usize {
        self.state().max_joins_in_flight
    }
}

#[serenity::async_trait]
impl VoiceBackend for FakeBackend {
    async fn channel_guild(&self, channel_id: ChannelId) -> Option<GuildId> {
        self.state().channels.get(&channel_id).copied()
    }

    async fn current_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.current(guild_id)
    }

    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<()> {
        let latency = {
            let mut state = self.state();
            state
                .calls
                .push((Instant::now(), BackendCall::Join(guild_id, channel_id)));
            state.joins_in_flight += 1;
            state.max_joins_in_flight = state.max_joins_in_flight.max(state.joins_in_flight);
            state.join_latency
        };

        tokio::time::sleep(latency).await;

        let mut state = self.state();
        state.joins_in_flight -= 1;
        if state.fail_joins {
            return Err(anyhow!("missing permissions"));
        }
        state.connected.insert(guild_id, channel_id);
        Ok(())
    }

    async fn leave(&self, guild_id: GuildId) -> Result<()> {
        let mut state = self.state();
        state.calls.push((Instant::now(), BackendCall::Leave(guild_id)));
        state.connected.remove(&guild_id);
        Ok(())
    }
}

/// Auto-reconnect service over a [`FakeBackend`], persisting into `dir`.
pub async fn autovoc(dir: &tempfile::TempDir, backend: FakeBackend) -> Arc<AutoVoc<FakeBackend>> {
    let channels = AutoVocMap::load(dir.path().join("autovoc.json")).await;
    Arc::new(AutoVoc::new(channels, backend, Settings::default()))
}

/// A platform voice state update, as the gateway would deliver it.
pub fn voice_state(user: u64, guild: Option<u64>, channel: Option<u64>) -> VoiceState {
    serde_json::from_value(serde_json::json!({
        "guild_id": guild.map(|id| id.to_string()),
        "channel_id": channel.map(|id| id.to_string()),
        "user_id": user.to_string(),
        "session_id": "session",
        "deaf": false,
        "mute": false,
        "self_deaf": false,
        "self_mute": false,
        "self_video": false,
        "self_stream": false,
        "suppress": false,
        "member": null,
        "request_to_speak_timestamp": null,
    }))
    .unwrap()
}
