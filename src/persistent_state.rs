use crate::{log_error, log_internal};
use anyhow::{anyhow, Result};
use serenity::all::{ChannelId, GuildId};
use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Which voice channel each guild should stay connected to.  Survives restarts.
///
/// On disk this is a flat JSON object of guild id strings to channel id integers, e.g.
/// `{"123": 456}`.  Every mutation is flushed before it returns.  A failed flush is logged and the
/// in-memory map stays authoritative for the rest of the session.
pub struct AutoVocMap {
    path: PathBuf,
    channels: HashMap<GuildId, ChannelId>,
}

impl AutoVocMap {
    /// Load the map from `path`.  A missing, unreadable, or malformed file yields an empty map;
    /// the next write replaces it.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let channels = match tokio::fs::read(&path).await {
            Ok(data) => parse(&path, &data),
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                log_error!(
                    "Could not read auto-reconnect state at `{}`: {}.  Starting empty.",
                    path.to_string_lossy(),
                    e
                );
                HashMap::new()
            }
        };

        log_internal!(
            "Loaded {} auto-reconnect channel(s) from `{}`",
            channels.len(),
            path.to_string_lossy()
        );

        Self { path, channels }
    }

    /// Set the desired channel for a guild, overwriting any previous one.
    pub async fn enable(&mut self, guild_id: GuildId, channel_id: ChannelId) {
        self.channels.insert(guild_id, channel_id);
        self.flush().await;
    }

    /// Forget the guild's desired channel.  Returns whether there was one.
    pub async fn disable(&mut self, guild_id: GuildId) -> bool {
        if self.channels.remove(&guild_id).is_none() {
            return false;
        }
        self.flush().await;
        true
    }

    pub fn get(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.channels.get(&guild_id).copied()
    }

    pub fn list(&self) -> Vec<(GuildId, ChannelId)> {
        self.channels.iter().map(|(g, c)| (*g, *c)).collect()
    }

    async fn flush(&self) {
        if let Err(e) = self.save().await {
            log_error!("{:#}", e);
        }
    }

    pub async fn save(&self) -> Result<()> {
        let on_disk: HashMap<String, u64> = self
            .channels
            .iter()
            .map(|(g, c)| (g.to_string(), c.get()))
            .collect();
        let serialized = serde_json::to_string_pretty(&on_disk)
            .map_err(|e| anyhow!("Could not serialize auto-reconnect state: {}", e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                anyhow!(
                    "Could not create directory `{}`: {}",
                    parent.to_string_lossy(),
                    e
                )
            })?;
        }

        // Create a temporary file in the same directory.
        let tmp_path = self.path.with_extension("json.new");

        tokio::fs::write(&tmp_path, serialized).await.map_err(|e| {
            anyhow!(
                "Could not write state to temporary file `{}`: {}",
                tmp_path.to_string_lossy(),
                e
            )
        })?;

        // Atomically rename the temporary file over the target file.
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            anyhow!(
                "Could not rename temporary file `{}` to `{}`: {}",
                tmp_path.to_string_lossy(),
                self.path.to_string_lossy(),
                e
            )
        })?;

        Ok(())
    }
}

fn parse(path: &Path, data: &[u8]) -> HashMap<GuildId, ChannelId> {
    let value: serde_json::Value = match serde_json::from_slice(data) {
        Ok(value) => value,
        Err(e) => {
            log_error!(
                "Could not parse auto-reconnect state at `{}`: {}.  Starting empty.",
                path.to_string_lossy(),
                e
            );
            return HashMap::new();
        }
    };

    let serde_json::Value::Object(entries) = value else {
        log_error!(
            "Auto-reconnect state at `{}` is not a JSON object.  Starting empty.",
            path.to_string_lossy()
        );
        return HashMap::new();
    };

    let mut channels = HashMap::new();
    for (guild, channel) in entries {
        let guild_id = parse_id(&guild).map(GuildId::new);
        // Accept ids written as strings too, since that's how the platform itself spells them.
        let channel_id = match &channel {
            serde_json::Value::Number(n) => n.as_u64().filter(|id| *id != 0),
            serde_json::Value::String(s) => parse_id(s),
            _ => None,
        }
        .map(ChannelId::new);

        match (guild_id, channel_id) {
            (Some(guild_id), Some(channel_id)) => {
                channels.insert(guild_id, channel_id);
            }
            _ => log_error!("Skipping invalid auto-reconnect entry `{}`: {}", guild, channel),
        }
    }
    channels
}

/// Parse a non-zero snowflake id.
pub fn parse_id(s: &str) -> Option<u64> {
    s.trim().parse::<u64>().ok().filter(|id| *id != 0)
}
