use anyhow::{anyhow, Result};
use serenity::all::UserId;
use std::{io::ErrorKind, path::PathBuf, time::Duration};
use tokio::io::AsyncReadExt;

const CONFIG_PATH_REL_HOME: &str = ".config/autovoc/config.toml";
const STATE_PATH_REL_HOME: &str = ".config/autovoc/autovoc.json";
const TOKEN_ENV_VAR: &str = "DISCORD_TOKEN";

/// Client configuration
#[derive(Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub autovoc: AutoVoc,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct General {
    #[serde(default)]
    pub discord_token: String,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Accounts allowed to issue commands besides the one we are logged in as.
    #[serde(default)]
    pub owners: Vec<UserId>,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct AutoVoc {
    /// Where the guild -> channel map is persisted.  Defaults to a file next to the config.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default = "default_switch_settle_ms")]
    pub switch_settle_ms: u64,
    #[serde(default = "default_leave_cooldown_seconds")]
    pub leave_cooldown_seconds: u64,
}

fn default_command_prefix() -> String {
    "&".to_owned()
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

fn default_switch_settle_ms() -> u64 {
    500
}

fn default_leave_cooldown_seconds() -> u64 {
    5 * 60
}

impl Default for General {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            command_prefix: default_command_prefix(),
            owners: Vec::new(),
        }
    }
}

impl Default for AutoVoc {
    fn default() -> Self {
        Self {
            state_file: None,
            reconnect_delay_ms: default_reconnect_delay_ms(),
            switch_settle_ms: default_switch_settle_ms(),
            leave_cooldown_seconds: default_leave_cooldown_seconds(),
        }
    }
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut config = match tokio::fs::File::open(&path).await {
            Ok(mut file) => {
                let mut contents = String::new();
                file.read_to_string(&mut contents).await.map_err(|e| {
                    anyhow!(
                        "Could not read configuration at `{}`: {}",
                        path.to_string_lossy(),
                        e
                    )
                })?;
                Self::parse(&contents).map_err(|e| {
                    anyhow!(
                        "Could not parse configuration at `{}`: {}",
                        path.to_string_lossy(),
                        e
                    )
                })?
            }
            // Everything has a default except the token, which may come from the environment.
            Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
            Err(e) => {
                return Err(anyhow!(
                    "Could not open configuration at `{}`: {}",
                    path.to_string_lossy(),
                    e
                ))
            }
        };

        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.trim().is_empty() {
                config.general.discord_token = token.trim().to_owned();
            }
        }

        if config.general.discord_token.is_empty() {
            return Err(anyhow!(
                "No Discord token configured.  Set `discord_token` in `{}` or the `{}` environment variable",
                path.to_string_lossy(),
                TOKEN_ENV_VAR
            ));
        }

        Ok(config)
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub async fn reload(&mut self) -> Result<()> {
        let new = Self::load().await?;
        *self = new;
        Ok(())
    }

    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.autovoc.state_file {
            Some(path) => Ok(path.clone()),
            None => dirs::home_dir()
                .map(|p| p.join(STATE_PATH_REL_HOME))
                .ok_or(anyhow!("Could not find home directory")),
        }
    }
}

impl AutoVoc {
    pub fn settings(&self) -> crate::autovoc::Settings {
        crate::autovoc::Settings {
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            switch_settle: Duration::from_millis(self.switch_settle_ms),
            leave_cooldown: Duration::from_secs(self.leave_cooldown_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.general.command_prefix, "&");
        assert!(config.general.owners.is_empty());
        assert_eq!(config.autovoc.reconnect_delay_ms, 2000);
        assert_eq!(config.autovoc.switch_settle_ms, 500);
        assert_eq!(config.autovoc.leave_cooldown_seconds, 300);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [general]
            discord_token = "abc"
            command_prefix = "!"
            owners = ["42"]

            [autovoc]
            state_file = "/tmp/voc.json"
            leave_cooldown_seconds = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.general.discord_token, "abc");
        assert_eq!(config.general.command_prefix, "!");
        assert_eq!(config.general.owners, vec![UserId::new(42)]);
        assert_eq!(config.state_path().unwrap(), PathBuf::from("/tmp/voc.json"));

        let settings = config.autovoc.settings();
        assert_eq!(settings.leave_cooldown, Duration::from_secs(60));
        assert_eq!(settings.reconnect_delay, Duration::from_secs(2));
        assert_eq!(settings.switch_settle, Duration::from_millis(500));
    }
}
