use crate::models::{clone_interaction::CloneInteraction, reward::RewardAction};
use eyre::{Context, eyre};
use figment::{
    Figment,
    providers::{Data, Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf};
use tokio::io::AsyncWriteExt;

const BASE_CONFIG_PATH: &str = "config/app_config.toml";
const ENV_PREFIX: &str = "POINTFX_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TauConfig {
    pub domain: String,
    pub port: u16,
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl Default for TauConfig {
    fn default() -> Self {
        Self {
            domain: "localhost".to_string(),
            port: 443,
            token: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ObsConfig {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4455,
            password: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MatrixConfig {
    pub url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tau: TauConfig,
    pub obs: ObsConfig,
    pub matrix: MatrixConfig,
    /// Reward id to what redeeming it does.
    pub rewards: BTreeMap<String, RewardAction>,
    pub water: CloneInteraction,
}

impl Default for Config {
    fn default() -> Self {
        let rewards = [
            ("c05b769d-d4a1-40fe-a73b-c8d631a12103", RewardAction::WriteToMatrix),
            ("83e12f84-f23a-47bb-9c23-1a97fc0d31c5", RewardAction::Water),
            ("22290ae7-92de-41a1-b6e4-90633f4c3273", RewardAction::Throwback),
            ("2cf8a122-9495-4b53-9112-cad19028cd0b", RewardAction::Thanos),
            ("dda440cb-5284-4834-aadf-1cf48b0edec8", RewardAction::Hulk),
            ("8a29edcb-7870-4119-bc8b-14ee5ea4200e", RewardAction::Mac),
            ("7a0ff357-492c-43bc-91d4-d2ca2c141a37", RewardAction::Technicolor),
            ("d5bb47c7-f39e-4790-a9de-f539fc3f5b82", RewardAction::Hacker),
        ]
        .into_iter()
        .map(|(id, action)| (id.to_string(), action))
        .collect();

        Self {
            tau: TauConfig::default(),
            obs: ObsConfig::default(),
            matrix: MatrixConfig::default(),
            rewards,
            water: CloneInteraction::default(),
        }
    }
}

impl Config {
    pub fn reward_action(&self, reward_id: &str) -> Option<RewardAction> {
        self.rewards.get(reward_id).copied()
    }
}

fn get_config_path() -> Result<PathBuf, eyre::Report> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| eyre!("Could not find a config directory"))?
        .join(env!("CARGO_PKG_NAME"));

    Ok(config_dir.join("app_config.toml"))
}

/// Base file, then the user's file, then `POINTFX_*` environment variables
/// (`POINTFX_OBS__PASSWORD` sets `obs.password`).
fn figment(base: Data<Toml>, user: Data<Toml>) -> Figment {
    Figment::new()
        .merge(base)
        .merge(user)
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

pub async fn load() -> Result<Config, eyre::Report> {
    let user_config_path = get_config_path()?;
    tracing::info!("Loading user config from {:?}", user_config_path);
    tracing::info!("Loading base config from {:?}", BASE_CONFIG_PATH);

    let config: Config = figment(Toml::file(BASE_CONFIG_PATH), Toml::file(&user_config_path))
        .extract()
        .context("Could not load config")?;

    if !user_config_path.exists() {
        if let Err(e) = save(&config).await {
            tracing::warn!("Failed to save initial config: {}", e);
        }
    }

    Ok(config)
}

/// Writes the config to the user's config directory. Secrets are never
/// written out.
pub async fn save(config: &Config) -> Result<(), eyre::Report> {
    let path = get_config_path()?;
    tracing::info!("Saving config to {:?}", path);

    let bytes = toml::to_string_pretty(config).context("Failed to serialize config")?;

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }
    }

    let mut file = tokio::fs::File::create(path)
        .await
        .context("Failed to create config file")?;

    file.write_all(bytes.as_bytes())
        .await
        .context("Failed to write config to file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::clone_interaction::Step;

    fn extract(base: &str, user: &str) -> Config {
        figment(Toml::string(base), Toml::string(user))
            .extract()
            .unwrap()
    }

    #[test]
    fn defaults_route_the_known_rewards() {
        let config = Config::default();
        assert_eq!(
            config.reward_action("83e12f84-f23a-47bb-9c23-1a97fc0d31c5"),
            Some(RewardAction::Water)
        );
        assert_eq!(
            config.reward_action("d5bb47c7-f39e-4790-a9de-f539fc3f5b82"),
            Some(RewardAction::Hacker)
        );
        assert_eq!(config.reward_action("unknown"), None);
    }

    #[test]
    fn user_file_overrides_base_file() {
        let config = extract(
            r#"
            [obs]
            host = "obs-box"
            port = 4456
            [matrix]
            url = "http://matrix.local/post"
            "#,
            r#"
            [obs]
            host = "127.0.0.1"
            "#,
        );
        assert_eq!(config.obs.host, "127.0.0.1");
        assert_eq!(config.obs.port, 4456);
        assert_eq!(config.matrix.url.as_deref(), Some("http://matrix.local/post"));
        assert_eq!(config.tau, TauConfig::default());
    }

    #[test]
    fn parses_rewards_and_interactions() {
        let config = extract(
            r#"
            [rewards]
            "abc" = "technicolor"

            [water]
            scene_name = "Clones - Water"
            backgrounds = ["kitchen-1.png"]

            [[water.finite]]
            file_path = "water-finite-1.mp4"
            steps = [
                { step_type = "blur", start_ms = 12000, blur = 20.0, duration_ms = 5000 },
                { step_type = "end", end_ms = 48000 },
            ]
            "#,
            "",
        );
        assert_eq!(config.rewards.len(), 1);
        assert_eq!(config.reward_action("abc"), Some(RewardAction::Technicolor));
        assert_eq!(config.water.finite[0].steps[1], Step::End { end_ms: 48000 });
        assert!(config.water.roscodes.is_empty());
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut config = Config::default();
        config.obs.password = Some("hunter2".into());
        config.tau.token = Some("tau-token".into());
        let written = toml::to_string_pretty(&config).unwrap();
        assert!(!written.contains("hunter2"));
        assert!(!written.contains("tau-token"));
    }
}
