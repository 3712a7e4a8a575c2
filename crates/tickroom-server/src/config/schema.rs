use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tickroom_core::error::{Result, RoomError};
use tickroom_core::protocol::commands::EnvironmentPackage;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub assets: AssetsSection,

    #[serde(default)]
    pub environment: EnvironmentSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            assets: AssetsSection::default(),
            environment: EnvironmentSection::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RoomError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.assets.validate()?;
        self.environment.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_description")]
    pub description: String,

    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default = "default_broadcast_queue")]
    pub broadcast_queue: usize,

    /// A peer that accepts no bytes for this long is dropped.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: default_description(),
            listen: default_listen(),
            tick_rate_hz: default_tick_rate_hz(),
            max_frame_bytes: default_max_frame_bytes(),
            broadcast_queue: default_broadcast_queue(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=1000).contains(&self.tick_rate_hz) {
            return Err(RoomError::Config(
                "server.tick_rate_hz must be between 1 and 1000".into(),
            ));
        }
        if !(64..=MAX_FRAME_CEILING).contains(&self.max_frame_bytes) {
            return Err(RoomError::Config(format!(
                "server.max_frame_bytes must be between 64 and {MAX_FRAME_CEILING}"
            )));
        }
        if !(1..=600_000).contains(&self.write_timeout_ms) {
            return Err(RoomError::Config(
                "server.write_timeout_ms must be between 1 and 600000".into(),
            ));
        }
        if self.broadcast_queue == 0 {
            return Err(RoomError::Config(
                "server.broadcast_queue must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

const MAX_FRAME_CEILING: usize = 16 * 1024 * 1024;

fn default_name() -> String {
    "server".into()
}
fn default_description() -> String {
    "Greetings, traveller!".into()
}
fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_tick_rate_hz() -> u32 {
    20
}
fn default_max_frame_bytes() -> usize {
    64 * 1024
}
fn default_broadcast_queue() -> usize {
    1024
}
fn default_write_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetsSection {
    #[serde(default = "default_assets_dir")]
    pub dir: String,

    #[serde(default = "default_assets_listen")]
    pub listen: String,

    #[serde(default = "default_max_asset_bytes")]
    pub max_asset_bytes: usize,
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            dir: default_assets_dir(),
            listen: default_assets_listen(),
            max_asset_bytes: default_max_asset_bytes(),
        }
    }
}

impl AssetsSection {
    pub fn validate(&self) -> Result<()> {
        if self.dir.is_empty() {
            return Err(RoomError::Config("assets.dir must not be empty".into()));
        }
        if self.max_asset_bytes == 0 {
            return Err(RoomError::Config(
                "assets.max_asset_bytes must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn default_assets_dir() -> String {
    "assets".into()
}
fn default_assets_listen() -> String {
    "0.0.0.0:3001".into()
}
fn default_max_asset_bytes() -> usize {
    16 * 1024 * 1024
}

/// The static scene descriptor handed out on `environment_request`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSection {
    #[serde(default = "default_main")]
    pub main: String,

    #[serde(default = "default_asset_keys")]
    pub asset_keys: BTreeMap<String, String>,
}

impl Default for EnvironmentSection {
    fn default() -> Self {
        Self {
            main: default_main(),
            asset_keys: default_asset_keys(),
        }
    }
}

impl EnvironmentSection {
    pub fn validate(&self) -> Result<()> {
        if !self.asset_keys.contains_key(&self.main) {
            return Err(RoomError::Config(format!(
                "environment.main ({}) must name one of environment.asset_keys",
                self.main
            )));
        }
        Ok(())
    }

    pub fn package(&self) -> EnvironmentPackage {
        EnvironmentPackage {
            asset_keys: self.asset_keys.clone(),
            main: self.main.clone(),
        }
    }
}

fn default_main() -> String {
    "world".into()
}
fn default_asset_keys() -> BTreeMap<String, String> {
    BTreeMap::from([("world".to_string(), "room.gsml".to_string())])
}
