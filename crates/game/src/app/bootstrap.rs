use std::path::Path;

use engine::{GestureConfig, SimConfig, Viewport};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::error::{parse_json, read_text, HostError};

pub(crate) const DEFAULT_TARGET_TPS: u32 = 60;
const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 1280,
    height: 720,
};

/// Host-side tunables. Every section is optional in the override file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct HostConfig {
    pub(crate) sim: SimConfig,
    pub(crate) gestures: GestureConfig,
    pub(crate) viewport: Viewport,
    pub(crate) target_tps: u32,
    pub(crate) camera_follows_actor: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            gestures: GestureConfig::default(),
            viewport: DEFAULT_VIEWPORT,
            target_tps: DEFAULT_TARGET_TPS,
            camera_follows_actor: true,
        }
    }
}

impl HostConfig {
    pub(crate) fn from_json(raw: &str) -> Result<Self, HostError> {
        let config: Self = parse_json("host config", raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), HostError> {
        if self.target_tps == 0 {
            return Err(invalid("target_tps must be at least 1"));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(invalid("viewport must be non-empty"));
        }
        if self.sim.floor_height <= 0.0 || !self.sim.floor_height.is_finite() {
            return Err(invalid("sim.floor_height must be a positive number"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> HostError {
    HostError::Invalid {
        what: "host config",
        message: message.to_string(),
    }
}

pub(crate) fn load_host_config(path: Option<&Path>) -> Result<HostConfig, HostError> {
    let Some(path) = path else {
        return Ok(HostConfig::default());
    };
    let config = HostConfig::from_json(&read_text("host config", path)?)?;
    info!(path = %path.display(), tps = config.target_tps, "host_config_loaded");
    Ok(config)
}

pub(crate) fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
