// SPDX-FileCopyrightText: 2026 Turnio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine configuration model and layered loader.
//!
//! Configuration is resolved with figment in precedence order: built-in
//! defaults, then TOML files (`/etc/turnio/turnio.toml`, the XDG config
//! directory, the working directory), then `TURNIO_`-prefixed environment
//! variables. Example: `TURNIO_ENGINE_NUMBER_PAD_WIDTH=6` overrides
//! `[engine] number_pad_width`.

#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use turnio_core::TurnioError;

/// Top-level configuration for the Turnio engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TurnioConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

impl Default for TurnioConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl TurnioConfig {
    /// Rejects values the engine cannot operate with.
    pub fn validate(&self) -> Result<(), TurnioError> {
        if self.engine.number_pad_width == 0 || self.engine.number_pad_width > 9 {
            return Err(TurnioError::Config(format!(
                "engine.number_pad_width must be between 1 and 9, got {}",
                self.engine.number_pad_width
            )));
        }
        if self.events.channel_capacity == 0 {
            return Err(TurnioError::Config(
                "events.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ticket numbering and dispatch policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Zero-pad width for the numeric part of ticket numbers.
    #[serde(default = "default_number_pad_width")]
    pub number_pad_width: usize,
    /// Whether dispatch may reclaim tickets stranded behind offline counters.
    #[serde(default = "default_rescue_enabled")]
    pub rescue_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            number_pad_width: default_number_pad_width(),
            rescue_enabled: default_rescue_enabled(),
        }
    }
}

/// Event-bus sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsConfig {
    /// Broadcast channel capacity before slow subscribers start lagging.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_number_pad_width() -> usize {
    4
}

fn default_rescue_enabled() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    256
}

/// Candidate config file locations, lowest precedence first.
fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/turnio/turnio.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("turnio").join("turnio.toml"));
    }
    paths.push(PathBuf::from("turnio.toml"));
    paths
}

fn env_provider() -> Env {
    Env::prefixed("TURNIO_").map(|key| {
        key.as_str()
            .to_ascii_lowercase()
            .replacen("engine_", "engine.", 1)
            .replacen("events_", "events.", 1)
            .into()
    })
}

/// Load configuration from the default file locations and environment.
pub fn load_config() -> Result<TurnioConfig, figment::Error> {
    let mut figment = Figment::new().merge(Serialized::defaults(TurnioConfig::default()));
    for path in config_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider()).extract()
}

/// Load configuration from a TOML string over the defaults.
pub fn load_config_from_str(toml: &str) -> Result<TurnioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TurnioConfig::default()))
        .merge(Toml::string(toml))
        .extract()
}

/// Load configuration from a specific file, still honoring the environment.
pub fn load_config_from_path(path: &Path) -> Result<TurnioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TurnioConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Load from a TOML string and run semantic validation.
pub fn load_and_validate_str(toml: &str) -> Result<TurnioConfig, TurnioError> {
    let config =
        load_config_from_str(toml).map_err(|e| TurnioError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
