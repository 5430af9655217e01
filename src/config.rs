use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub channels: ChannelState,
}

/// Client-side channel state the context builder needs beyond the message
/// itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelState {
    /// Channel currently being watched, if any
    pub watching: Option<String>,
    /// Channels known to be live
    pub live: BTreeSet<String>,
}

impl ChannelState {
    pub fn is_watching(&self, channel: &str) -> bool {
        self.watching
            .as_deref()
            .is_some_and(|w| !w.is_empty() && w.eq_ignore_ascii_case(channel))
    }

    pub fn is_live(&self, channel: &str) -> bool {
        self.live.iter().any(|c| c.eq_ignore_ascii_case(channel))
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FilterConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<FilterConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<FilterConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static FilterConfig {
    static DEFAULT_CONFIG: LazyLock<FilterConfig> = LazyLock::new(FilterConfig::default);
    &DEFAULT_CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_matching_is_case_insensitive() {
        let state = ChannelState {
            watching: Some("Forsen".to_string()),
            live: BTreeSet::from(["xQc".to_string()]),
        };
        assert!(state.is_watching("forsen"));
        assert!(!state.is_watching("pajlada"));
        assert!(state.is_live("XQC"));
        assert!(!state.is_live("forsen"));
    }

    #[test]
    fn test_default_config_has_no_channel_state() {
        let config = default_config();
        assert!(config.channels.watching.is_none());
        assert!(config.channels.live.is_empty());
        assert!(!config.channels.is_watching(""));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: FilterConfig =
            toml::from_str("[channels]\nlive = [\"forsen\"]\n").expect("valid config");
        assert!(config.channels.watching.is_none());
        assert!(config.channels.is_live("forsen"));
    }
}
