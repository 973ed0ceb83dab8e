use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::undo_stack::DEFAULT_HISTORY_CAPACITY;

/// Editor configuration
///
/// Every field has a default, so `{}` is a complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Number of document snapshots kept for undo
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Image zoom overlay behaviour
    #[serde(default)]
    pub zoom: ZoomConfig,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomConfig {
    /// Share of the viewport the zoomed image may cover on each axis
    #[serde(default = "default_viewport_fraction")]
    pub viewport_fraction: f64,

    /// Delay between mounting the overlay and starting the zoom-in
    #[serde(default = "default_open_delay_ms")]
    pub open_delay_ms: u64,

    /// Length of the zoom-out transition before unmounting
    #[serde(default = "default_close_duration_ms")]
    pub close_duration_ms: u64,
}

fn default_viewport_fraction() -> f64 {
    0.9
}

fn default_open_delay_ms() -> u64 {
    10
}

fn default_close_duration_ms() -> u64 {
    300
}

impl ZoomConfig {
    pub fn open_delay(&self) -> Duration {
        Duration::from_millis(self.open_delay_ms)
    }

    pub fn close_duration(&self) -> Duration {
        Duration::from_millis(self.close_duration_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            zoom: ZoomConfig::default(),
        }
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            viewport_fraction: default_viewport_fraction(),
            open_delay_ms: default_open_delay_ms(),
            close_duration_ms: default_close_duration_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "historyCapacity": 10,
            "zoom": { "viewportFraction": 0.8, "closeDurationMs": 150 }
        }"#;

        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.zoom.viewport_fraction, 0.8);
        assert_eq!(config.zoom.open_delay_ms, 10);
        assert_eq!(config.zoom.close_duration(), Duration::from_millis(150));
    }

    #[test]
    fn test_default_config() {
        let config: EditorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.zoom.open_delay(), Duration::from_millis(10));
    }
}
