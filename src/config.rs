//! # Layer Configuration
//!
//! Capture settings, parsed from JSON or the environment.

use serde::{Deserialize, Serialize};

/// Behaviour when the timestamp slot pool runs dry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotExhaustionPolicy {
    /// Abort instead of silently dropping timings
    Fatal,
    /// Record the entry without a timestamp and keep going
    Skip,
}

impl Default for SlotExhaustionPolicy {
    fn default() -> Self {
        SlotExhaustionPolicy::Fatal
    }
}

/// Capture layer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LayerConfig {
    /// Deepest marker nesting per command buffer that still receives
    /// timestamp slots (0 = no filtering)
    #[serde(rename = "maxMarkerDepth")]
    pub max_local_marker_depth_per_command_buffer: u32,

    /// Timestamp slots in each device's query pool
    #[serde(rename = "querySlots")]
    pub num_timer_query_slots: u32,

    /// Slot pool exhaustion policy
    #[serde(rename = "slotExhaustion")]
    pub slot_exhaustion: SlotExhaustionPolicy,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            max_local_marker_depth_per_command_buffer: 0,
            num_timer_query_slots: 65536,
            slot_exhaustion: SlotExhaustionPolicy::Fatal,
        }
    }
}

impl LayerConfig {
    /// Parse config from bytes (JSON)
    pub fn from_bytes(data: &[u8]) -> Result<Self, String> {
        if data.is_empty() {
            log::warn!("Empty config data, using defaults");
            return Ok(Self::default());
        }

        serde_json::from_slice(data)
            .map_err(|e| format!("Config parse error: {}", e))
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Defaults with `CHRONOS_*` environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply environment overrides to an existing config
    pub fn apply_env(&mut self) {
        if let Some(depth) = parse_env_var("CHRONOS_MAX_MARKER_DEPTH") {
            self.max_local_marker_depth_per_command_buffer = depth;
        }
        if let Some(slots) = parse_env_var("CHRONOS_QUERY_SLOTS") {
            if slots == 0 {
                log::warn!("CHRONOS_QUERY_SLOTS must be positive, ignoring");
            } else {
                self.num_timer_query_slots = slots;
            }
        }
        if let Ok(policy) = std::env::var("CHRONOS_SLOT_EXHAUSTION") {
            match policy.as_str() {
                "FATAL" => self.slot_exhaustion = SlotExhaustionPolicy::Fatal,
                "SKIP" => self.slot_exhaustion = SlotExhaustionPolicy::Skip,
                other => log::warn!("Unknown CHRONOS_SLOT_EXHAUSTION value: {}", other),
            }
        }
    }
}

/// Parse a u32 environment variable, warning on garbage
fn parse_env_var(name: &str) -> Option<u32> {
    let value = std::env::var(name).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("{} is not a number: {}", name, value);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LayerConfig::default();

        assert_eq!(config.max_local_marker_depth_per_command_buffer, 0);
        assert_eq!(config.num_timer_query_slots, 65536);
        assert_eq!(config.slot_exhaustion, SlotExhaustionPolicy::Fatal);
    }

    #[test]
    fn test_empty_bytes_yield_defaults() {
        let config = LayerConfig::from_bytes(b"").unwrap();
        assert_eq!(config.num_timer_query_slots, 65536);
    }

    #[test]
    fn test_json_round_trip() {
        let config = LayerConfig {
            max_local_marker_depth_per_command_buffer: 3,
            num_timer_query_slots: 1024,
            slot_exhaustion: SlotExhaustionPolicy::Skip,
        };

        let parsed = LayerConfig::from_bytes(&config.to_bytes()).unwrap();

        assert_eq!(parsed.max_local_marker_depth_per_command_buffer, 3);
        assert_eq!(parsed.num_timer_query_slots, 1024);
        assert_eq!(parsed.slot_exhaustion, SlotExhaustionPolicy::Skip);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = LayerConfig::from_bytes(br#"{"maxMarkerDepth": 2}"#).unwrap();

        assert_eq!(config.max_local_marker_depth_per_command_buffer, 2);
        assert_eq!(config.num_timer_query_slots, 65536);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(LayerConfig::from_bytes(b"not json").is_err());
    }
}
