use std::path::Path;

use serde::Deserialize;
use shardwire_frame::{ClientVersion, DEFAULT_SCRATCH_CAPACITY};
use shardwire_gump::LayoutConfig;
use shardwire_transport::DEFAULT_RING_CAPACITY;

use crate::error::{EngineError, Result};

/// Largest config file accepted by [`EngineConfig::from_path`].
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Engine settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Client version string, e.g. `"7.0.90.0"`. Selects the packet length
    /// table and version-gated fields.
    pub protocol_version: String,
    /// Capacity of the network stream ring in bytes.
    pub ring_capacity: usize,
    /// Capacity of the plugin-injected stream ring in bytes.
    pub plugin_ring_capacity: usize,
    /// Initial size of the frame scratch buffer.
    pub scratch_capacity: usize,
    /// When false, property announcements never queue requests.
    pub tooltips_enabled: bool,
    /// Frames drained per stream per tick; 0 means no limit.
    pub max_frames_per_tick: usize,
    /// Keep a per-frame record in each tick report.
    pub record_frames: bool,
    pub layout: LayoutConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            protocol_version: ClientVersion::default().to_string(),
            ring_capacity: DEFAULT_RING_CAPACITY,
            plugin_ring_capacity: DEFAULT_RING_CAPACITY / 4,
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
            tooltips_enabled: true,
            max_frames_per_tick: 0,
            record_frames: false,
            layout: LayoutConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let size = std::fs::metadata(path)?.len();
        if size > MAX_CONFIG_FILE_SIZE {
            return Err(EngineError::Config(format!(
                "{} is {size} bytes (max {MAX_CONFIG_FILE_SIZE})",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parsed [`EngineConfig::protocol_version`].
    pub fn version(&self) -> Result<ClientVersion> {
        self.protocol_version
            .parse()
            .map_err(|_| EngineError::Config(format!("bad protocol_version {:?}", self.protocol_version)))
    }

    pub fn validate(&self) -> Result<()> {
        self.version()?;
        if self.ring_capacity == 0 || self.plugin_ring_capacity == 0 {
            return Err(EngineError::Config("ring capacity must be non-zero".into()));
        }
        if self.layout.max_decompressed_len == 0 {
            return Err(EngineError::Config(
                "layout.max_decompressed_len must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
