//! Runtime settings for discovery and mapping

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// SSDP multicast group and port
pub const SSDP_MULTICAST: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 1900));

/// Settings
///
/// Stored as JSON. Fields missing from the file take their default value.
/// The discovery timeout and mapping description are fixed and not part of
/// the settings.
///
/// # Example
/// ```rust,no_run
/// use igd_primitives::settings::Settings;
///
/// let settings = Settings::load("upnp.json").expect("Failed to load");
/// settings.init_logging();
/// println!("Lease: {}s", settings.lease_duration_secs);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Lease requested for new mappings, 0 for permanent
    pub lease_duration_secs: u32,
    /// Local address the SSDP search socket binds to
    pub bind_address: SocketAddr,
    /// Where the SSDP M-SEARCH is sent
    pub broadcast_address: SocketAddr,
    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
}

impl Settings {
    /// Load settings from a JSON file
    ///
    /// Returns defaults if the file doesn't exist or is empty.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read settings: {}", e)))?;

        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("Failed to parse settings: {}", e)))
    }

    /// Install the tracing subscriber using `log_filter`
    pub fn init_logging(&self) {
        crate::init_with_filter(&self.log_filter);
    }

    /// Save settings to a JSON file, creating parent directories
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create settings directory: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, json)
            .map_err(|e| Error::Config(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lease_duration_secs: 0,
            bind_address: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
            broadcast_address: SSDP_MULTICAST,
            log_filter: "info".to_string(),
        }
    }
}
