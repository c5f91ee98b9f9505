//! Common types for the upnp module

use super::device::DeviceHandle;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Discovery delay handed to the SSDP search
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_millis(200);

/// Description label attached to every mapping we create
pub const MAPPING_DESCRIPTION: &str = "Nopasaran mapping";

/// Errors raised by discovery and port mapping
///
/// The first three variants are expected outcomes on real networks and are
/// reported through [`MappingOutcome::Skipped`] / an empty [`DiscoveryResult`]
/// rather than returned as `Err`. Everything else is fatal.
#[derive(Debug, Error)]
pub enum UpnpError {
    /// Discovery search got no answer
    #[error("No UPnP devices found")]
    NoDevicesFound,

    /// Mapping requested without a device handle
    #[error("No UPnP device found. Cannot add port mapping.")]
    NoActiveDevice,

    /// Device refused the AddPortMapping request
    #[error("Port mapping rejected: {0}")]
    MappingRejected(String),

    /// Port argument is not an integer in 1..=65535
    #[error("Invalid port value: {0:?}")]
    InvalidPortValue(String),

    /// SSDP search failed for a reason other than silence
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Transport or protocol failure while talking to the device
    #[error("Device error: {0}")]
    Device(String),

    /// IO error during communication
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl UpnpError {
    /// Whether the caller is expected to branch on this instead of aborting
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            UpnpError::NoDevicesFound | UpnpError::NoActiveDevice | UpnpError::MappingRejected(_)
        )
    }
}

/// Device picked by discovery, with the addresses captured at selection time
#[derive(Debug, Clone)]
pub struct SelectedDevice {
    /// Handle to the selected gateway
    pub handle: DeviceHandle,
    /// Local address of this host on the gateway's LAN
    pub lan_address: String,
    /// External (WAN) address reported by the gateway
    pub external_address: String,
}

/// Result of a discovery run
///
/// Handle and addresses only exist together, so a partially filled result
/// cannot be built.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryResult {
    /// Number of devices that answered the search
    pub devices_found: usize,
    selected: Option<SelectedDevice>,
}

impl DiscoveryResult {
    /// Result for a search nobody answered
    pub fn empty() -> Self {
        Self::default()
    }

    /// Result with a selected device
    pub fn found(devices_found: usize, selected: SelectedDevice) -> Self {
        Self {
            devices_found,
            selected: Some(selected),
        }
    }

    /// Check if a device was selected
    pub fn is_success(&self) -> bool {
        self.selected.is_some()
    }

    /// The selected device, if any
    pub fn selected(&self) -> Option<&SelectedDevice> {
        self.selected.as_ref()
    }

    /// Consume the result, keeping the selected device
    pub fn into_selected(self) -> Option<SelectedDevice> {
        self.selected
    }

    /// Handle of the selected device
    pub fn device_handle(&self) -> Option<&DeviceHandle> {
        self.selected.as_ref().map(|s| &s.handle)
    }

    /// LAN address captured at selection
    pub fn lan_address(&self) -> Option<&str> {
        self.selected.as_ref().map(|s| s.lan_address.as_str())
    }

    /// External address captured at selection
    pub fn external_address(&self) -> Option<&str> {
        self.selected.as_ref().map(|s| s.external_address.as_str())
    }

    /// Human-readable status report
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Devices discovered: {}", self.devices_found)];
        match &self.selected {
            Some(selected) => {
                lines.push("Selected UPnP device:".to_string());
                lines.push(format!("  LAN IP address: {}", selected.lan_address));
                lines.push(format!("  External IP address: {}", selected.external_address));
            }
            None => lines.push(UpnpError::NoDevicesFound.to_string() + "."),
        }
        lines
    }
}

/// Validated port mapping request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMappingRequest {
    /// External port to open on the gateway
    pub external_port: u16,
    /// Port on this host the traffic is forwarded to
    pub internal_port: u16,
    /// Protocol string handed to the device as-is ("TCP", "UDP")
    pub protocol: String,
}

impl PortMappingRequest {
    /// Parse caller-supplied port values
    ///
    /// Both ports must be integers in 1..=65535. The protocol is not checked
    /// here; the device decides what it accepts.
    pub fn parse(
        external_port: &str,
        internal_port: &str,
        protocol: &str,
    ) -> Result<Self, UpnpError> {
        Ok(Self {
            external_port: parse_port(external_port)?,
            internal_port: parse_port(internal_port)?,
            protocol: protocol.to_string(),
        })
    }
}

/// Parse a port number from text, accepting surrounding whitespace
pub fn parse_port(value: &str) -> Result<u16, UpnpError> {
    match value.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(UpnpError::InvalidPortValue(value.to_string())),
        Ok(port) => Ok(port),
    }
}

/// AddPortMapping arguments as sent to a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPortMapping {
    /// Remote host filter, empty for any
    pub remote_host: String,
    /// Port opened on the WAN side
    pub external_port: u16,
    /// "TCP" or "UDP"
    pub protocol: String,
    /// LAN host receiving the traffic
    pub internal_client: String,
    /// Port on the LAN host
    pub internal_port: u16,
    /// Label shown in the device's mapping table
    pub description: String,
    /// Lease in seconds, 0 for permanent
    pub lease_duration: u32,
}

/// Result of a successful port mapping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortMappingResult {
    /// External IP address visible to the internet
    pub external_address: String,
    /// External port mapped on the gateway
    pub external_port: u16,
    /// LAN address traffic is forwarded to
    pub internal_address: String,
    /// LAN port traffic is forwarded to
    pub internal_port: u16,
    /// Protocol the mapping was requested for
    pub protocol: String,
    /// Timestamp when mapping was created (Unix milliseconds)
    pub created_at_ms: i64,
}

/// Outcome of a mapping attempt that did not fail fatally
#[derive(Debug)]
pub enum MappingOutcome {
    /// The device accepted the mapping
    Mapped(PortMappingResult),
    /// Nothing was mapped; holds a recoverable [`UpnpError`]
    Skipped(UpnpError),
}

impl MappingOutcome {
    /// Check if the mapping was created
    pub fn is_success(&self) -> bool {
        matches!(self, MappingOutcome::Mapped(_))
    }

    /// The mapping, if created
    pub fn result(&self) -> Option<&PortMappingResult> {
        match self {
            MappingOutcome::Mapped(result) => Some(result),
            MappingOutcome::Skipped(_) => None,
        }
    }

    /// Why nothing was mapped
    pub fn reason(&self) -> Option<&UpnpError> {
        match self {
            MappingOutcome::Mapped(_) => None,
            MappingOutcome::Skipped(reason) => Some(reason),
        }
    }

    /// Human-readable status report
    pub fn report_lines(&self) -> Vec<String> {
        match self {
            MappingOutcome::Mapped(result) => vec![format!(
                "Port mapping added: external port {} -> {}:{} [{}]",
                result.external_port, result.internal_address, result.internal_port, result.protocol
            )],
            MappingOutcome::Skipped(UpnpError::MappingRejected(_)) => {
                vec!["Failed to add port mapping.".to_string()]
            }
            MappingOutcome::Skipped(reason) => vec![reason.to_string()],
        }
    }
}
