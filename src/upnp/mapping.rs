//! Port mapping on a discovered gateway
//!
//! Two call shapes share one tail:
//! - self-contained: discover, then map on the freshly selected device
//! - bound: map on a device handle obtained from an earlier discovery

use super::device::{AddPortReply, DeviceHandle, IgdBackend};
use super::discovery::DiscoveryOperation;
use super::types::{
    AddPortMapping, MappingOutcome, PortMappingRequest, PortMappingResult, SelectedDevice,
    UpnpError, MAPPING_DESCRIPTION,
};
use crate::settings::Settings;
use chrono::Utc;
use tracing::{debug, info, warn};

/// Adds port mappings, discovering a gateway when none is supplied
#[derive(Debug, Clone)]
pub struct PortMappingOperation<B> {
    discovery: DiscoveryOperation<B>,
    lease_duration: u32,
}

impl<B: IgdBackend> PortMappingOperation<B> {
    /// Operation requesting permanent mappings
    pub fn new(backend: B) -> Self {
        Self {
            discovery: DiscoveryOperation::new(backend),
            lease_duration: 0,
        }
    }

    /// Operation requesting the lease configured in `settings`
    pub fn from_settings(backend: B, settings: &Settings) -> Self {
        Self::new(backend).with_lease_duration(settings.lease_duration_secs)
    }

    /// Request leases of `secs` seconds instead of permanent mappings
    pub fn with_lease_duration(mut self, secs: u32) -> Self {
        self.lease_duration = secs;
        self
    }

    /// Lease sent with every AddPortMapping, 0 for permanent
    pub fn lease_duration(&self) -> u32 {
        self.lease_duration
    }

    /// Discovery used by the self-contained variant
    pub fn discovery(&self) -> &DiscoveryOperation<B> {
        &self.discovery
    }

    /// Self-contained variant: discover, then map on the selected device
    ///
    /// Ports are validated before the search is sent. With no device on the
    /// network this yields the same `NoActiveDevice` outcome as the bound
    /// variant called with an absent handle.
    pub fn add_port_mapping(
        &self,
        external_port: &str,
        internal_port: &str,
        protocol: &str,
    ) -> Result<MappingOutcome, UpnpError> {
        let request = PortMappingRequest::parse(external_port, internal_port, protocol)?;
        let discovery = self.discovery.discover()?;

        match discovery.into_selected() {
            Some(selected) => map_on_selected(&selected, &request, self.lease_duration),
            None => Ok(no_active_device()),
        }
    }

    /// Bound variant: map on a previously discovered device
    ///
    /// Missing addresses are queried from the device. An absent handle
    /// short-circuits before ports are parsed and never touches the network.
    pub fn add_port_mapping_bound(
        &self,
        device: Option<&DeviceHandle>,
        lan_address: Option<&str>,
        external_address: Option<&str>,
        external_port: &str,
        internal_port: &str,
        protocol: &str,
    ) -> Result<MappingOutcome, UpnpError> {
        let Some(device) = device else {
            return Ok(no_active_device());
        };

        let request = PortMappingRequest::parse(external_port, internal_port, protocol)?;

        let lan_address = match lan_address {
            Some(addr) => addr.to_string(),
            None => device.lan_address()?,
        };
        let external_address = match external_address {
            Some(addr) => addr.to_string(),
            None => device.external_ip()?,
        };

        map_on_device(
            device,
            &lan_address,
            &external_address,
            &request,
            self.lease_duration,
        )
    }
}

fn no_active_device() -> MappingOutcome {
    warn!("No UPnP device found. Cannot add port mapping.");
    MappingOutcome::Skipped(UpnpError::NoActiveDevice)
}

/// Map a port on a device selected by discovery
pub fn map_on_selected(
    selected: &SelectedDevice,
    request: &PortMappingRequest,
    lease_duration: u32,
) -> Result<MappingOutcome, UpnpError> {
    map_on_device(
        &selected.handle,
        &selected.lan_address,
        &selected.external_address,
        request,
        lease_duration,
    )
}

/// Ask `device` to forward `request` to `lan_address`
///
/// The reported external address is the caller's, not whatever the device
/// might echo back.
pub fn map_on_device(
    device: &DeviceHandle,
    lan_address: &str,
    external_address: &str,
    request: &PortMappingRequest,
    lease_duration: u32,
) -> Result<MappingOutcome, UpnpError> {
    let add = AddPortMapping {
        remote_host: String::new(),
        external_port: request.external_port,
        protocol: request.protocol.clone(),
        internal_client: lan_address.to_string(),
        internal_port: request.internal_port,
        description: MAPPING_DESCRIPTION.to_string(),
        lease_duration,
    };

    debug!(
        "Adding port mapping: {} [{}] -> {}:{}",
        add.external_port, add.protocol, add.internal_client, add.internal_port
    );

    match device.add_port_mapping(&add)? {
        AddPortReply::Accepted => {
            let result = PortMappingResult {
                external_address: external_address.to_string(),
                external_port: request.external_port,
                internal_address: lan_address.to_string(),
                internal_port: request.internal_port,
                protocol: request.protocol.clone(),
                created_at_ms: Utc::now().timestamp_millis(),
            };
            info!(
                "Port mapping added: {}:{} -> {}:{} [{}]",
                result.external_address,
                result.external_port,
                result.internal_address,
                result.internal_port,
                result.protocol
            );
            Ok(MappingOutcome::Mapped(result))
        }
        AddPortReply::Rejected(reason) => {
            warn!("Failed to add port mapping: {}", reason);
            Ok(MappingOutcome::Skipped(UpnpError::MappingRejected(reason)))
        }
    }
}

/// Run [`map_on_selected`] on tokio's blocking pool
pub async fn add_port_mapping_async(
    selected: SelectedDevice,
    request: PortMappingRequest,
    lease_duration: u32,
) -> Result<MappingOutcome, UpnpError> {
    tokio::task::spawn_blocking(move || map_on_selected(&selected, &request, lease_duration))
        .await
        .map_err(|e| UpnpError::Internal(format!("Task join error: {}", e)))?
}
