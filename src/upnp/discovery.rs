//! IGD discovery and selection

use super::device::IgdBackend;
use super::types::{DiscoveryResult, SelectedDevice, UpnpError, DISCOVERY_TIMEOUT};
use std::sync::Arc;
use tracing::{debug, info};

/// Searches the network for gateways and selects one
///
/// Holds no state besides the backend; every call runs a fresh search.
#[derive(Debug, Clone)]
pub struct DiscoveryOperation<B> {
    backend: B,
}

impl<B: IgdBackend> DiscoveryOperation<B> {
    /// Discovery over `backend`
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Discover gateways, select one and capture its addresses
    ///
    /// Finding nothing is an empty [`DiscoveryResult`]. Transport faults while
    /// probing or querying the selected device are returned as errors.
    pub fn discover(&self) -> Result<DiscoveryResult, UpnpError> {
        debug!("Starting UPnP discovery ({:?} timeout)", DISCOVERY_TIMEOUT);

        let candidates = self.backend.discover(DISCOVERY_TIMEOUT)?;
        let devices_found = candidates.len();
        info!("Devices discovered: {}", devices_found);

        let handle = match self.backend.select(candidates) {
            Some(handle) => handle,
            None => {
                info!("No UPnP devices found");
                return Ok(DiscoveryResult::empty());
            }
        };

        let lan_address = handle.lan_address()?;
        let external_address = handle.external_ip()?;
        info!(
            "Selected UPnP device: LAN {} / external {}",
            lan_address, external_address
        );

        Ok(DiscoveryResult::found(
            devices_found,
            SelectedDevice {
                handle,
                lan_address,
                external_address,
            },
        ))
    }
}

/// Run a discovery on tokio's blocking pool
pub async fn discover_async<B>(backend: Arc<B>) -> Result<DiscoveryResult, UpnpError>
where
    B: IgdBackend + 'static,
{
    tokio::task::spawn_blocking(move || DiscoveryOperation::new(backend).discover())
        .await
        .map_err(|e| UpnpError::Internal(format!("Task join error: {}", e)))?
}
