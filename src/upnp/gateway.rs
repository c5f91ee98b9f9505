//! `igd-next` backed gateway discovery and control
//!
//! SSDP search finds the IGD on the local network, then SOAP requests are sent
//! to its control URL. `igd_next::search_gateway` stops at the first answer, so
//! a search yields zero or one candidate.

use super::device::{AddPortReply, DeviceHandle, IgdBackend, IgdDevice};
use super::types::{AddPortMapping, UpnpError};
use crate::settings::Settings;
use igd_next::{AddPortError, PortMappingProtocol, RequestError, SearchError, SearchOptions};
use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Gateway search over the real network
#[derive(Debug, Clone)]
pub struct IgdNextBackend {
    bind_address: SocketAddr,
    broadcast_address: SocketAddr,
}

impl IgdNextBackend {
    /// Backend with default SSDP addresses
    pub fn new() -> Self {
        Self::from_settings(&Settings::default())
    }

    /// Backend using the SSDP addresses from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            bind_address: settings.bind_address,
            broadcast_address: settings.broadcast_address,
        }
    }
}

impl Default for IgdNextBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl IgdBackend for IgdNextBackend {
    fn discover(&self, timeout: Duration) -> Result<Vec<DeviceHandle>, UpnpError> {
        debug!(
            "Searching for UPnP IGD gateway (bind {}, broadcast {}, timeout {:?})",
            self.bind_address, self.broadcast_address, timeout
        );

        let options = SearchOptions {
            bind_addr: self.bind_address,
            broadcast_address: self.broadcast_address,
            timeout: Some(timeout),
            ..Default::default()
        };

        match classify_search(igd_next::search_gateway(options))? {
            Some(gateway) => {
                info!("Found UPnP gateway at {}", gateway.addr);
                Ok(vec![DeviceHandle::new(IgdNextDevice::new(gateway))])
            }
            None => {
                debug!("No UPnP gateway answered within {:?}", timeout);
                Ok(Vec::new())
            }
        }
    }
}

/// A gateway found by [`IgdNextBackend`]
#[derive(Debug)]
pub struct IgdNextDevice {
    gateway: igd_next::Gateway,
}

impl IgdNextDevice {
    /// Wrap a gateway returned by an SSDP search
    pub fn new(gateway: igd_next::Gateway) -> Self {
        Self { gateway }
    }
}

impl IgdDevice for IgdNextDevice {
    fn lan_address(&self) -> Result<String, UpnpError> {
        local_ip_toward(self.gateway.addr).map(|ip| ip.to_string())
    }

    fn external_ip(&self) -> Result<String, UpnpError> {
        self.gateway
            .get_external_ip()
            .map(|ip| ip.to_string())
            .map_err(|e| UpnpError::Device(format!("GetExternalIPAddress failed: {}", e)))
    }

    fn add_port_mapping(&self, request: &AddPortMapping) -> Result<AddPortReply, UpnpError> {
        // The SOAP layer only knows these two; anything else would be refused by the device
        let protocol = match mapping_protocol(&request.protocol) {
            Some(protocol) => protocol,
            None => {
                return Ok(AddPortReply::Rejected(format!(
                    "unsupported protocol {:?}",
                    request.protocol
                )));
            }
        };

        let internal_ip = match request.internal_client.parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(_) => {
                return Ok(AddPortReply::Rejected(format!(
                    "invalid internal client {:?}",
                    request.internal_client
                )));
            }
        };
        let local_addr = SocketAddr::new(internal_ip, request.internal_port);

        debug!(
            "AddPortMapping {} {} -> {} ({}s, {:?})",
            request.protocol, request.external_port, local_addr, request.lease_duration, request.description
        );

        // add_port signature: (protocol, external_port, local_addr, lease_duration, description)
        classify_add_port(self.gateway.add_port(
            protocol,
            request.external_port,
            local_addr,
            request.lease_duration,
            &request.description,
        ))
    }
}

/// Sort an SSDP search result into found / silent / failed
///
/// A search nobody answered is `Ok(None)`.
pub(crate) fn classify_search(
    result: Result<igd_next::Gateway, SearchError>,
) -> Result<Option<igd_next::Gateway>, UpnpError> {
    match result {
        Ok(gateway) => Ok(Some(gateway)),
        Err(SearchError::NoResponseWithinTimeout) => Ok(None),
        Err(SearchError::IoError(e))
            if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
        {
            Ok(None)
        }
        Err(e) => {
            warn!("UPnP gateway search failed: {}", e);
            Err(UpnpError::Discovery(e.to_string()))
        }
    }
}

/// Sort an AddPortMapping result into accepted / refused / failed
///
/// SOAP error codes and typed refusals come from the device; any other
/// request error means we never got a proper answer.
pub(crate) fn classify_add_port(
    result: Result<(), AddPortError>,
) -> Result<AddPortReply, UpnpError> {
    match result {
        Ok(()) => Ok(AddPortReply::Accepted),
        Err(AddPortError::RequestError(RequestError::ErrorCode(code, message))) => {
            Ok(AddPortReply::Rejected(format!("error {}: {}", code, message)))
        }
        Err(AddPortError::RequestError(e)) => {
            Err(UpnpError::Device(format!("AddPortMapping failed: {}", e)))
        }
        Err(e) => Ok(AddPortReply::Rejected(e.to_string())),
    }
}

/// Map a protocol string onto the SOAP enum, case-sensitive
pub(crate) fn mapping_protocol(protocol: &str) -> Option<PortMappingProtocol> {
    match protocol {
        "TCP" => Some(PortMappingProtocol::TCP),
        "UDP" => Some(PortMappingProtocol::UDP),
        _ => None,
    }
}

/// Local address the OS would use to reach `target`
///
/// Connecting a UDP socket only consults the routing table; nothing is sent.
pub(crate) fn local_ip_toward(target: SocketAddr) -> Result<IpAddr, UpnpError> {
    let bind = match target {
        SocketAddr::V4(_) => "0.0.0.0:0",
        SocketAddr::V6(_) => "[::]:0",
    };
    let socket = UdpSocket::bind(bind)?;
    socket.connect(target)?;
    Ok(socket.local_addr()?.ip())
}
