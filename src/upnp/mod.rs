//! UPnP IGD discovery and port mapping
//!
//! - [`discovery`] - find gateways on the LAN and select one
//! - [`mapping`] - add port mappings on a selected gateway
//! - [`gateway`] - `igd-next` backend talking SSDP/SOAP
//! - [`device`] - capability traits shared by backends
//!
//! Operations are blocking. Nothing is kept between calls: callers hold on to
//! the [`DeviceHandle`] returned by discovery and pass it back in.

pub mod device;
pub mod discovery;
pub mod gateway;
pub mod mapping;
pub mod types;

pub use device::{AddPortReply, DeviceHandle, IgdBackend, IgdDevice};
pub use discovery::{discover_async, DiscoveryOperation};
pub use gateway::{IgdNextBackend, IgdNextDevice};
pub use mapping::{add_port_mapping_async, map_on_device, map_on_selected, PortMappingOperation};
pub use types::{
    parse_port, AddPortMapping, DiscoveryResult, MappingOutcome, PortMappingRequest,
    PortMappingResult, SelectedDevice, UpnpError, DISCOVERY_TIMEOUT, MAPPING_DESCRIPTION,
};
