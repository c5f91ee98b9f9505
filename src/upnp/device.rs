//! Capability surface of an IGD backend
//!
//! Discovery and mapping only talk to gateways through these traits, so the
//! real `igd-next` backend and test doubles are interchangeable.

use super::types::{AddPortMapping, UpnpError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Answer of a device to an AddPortMapping request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddPortReply {
    /// Mapping installed
    Accepted,
    /// Device refused, with its reason
    Rejected(String),
}

/// A selected Internet Gateway Device
///
/// Implementations block on network I/O. `Err` is reserved for transport and
/// protocol faults; a device saying no is an [`AddPortReply::Rejected`].
pub trait IgdDevice: Send + Sync + fmt::Debug {
    /// Address of this host on the device's LAN
    fn lan_address(&self) -> Result<String, UpnpError>;

    /// WAN address as reported by the device
    fn external_ip(&self) -> Result<String, UpnpError>;

    /// Ask the device to install a port mapping
    fn add_port_mapping(&self, request: &AddPortMapping) -> Result<AddPortReply, UpnpError>;
}

/// Search and selection half of the capability surface
pub trait IgdBackend: Send + Sync {
    /// Broadcast a discovery search and collect every responding device
    ///
    /// Silence is `Ok(vec![])`, not an error.
    fn discover(&self, timeout: Duration) -> Result<Vec<DeviceHandle>, UpnpError>;

    /// Pick the device to work with among discovered candidates
    fn select(&self, candidates: Vec<DeviceHandle>) -> Option<DeviceHandle> {
        candidates.into_iter().next()
    }
}

impl<B: IgdBackend + ?Sized> IgdBackend for Arc<B> {
    fn discover(&self, timeout: Duration) -> Result<Vec<DeviceHandle>, UpnpError> {
        (**self).discover(timeout)
    }

    fn select(&self, candidates: Vec<DeviceHandle>) -> Option<DeviceHandle> {
        (**self).select(candidates)
    }
}

/// Opaque handle to a discovered gateway
///
/// Cloning shares the same underlying device. The handle is not reentrant:
/// callers serialize mapping requests on one handle themselves.
#[derive(Clone)]
pub struct DeviceHandle(Arc<dyn IgdDevice>);

impl DeviceHandle {
    /// Wrap a device implementation
    pub fn new<D: IgdDevice + 'static>(device: D) -> Self {
        Self(Arc::new(device))
    }

    /// Whether two handles refer to the same device instance
    pub fn same_device(&self, other: &DeviceHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for DeviceHandle {
    type Target = dyn IgdDevice;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeviceHandle").field(&self.0).finish()
    }
}
