// Fake IGD backend for tests
//
// Every call that would hit the network on a real gateway bumps a shared
// counter, so tests can assert that a code path stayed offline.

use crate::upnp::{AddPortMapping, AddPortReply, DeviceHandle, IgdBackend, IgdDevice, UpnpError};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared record of simulated network traffic
#[derive(Debug, Clone, Default)]
pub struct NetworkLog {
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<AddPortMapping>>>,
    search_timeouts: Arc<Mutex<Vec<Duration>>>,
}

impl NetworkLog {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<AddPortMapping> {
        self.requests.lock().unwrap().clone()
    }

    pub fn search_timeouts(&self) -> Vec<Duration> {
        self.search_timeouts.lock().unwrap().clone()
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// How a fake gateway answers AddPortMapping
#[derive(Debug, Clone, PartialEq)]
pub enum FakeReply {
    Accept,
    Reject(String),
    TransportError,
}

#[derive(Debug, Clone)]
pub struct FakeGateway {
    lan: String,
    external: String,
    reply: FakeReply,
    external_ip_fails: bool,
    log: NetworkLog,
}

impl FakeGateway {
    pub fn accepting(lan: &str, external: &str, log: &NetworkLog) -> Self {
        Self {
            lan: lan.to_string(),
            external: external.to_string(),
            reply: FakeReply::Accept,
            external_ip_fails: false,
            log: log.clone(),
        }
    }

    pub fn rejecting(lan: &str, external: &str, reason: &str, log: &NetworkLog) -> Self {
        Self {
            reply: FakeReply::Reject(reason.to_string()),
            ..Self::accepting(lan, external, log)
        }
    }

    pub fn with_reply(mut self, reply: FakeReply) -> Self {
        self.reply = reply;
        self
    }

    pub fn with_failing_external_ip(mut self) -> Self {
        self.external_ip_fails = true;
        self
    }

    pub fn handle(&self) -> DeviceHandle {
        DeviceHandle::new(self.clone())
    }
}

impl IgdDevice for FakeGateway {
    fn lan_address(&self) -> Result<String, UpnpError> {
        self.log.hit();
        Ok(self.lan.clone())
    }

    fn external_ip(&self) -> Result<String, UpnpError> {
        self.log.hit();
        if self.external_ip_fails {
            return Err(UpnpError::Device("GetExternalIPAddress failed".to_string()));
        }
        Ok(self.external.clone())
    }

    fn add_port_mapping(&self, request: &AddPortMapping) -> Result<AddPortReply, UpnpError> {
        self.log.hit();
        self.log.requests.lock().unwrap().push(request.clone());

        // Real devices only speak these two, case-sensitive
        if request.protocol != "TCP" && request.protocol != "UDP" {
            return Ok(AddPortReply::Rejected("error 402: Invalid Args".to_string()));
        }

        match &self.reply {
            FakeReply::Accept => Ok(AddPortReply::Accepted),
            FakeReply::Reject(reason) => Ok(AddPortReply::Rejected(reason.clone())),
            FakeReply::TransportError => Err(UpnpError::Device("connection reset".to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    gateways: Vec<FakeGateway>,
    search_error: Option<String>,
    log: NetworkLog,
}

impl FakeBackend {
    /// A network where nobody answers
    pub fn empty() -> Self {
        Self::default()
    }

    /// A network with one accepting gateway
    pub fn single(lan: &str, external: &str) -> Self {
        let log = NetworkLog::default();
        let gateway = FakeGateway::accepting(lan, external, &log);
        Self::with_gateways(vec![gateway], log)
    }

    pub fn with_gateways(gateways: Vec<FakeGateway>, log: NetworkLog) -> Self {
        Self {
            gateways,
            search_error: None,
            log,
        }
    }

    pub fn failing_search(message: &str) -> Self {
        Self {
            search_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn log(&self) -> NetworkLog {
        self.log.clone()
    }
}

impl IgdBackend for FakeBackend {
    fn discover(&self, timeout: Duration) -> Result<Vec<DeviceHandle>, UpnpError> {
        self.log.hit();
        self.log.search_timeouts.lock().unwrap().push(timeout);

        if let Some(message) = &self.search_error {
            return Err(UpnpError::Discovery(message.clone()));
        }
        Ok(self.gateways.iter().map(FakeGateway::handle).collect())
    }
}

/// Console whose every write fails, like a closed stdout
#[derive(Debug, Default)]
pub struct FailingConsole;

impl io::Write for FailingConsole {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "console closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "console closed"))
    }
}

/// Variable names as a state machine rule would bind them
pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
