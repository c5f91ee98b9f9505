use crate::upnp::gateway::{classify_add_port, classify_search, local_ip_toward, mapping_protocol};
use crate::upnp::{AddPortReply, UpnpError};
use igd_next::{AddPortError, PortMappingProtocol, RequestError, SearchError};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn test_mapping_protocol_is_case_sensitive() {
    assert_eq!(mapping_protocol("TCP"), Some(PortMappingProtocol::TCP));
    assert_eq!(mapping_protocol("UDP"), Some(PortMappingProtocol::UDP));
    assert_eq!(mapping_protocol("tcp"), None);
    assert_eq!(mapping_protocol("SCTP"), None);
    assert_eq!(mapping_protocol(""), None);
}

#[test]
fn test_local_ip_toward_loopback() {
    let target = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 1900);
    let local = local_ip_toward(target).expect("Loopback route should exist");

    assert_eq!(local, IpAddr::V4(Ipv4Addr::LOCALHOST));
}

// ========================================================================
// Search result classification
// ========================================================================

#[test]
fn test_search_timeout_means_no_devices() {
    let result = classify_search(Err(SearchError::NoResponseWithinTimeout));
    assert!(matches!(result, Ok(None)));
}

#[test]
fn test_search_io_timeouts_mean_no_devices() {
    for kind in [io::ErrorKind::WouldBlock, io::ErrorKind::TimedOut] {
        let err = SearchError::IoError(io::Error::new(kind, "recv timed out"));
        assert!(
            matches!(classify_search(Err(err)), Ok(None)),
            "{:?} should read as silence",
            kind
        );
    }
}

#[test]
fn test_search_other_io_error_is_fatal() {
    let err = SearchError::IoError(io::Error::new(
        io::ErrorKind::AddrInUse,
        "address in use",
    ));

    match classify_search(Err(err)) {
        Err(e @ UpnpError::Discovery(_)) => assert!(!e.is_recoverable()),
        other => panic!("Expected discovery error, got {:?}", other.map(|g| g.is_some())),
    }
}

// ========================================================================
// AddPortMapping result classification
// ========================================================================

#[test]
fn test_add_port_success() {
    assert_eq!(classify_add_port(Ok(())).unwrap(), AddPortReply::Accepted);
}

#[test]
fn test_add_port_soap_error_code_is_rejection() {
    let err = AddPortError::RequestError(RequestError::ErrorCode(
        718,
        "ConflictInMappingEntry".to_string(),
    ));

    assert_eq!(
        classify_add_port(Err(err)).unwrap(),
        AddPortReply::Rejected("error 718: ConflictInMappingEntry".to_string())
    );
}

#[test]
fn test_add_port_typed_refusals_are_rejections() {
    for err in [AddPortError::PortInUse, AddPortError::ActionNotAuthorized] {
        let reply = classify_add_port(Err(err)).expect("Refusal is not fatal");
        assert!(matches!(reply, AddPortReply::Rejected(_)));
    }
}

#[test]
fn test_add_port_transport_failure_is_fatal() {
    let err = AddPortError::RequestError(RequestError::InvalidResponse(
        "truncated SOAP envelope".to_string(),
    ));

    let result = classify_add_port(Err(err));
    assert!(matches!(result, Err(UpnpError::Device(ref msg)) if msg.contains("AddPortMapping failed")));
}

// Searching a real gateway needs a UPnP router on the LAN; run with --ignored
#[test]
#[ignore]
fn test_real_gateway_discovery() {
    use crate::upnp::{DiscoveryOperation, IgdNextBackend};

    let result = DiscoveryOperation::new(IgdNextBackend::new()).discover();
    match result {
        Ok(result) => println!("{:?}", result.report_lines()),
        Err(e) => println!("Discovery failed: {}", e),
    }
}
