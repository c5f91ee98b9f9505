//! IGD primitives - UPnP gateway discovery and port mapping
//!
//! This library exposes UPnP Internet Gateway Device discovery and NAT port
//! mapping as primitives for a rule-driven state machine. Discovery runs once
//! and yields a device handle; later mapping calls reuse that handle instead
//! of probing the network again.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod machine;
pub mod settings;
pub mod upnp;

#[cfg(test)]
mod tests;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for crate operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Discovery or mapping failed fatally
    #[error("UPnP error: {0}")]
    Upnp(#[from] upnp::UpnpError),

    /// Primitive called with the wrong number of variables
    #[error(
        "{primitive} takes {expected_inputs} inputs and {expected_outputs} outputs, got {inputs} and {outputs}"
    )]
    Arity {
        /// Primitive that was called
        primitive: &'static str,
        /// Inputs its signature takes
        expected_inputs: usize,
        /// Outputs its signature takes
        expected_outputs: usize,
        /// Inputs the call bound
        inputs: usize,
        /// Outputs the call bound
        outputs: usize,
    },

    /// No primitive with this name
    #[error("Unknown primitive: {0}")]
    UnknownPrimitive(String),

    /// Settings could not be read or written
    #[error("Config error: {0}")]
    Config(String),
}

/// Initialize logging with the default subscriber
pub fn init() {
    tracing_subscriber::fmt::init();
}

/// Initialize logging with an `EnvFilter` directive, e.g. `"igd_primitives=debug"`
///
/// `RUST_LOG` takes precedence when set. Does nothing if a subscriber is
/// already installed.
pub fn init_with_filter(filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
