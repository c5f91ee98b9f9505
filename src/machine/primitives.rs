//! UPnP primitives callable from the state machine
//!
//! Each primitive exists in two calling conventions: a reporting one that
//! only prints a status report, and a value-producing one that also writes
//! its results into output variables. Both run the same operation.

use super::variables::{Value, VariableStore};
use crate::settings::Settings;
use crate::upnp::{DiscoveryResult, IgdBackend, MappingOutcome, PortMappingOperation};
use crate::{Error, Result};
use std::io::{self, Write};
use tracing::{debug, warn};

/// How a primitive hands back its results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// Console report only
    Reporting,
    /// Console report plus output variables
    ValueProducing,
}

impl Convention {
    /// Whether results are written into output variables
    pub fn emits_outputs(self) -> bool {
        matches!(self, Convention::ValueProducing)
    }
}

/// Primitives exposed to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Find a gateway and capture its addresses
    Discover,
    /// Forward an external port to this host
    AddPortMapping,
}

impl Primitive {
    /// Look up a primitive by the name rules use
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "discover" => Some(Primitive::Discover),
            "add_port_mapping" => Some(Primitive::AddPortMapping),
            _ => None,
        }
    }

    /// Name rules use to call this primitive
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Discover => "discover",
            Primitive::AddPortMapping => "add_port_mapping",
        }
    }

    /// Argument counts for this primitive under `convention`
    pub fn signature(self, convention: Convention) -> Signature {
        let (inputs, outputs) = match (self, convention) {
            (Primitive::Discover, Convention::Reporting) => (0, 0),
            (Primitive::Discover, Convention::ValueProducing) => (0, 3),
            (Primitive::AddPortMapping, Convention::Reporting) => (3, 0),
            // device, lan address, external address, external port, internal port, protocol
            (Primitive::AddPortMapping, Convention::ValueProducing) => (6, 2),
        };
        Signature {
            name: self.name(),
            inputs,
            outputs,
        }
    }
}

/// Number of input and output variable names a primitive takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Primitive name, for error messages
    pub name: &'static str,
    /// Input variable names expected
    pub inputs: usize,
    /// Output variable names expected
    pub outputs: usize,
}

impl Signature {
    /// Reject calls binding the wrong number of variables
    pub fn check(&self, inputs: &[String], outputs: &[String]) -> Result<()> {
        if inputs.len() != self.inputs || outputs.len() != self.outputs {
            return Err(Error::Arity {
                primitive: self.name,
                expected_inputs: self.inputs,
                expected_outputs: self.outputs,
                inputs: inputs.len(),
                outputs: outputs.len(),
            });
        }
        Ok(())
    }
}

/// Discovery and port mapping primitives over an IGD backend
///
/// Status reports go to `console` (stdout unless replaced).
pub struct UpnpPrimitives<B, W = io::Stdout> {
    mapping: PortMappingOperation<B>,
    console: W,
}

impl<B: IgdBackend> UpnpPrimitives<B> {
    /// Primitives reporting to stdout
    pub fn new(backend: B) -> Self {
        Self::with_console(backend, io::stdout())
    }

    /// Primitives reporting to stdout, leasing mappings per `settings`
    pub fn from_settings(backend: B, settings: &Settings) -> Self {
        Self::new(backend).with_lease_duration(settings.lease_duration_secs)
    }
}

impl<B: IgdBackend, W: Write> UpnpPrimitives<B, W> {
    /// Primitives reporting to `console`
    pub fn with_console(backend: B, console: W) -> Self {
        Self {
            mapping: PortMappingOperation::new(backend),
            console,
        }
    }

    /// Request leases of `secs` seconds for new mappings
    pub fn with_lease_duration(mut self, secs: u32) -> Self {
        self.mapping = self.mapping.with_lease_duration(secs);
        self
    }

    /// Lease requested for new mappings, 0 for permanent
    pub fn lease_duration(&self) -> u32 {
        self.mapping.lease_duration()
    }

    /// Give back the console, e.g. to inspect a buffered report
    pub fn into_console(self) -> W {
        self.console
    }

    /// Run primitive `name` with the given variable bindings
    pub fn invoke(
        &mut self,
        name: &str,
        convention: Convention,
        inputs: &[String],
        outputs: &[String],
        store: &mut dyn VariableStore,
    ) -> Result<()> {
        let primitive =
            Primitive::from_name(name).ok_or_else(|| Error::UnknownPrimitive(name.to_string()))?;
        debug!("Invoking primitive {} ({:?})", primitive.name(), convention);

        match primitive {
            Primitive::Discover => self.discover(convention, inputs, outputs, store).map(|_| ()),
            Primitive::AddPortMapping => self
                .add_port_mapping(convention, inputs, outputs, store)
                .map(|_| ()),
        }
    }

    /// Discover a gateway and report it
    ///
    /// Value-producing outputs: device handle, LAN address, external address.
    /// Nothing is written when no device answered.
    pub fn discover(
        &mut self,
        convention: Convention,
        inputs: &[String],
        outputs: &[String],
        store: &mut dyn VariableStore,
    ) -> Result<DiscoveryResult> {
        Primitive::Discover.signature(convention).check(inputs, outputs)?;

        let result = self.mapping.discovery().discover()?;

        if let (true, Some(selected)) = (convention.emits_outputs(), result.selected()) {
            store.set(&outputs[0], Value::Device(selected.handle.clone()));
            store.set(&outputs[1], Value::Text(selected.lan_address.clone()));
            store.set(&outputs[2], Value::Text(selected.external_address.clone()));
        }

        self.report(&result.report_lines());
        Ok(result)
    }

    /// Add a port mapping and report it
    ///
    /// Reporting inputs: external port, internal port, protocol; a fresh
    /// discovery runs first. Value-producing inputs: device handle, LAN
    /// address, external address, external port, internal port, protocol;
    /// outputs external address and external port, written only on success.
    pub fn add_port_mapping(
        &mut self,
        convention: Convention,
        inputs: &[String],
        outputs: &[String],
        store: &mut dyn VariableStore,
    ) -> Result<MappingOutcome> {
        Primitive::AddPortMapping
            .signature(convention)
            .check(inputs, outputs)?;

        let outcome = match convention {
            Convention::Reporting => self.mapping.add_port_mapping(
                &text(store, &inputs[0]),
                &text(store, &inputs[1]),
                &text(store, &inputs[2]),
            )?,
            Convention::ValueProducing => {
                let device = store.get(&inputs[0]).and_then(|v| v.as_device().cloned());
                let lan_address = optional_text(store, &inputs[1]);
                let external_address = optional_text(store, &inputs[2]);
                self.mapping.add_port_mapping_bound(
                    device.as_ref(),
                    lan_address.as_deref(),
                    external_address.as_deref(),
                    &text(store, &inputs[3]),
                    &text(store, &inputs[4]),
                    &text(store, &inputs[5]),
                )?
            }
        };

        if let (true, Some(result)) = (convention.emits_outputs(), outcome.result()) {
            store.set(&outputs[0], Value::Text(result.external_address.clone()));
            store.set(&outputs[1], Value::from(result.external_port));
        }

        self.report(&outcome.report_lines());
        Ok(outcome)
    }

    /// Print report lines; the operation already happened, so a broken
    /// console only costs the report
    fn report(&mut self, lines: &[String]) {
        let written = lines
            .iter()
            .try_for_each(|line| writeln!(self.console, "{}", line))
            .and_then(|_| self.console.flush());
        if let Err(e) = written {
            warn!("Failed to write report: {}", e);
        }
    }
}

/// Scalar text of a variable; unset or non-scalar reads as empty
fn text(store: &dyn VariableStore, name: &str) -> String {
    optional_text(store, name).unwrap_or_default()
}

/// Scalar text of a variable, `None` when unset or non-scalar
fn optional_text(store: &dyn VariableStore, name: &str) -> Option<String> {
    store
        .get(name)
        .and_then(|value| value.as_text().map(|t| t.into_owned()))
}
