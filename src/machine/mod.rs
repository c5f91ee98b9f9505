//! Binding of the UPnP operations to a rule-driven state machine
//!
//! The state machine owns all variables. Primitives resolve their input names
//! through a [`VariableStore`] at call time and write results to the output
//! names they were given.

pub mod primitives;
pub mod variables;

pub use primitives::{Convention, Primitive, Signature, UpnpPrimitives};
pub use variables::{MemoryStore, Value, VariableStore};
