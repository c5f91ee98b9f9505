//! Variables exchanged with the state machine

use crate::upnp::DeviceHandle;
use std::borrow::Cow;
use std::collections::HashMap;

/// Value bound to a state machine variable
#[derive(Debug, Clone)]
pub enum Value {
    /// Text, e.g. an address or a port given as a string
    Text(String),
    /// Integer, e.g. a port
    Integer(i64),
    /// Gateway handle produced by discovery
    Device(DeviceHandle),
}

impl Value {
    /// Textual form of scalar values, `None` for device handles
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Text(text) => Some(Cow::Borrowed(text.as_str())),
            Value::Integer(n) => Some(Cow::Owned(n.to_string())),
            Value::Device(_) => None,
        }
    }

    /// Device handle, `None` for scalars
    pub fn as_device(&self) -> Option<&DeviceHandle> {
        match self {
            Value::Device(handle) => Some(handle),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Device(a), Value::Device(b)) => a.same_device(b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<DeviceHandle> for Value {
    fn from(value: DeviceHandle) -> Self {
        Value::Device(value)
    }
}

/// Variable storage owned by the state machine
///
/// Primitives never choose names; they read and write whatever names the
/// caller binds to their inputs and outputs.
pub trait VariableStore {
    /// Current value of `name`, if set
    fn get(&self, name: &str) -> Option<Value>;

    /// Bind `value` to `name`, replacing any previous value
    fn set(&mut self, name: &str, value: Value);
}

/// In-memory variable store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    variables: HashMap<String, Value>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is bound
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Number of bound variables
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether no variable is bound
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl VariableStore for MemoryStore {
    fn get(&self, name: &str) -> Option<Value> {
        self.variables.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }
}
