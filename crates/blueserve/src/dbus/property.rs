//! Interface properties
use super::error::{DispatchError, DispatchResult};
use super::value::{Value, ValueKind};
use crate::bridge::DataBridge;
use bitflags::bitflags;
use log::{trace, warn};
use std::fmt;
use std::sync::Arc;

bitflags! {
    /// Read/write capability of a property
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyAccess: u8 {
        const READ = 0x01;
        const WRITE = 0x02;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl PropertyAccess {
    /// Access annotation used in introspection data
    ///
    /// Trees reject properties with no access, so the empty set never
    /// reaches a published object.
    pub fn as_introspection_str(&self) -> &'static str {
        if self.contains(PropertyAccess::READ_WRITE) {
            "readwrite"
        } else if self.contains(PropertyAccess::WRITE) {
            "write"
        } else {
            "read"
        }
    }
}

/// Computes a property value on demand
pub type PropertyGetter = Arc<dyn Fn() -> DispatchResult<Value> + Send + Sync>;

/// Where a property's value comes from
#[derive(Clone)]
pub enum PropertySource {
    /// Fixed at construction
    Constant(Value),
    /// Brokered through the data bridge under this element name
    Bridged(String),
    /// Computed by a closure on every read
    Dynamic(PropertyGetter),
}

impl fmt::Debug for PropertySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertySource::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            PropertySource::Bridged(element) => f.debug_tuple("Bridged").field(element).finish(),
            PropertySource::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

/// A named, typed value attached to an interface
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    kind: ValueKind,
    access: PropertyAccess,
    source: PropertySource,
}

impl Property {
    /// A read-only property with a fixed value
    pub fn constant(name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            name: name.to_string(),
            kind: value.kind(),
            access: PropertyAccess::READ,
            source: PropertySource::Constant(value),
        }
    }

    /// A property backed by a data bridge element
    ///
    /// This is the only kind of property that can be writable.
    pub fn bridged(name: &str, kind: ValueKind, element: &str, access: PropertyAccess) -> Self {
        Self {
            name: name.to_string(),
            kind,
            access,
            source: PropertySource::Bridged(element.to_string()),
        }
    }

    /// A read-only property computed on every read
    pub fn dynamic<F>(name: &str, kind: ValueKind, getter: F) -> Self
    where
        F: Fn() -> DispatchResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            kind,
            access: PropertyAccess::READ,
            source: PropertySource::Dynamic(Arc::new(getter)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn access(&self) -> PropertyAccess {
        self.access
    }

    pub fn source(&self) -> &PropertySource {
        &self.source
    }

    pub fn is_readable(&self) -> bool {
        self.access.contains(PropertyAccess::READ)
    }

    pub fn is_writable(&self) -> bool {
        self.access.contains(PropertyAccess::WRITE)
    }

    /// Name of the bridge element behind this property, if any
    pub fn data_element(&self) -> Option<&str> {
        match &self.source {
            PropertySource::Bridged(element) => Some(element),
            _ => None,
        }
    }

    /// Read the current value
    pub fn read(&self, bridge: Option<&dyn DataBridge>) -> DispatchResult<Value> {
        if !self.is_readable() {
            warn!("Rejected read of write-only property {}", self.name);
            return Err(DispatchError::ReadNotPermitted(self.name.clone()));
        }

        let value = match &self.source {
            PropertySource::Constant(value) => value.clone(),
            PropertySource::Dynamic(getter) => getter()?,
            PropertySource::Bridged(element) => {
                let bridge = bridge.ok_or_else(|| {
                    DispatchError::DataUnavailable(format!("no data bridge for {}", element))
                })?;
                bridge.get(element).ok_or_else(|| {
                    DispatchError::DataUnavailable(format!("no value for {}", element))
                })?
            }
        };

        if value.kind() != self.kind {
            return Err(DispatchError::Failed(format!(
                "property {} produced {}, expected {}",
                self.name,
                value.kind(),
                self.kind
            )));
        }

        trace!("Read property {} = {:?}", self.name, value);
        Ok(value)
    }

    /// Store a new value through the data bridge
    ///
    /// Read-only properties reject the write before the bridge is touched.
    pub fn write(&self, bridge: Option<&dyn DataBridge>, value: Value) -> DispatchResult<()> {
        let element = match (&self.source, self.is_writable()) {
            (PropertySource::Bridged(element), true) => element,
            _ => {
                warn!("Rejected write to read-only property {}", self.name);
                return Err(DispatchError::WriteNotPermitted(self.name.clone()));
            }
        };

        if value.kind() != self.kind {
            return Err(DispatchError::InvalidArgs(format!(
                "property {} expects {}, got {}",
                self.name,
                self.kind,
                value.kind()
            )));
        }

        let bridge = bridge.ok_or_else(|| {
            DispatchError::DataUnavailable(format!("no data bridge for {}", element))
        })?;

        trace!("Write property {} = {:?}", self.name, value);
        if bridge.set(element, value) {
            Ok(())
        } else {
            Err(DispatchError::Failed(format!("data bridge refused {}", element)))
        }
    }
}
