//! Builders for GATT service, characteristic and descriptor objects
//!
//! Each builder produces an [`ObjectNode`] carrying the matching BlueZ
//! interface. Attribute values are either fixed at construction or brokered
//! through a data bridge element; `ReadValue` and `WriteValue` convert
//! between the element's typed value and the raw bytes BlueZ exchanges.

use super::types::{CharacteristicFlags, DescriptorFlags};
use crate::dbus::constants::{
    GATT_CHARACTERISTIC_INTERFACE, GATT_DESCRIPTOR_INTERFACE, GATT_SERVICE_INTERFACE,
};
use crate::dbus::{
    DispatchError, DispatchResult, Interface, Method, MethodContext, ObjectNode, ObjectPath,
    Property, Value, ValueKind,
};
use crate::error::{ServerError, ServerResult};
use crate::uuid::Uuid;
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where an attribute value lives
#[derive(Debug, Clone)]
enum ValueSource {
    Constant(Value),
    Element { name: String, kind: ValueKind },
}

/// An attribute value bound to its object, shared by the value handlers
#[derive(Debug)]
struct ValueBinding {
    path: ObjectPath,
    source: ValueSource,
}

impl ValueBinding {
    fn read(&self, ctx: &MethodContext<'_>, options: &Value) -> DispatchResult<Vec<u8>> {
        let value = match &self.source {
            ValueSource::Constant(value) => value.clone(),
            ValueSource::Element { name, kind } => {
                let value = ctx.bridge()?.get(name).ok_or_else(|| {
                    DispatchError::DataUnavailable(format!("no value for {}", name))
                })?;
                if value.kind() != *kind {
                    return Err(DispatchError::Failed(format!(
                        "{} produced {}, expected {}",
                        name,
                        value.kind(),
                        kind
                    )));
                }
                value
            }
        };

        let bytes = value.to_le_bytes().ok_or_else(|| {
            DispatchError::Failed(format!("{} has no byte encoding", value.signature()))
        })?;
        let offset = read_offset(options)?;
        if offset > bytes.len() {
            return Err(DispatchError::InvalidOffset(offset));
        }
        Ok(bytes[offset..].to_vec())
    }

    fn write(&self, ctx: &MethodContext<'_>, bytes: &[u8], options: &Value) -> DispatchResult<()> {
        let (name, kind) = match &self.source {
            ValueSource::Element { name, kind } => (name, *kind),
            ValueSource::Constant(_) => {
                return Err(DispatchError::WriteNotPermitted(self.path.to_string()))
            }
        };

        // Partial writes are not supported
        let offset = read_offset(options)?;
        if offset != 0 {
            return Err(DispatchError::InvalidOffset(offset));
        }

        let value = Value::from_le_bytes(kind, bytes).ok_or_else(|| {
            DispatchError::InvalidArgs(format!(
                "{} bytes do not encode {} for {}",
                bytes.len(),
                kind,
                name
            ))
        })?;

        debug!("Writing {:?} to {} via {}", value, self.path, name);
        if ctx.bridge()?.set(name, value) {
            Ok(())
        } else {
            Err(DispatchError::Failed(format!("data bridge refused {}", name)))
        }
    }
}

fn read_offset(options: &Value) -> DispatchResult<usize> {
    match options.dict_get("offset") {
        None => Ok(0),
        Some(Value::UInt16(offset)) => Ok(usize::from(*offset)),
        Some(other) => Err(DispatchError::InvalidArgs(format!(
            "offset must be q, got {}",
            other.signature()
        ))),
    }
}

fn read_value_method(binding: Arc<ValueBinding>) -> Method {
    Method::new("ReadValue", move |ctx, args| {
        let bytes = binding.read(ctx, &args[0])?;
        Ok(vec![Value::Bytes(bytes)])
    })
    .input("options", "a{sv}")
    .output("value", "ay")
}

/// Builds one `org.bluez.GattDescriptor1` object
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    segment: String,
    uuid: Uuid,
    flags: DescriptorFlags,
    source: Option<ValueSource>,
}

impl DescriptorBuilder {
    pub fn new(segment: &str, uuid: Uuid, flags: DescriptorFlags) -> Self {
        Self {
            segment: segment.to_string(),
            uuid,
            flags,
            source: None,
        }
    }

    /// Serve a fixed value
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.source = Some(ValueSource::Constant(value.into()));
        self
    }

    /// Serve the value of a data bridge element
    pub fn element(mut self, name: &str, kind: ValueKind) -> Self {
        self.source = Some(ValueSource::Element {
            name: name.to_string(),
            kind,
        });
        self
    }

    pub fn build(self, characteristic: &ObjectPath) -> ServerResult<ObjectNode> {
        let path = characteristic.join(&self.segment)?;

        let mut interface = Interface::new(GATT_DESCRIPTOR_INTERFACE)
            .property(Property::constant("UUID", self.uuid.to_string()))
            .property(Property::constant("Characteristic", characteristic.clone()))
            .property(Property::constant("Flags", self.flags.to_strings()));

        if self.flags.can_read() || self.flags.can_write() {
            let source = self
                .source
                .ok_or_else(|| ServerError::MissingValueSource(path.clone()))?;
            let binding = Arc::new(ValueBinding {
                path: path.clone(),
                source,
            });

            if self.flags.can_read() {
                interface = interface.method(read_value_method(binding.clone()));
            }
            if self.flags.can_write() {
                interface = interface.method(
                    Method::new("WriteValue", move |ctx, args| {
                        let bytes = args[0].as_bytes().unwrap_or_default();
                        binding.write(ctx, bytes, &args[1])?;
                        Ok(Vec::new())
                    })
                    .input("value", "ay")
                    .input("options", "a{sv}"),
                );
            }
        }

        Ok(ObjectNode::new(path).interface(interface))
    }
}

/// Builds one `org.bluez.GattCharacteristic1` object and its descriptors
#[derive(Debug, Clone)]
pub struct CharacteristicBuilder {
    segment: String,
    uuid: Uuid,
    flags: CharacteristicFlags,
    source: Option<ValueSource>,
    descriptors: Vec<DescriptorBuilder>,
}

impl CharacteristicBuilder {
    pub fn new(segment: &str, uuid: Uuid, flags: CharacteristicFlags) -> Self {
        Self {
            segment: segment.to_string(),
            uuid,
            flags,
            source: None,
            descriptors: Vec::new(),
        }
    }

    /// Serve a fixed value
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.source = Some(ValueSource::Constant(value.into()));
        self
    }

    /// Serve the value of a data bridge element
    pub fn element(mut self, name: &str, kind: ValueKind) -> Self {
        self.source = Some(ValueSource::Element {
            name: name.to_string(),
            kind,
        });
        self
    }

    pub fn descriptor(mut self, descriptor: DescriptorBuilder) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn build(self, service: &ObjectPath) -> ServerResult<ObjectNode> {
        let path = service.join(&self.segment)?;
        let flags = self.flags;

        let mut interface = Interface::new(GATT_CHARACTERISTIC_INTERFACE)
            .property(Property::constant("UUID", self.uuid.to_string()))
            .property(Property::constant("Service", service.clone()))
            .property(Property::constant("Flags", flags.to_strings()));

        let notifying = Arc::new(AtomicBool::new(false));
        if flags.can_notify() {
            let state = notifying.clone();
            interface = interface.property(Property::dynamic("Notifying", ValueKind::Bool, move || {
                Ok(Value::Bool(state.load(Ordering::SeqCst)))
            }));
        }

        if flags.can_read() || flags.can_write() {
            let source = self
                .source
                .ok_or_else(|| ServerError::MissingValueSource(path.clone()))?;
            let binding = Arc::new(ValueBinding {
                path: path.clone(),
                source,
            });

            if flags.can_read() {
                interface = interface.method(read_value_method(binding.clone()));
            }
            if flags.can_write() {
                let state = notifying.clone();
                interface = interface.method(
                    Method::new("WriteValue", move |ctx, args| {
                        let bytes = args[0].as_bytes().unwrap_or_default();
                        binding.write(ctx, bytes, &args[1])?;

                        if state.load(Ordering::SeqCst) {
                            let changed = [("Value".to_string(), Value::Bytes(bytes.to_vec()))];
                            if let Err(err) = ctx.connection.emit_properties_changed(
                                ctx.path,
                                GATT_CHARACTERISTIC_INTERFACE,
                                &changed,
                            ) {
                                warn!("Failed to notify {}: {}", ctx.path, err);
                            }
                        }
                        Ok(Vec::new())
                    })
                    .input("value", "ay")
                    .input("options", "a{sv}"),
                );
            }
        }

        if flags.can_notify() {
            let state = notifying.clone();
            interface = interface.method(Method::new("StartNotify", move |ctx, _args| {
                debug!("Notifications started on {}", ctx.path);
                state.store(true, Ordering::SeqCst);
                Ok(Vec::new())
            }));
            let state = notifying;
            interface = interface.method(Method::new("StopNotify", move |ctx, _args| {
                debug!("Notifications stopped on {}", ctx.path);
                state.store(false, Ordering::SeqCst);
                Ok(Vec::new())
            }));
        }

        let mut node = ObjectNode::new(path.clone()).interface(interface);
        for descriptor in self.descriptors {
            node = node.child(descriptor.build(&path)?);
        }
        Ok(node)
    }
}

/// Builds one `org.bluez.GattService1` object and its characteristics
#[derive(Debug, Clone)]
pub struct ServiceBuilder {
    segment: String,
    uuid: Uuid,
    primary: bool,
    characteristics: Vec<CharacteristicBuilder>,
}

impl ServiceBuilder {
    /// A primary service
    pub fn new(segment: &str, uuid: Uuid) -> Self {
        Self {
            segment: segment.to_string(),
            uuid,
            primary: true,
            characteristics: Vec::new(),
        }
    }

    pub fn secondary(mut self) -> Self {
        self.primary = false;
        self
    }

    pub fn characteristic(mut self, characteristic: CharacteristicBuilder) -> Self {
        self.characteristics.push(characteristic);
        self
    }

    pub fn build(self, root: &ObjectPath) -> ServerResult<ObjectNode> {
        let path = root.join(&self.segment)?;

        let interface = Interface::new(GATT_SERVICE_INTERFACE)
            .property(Property::constant("UUID", self.uuid.to_string()))
            .property(Property::constant("Primary", self.primary));

        let mut node = ObjectNode::new(path.clone()).interface(interface);
        for characteristic in self.characteristics {
            node = node.child(characteristic.build(&path)?);
        }
        Ok(node)
    }
}
