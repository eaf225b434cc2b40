//! The server: composition root of a peripheral
//!
//! A `Server` owns the validated object tree, the requested controller
//! capabilities, the advertising payload and the data bridge. It is built
//! once and never changes; the transport layer shares it (usually as an
//! `Arc<Server>`) and routes every inbound request through it.

use super::config::{owned_name_for, parse_advertising_data, AdStructure, Capabilities, ServerConfig};
use crate::bridge::DataBridge;
use crate::dbus::constants::{GATT_CHARACTERISTIC_INTERFACE, GATT_SERVICE_INTERFACE};
use crate::dbus::{
    Connection, DispatchResult, Interface, Invocation, ObjectNode, ObjectPath, ObjectTree,
    Property, Value,
};
use crate::error::{ServerError, ServerResult};
use crate::gatt::{AdvertisementBuilder, AdvertisementType};
use crate::uuid::Uuid;
use log::{debug, info, trace, warn};
use std::fmt;
use std::sync::Arc;

/// Path segment of the advertisement object below the namespace root
pub const ADVERTISEMENT_SEGMENT: &str = "advertisement";

/// Property name/value pairs of one interface
pub type PropertyMap = Vec<(String, Value)>;

/// Interfaces of one object with their properties
pub type InterfaceMap = Vec<(String, PropertyMap)>;

/// A BLE peripheral's object tree and configuration
pub struct Server {
    service_name: String,
    namespace_root: ObjectPath,
    capabilities: Capabilities,
    advertising_data: Vec<u8>,
    tree: ObjectTree,
    bridge: Option<Arc<dyn DataBridge>>,
}

impl Server {
    /// Validate the configuration and object description and build a server
    ///
    /// Every object must live at or below the namespace root. When the
    /// advertising capability is requested, an advertisement object listing
    /// the primary service UUIDs is added at `<root>/advertisement`.
    pub fn new(
        config: ServerConfig,
        objects: Vec<ObjectNode>,
        bridge: Option<Arc<dyn DataBridge>>,
    ) -> ServerResult<Self> {
        let service_name = config.canonical_service_name()?;
        let namespace_root = config.namespace_root()?;
        parse_advertising_data(&config.advertising_data)?;

        for object in &objects {
            let path = object.path();
            if path != &namespace_root && !path.is_descendant_of(&namespace_root) {
                return Err(ServerError::OutsideNamespace {
                    path: path.clone(),
                    root: namespace_root,
                });
            }
        }

        let mut tree = ObjectTree::new(objects)?;

        if config.capabilities.contains(Capabilities::ADVERTISING) {
            let kind = if config.capabilities.contains(Capabilities::CONNECTABLE) {
                AdvertisementType::Peripheral
            } else {
                AdvertisementType::Broadcast
            };
            let mut advertisement = AdvertisementBuilder::new(ADVERTISEMENT_SEGMENT, kind)
                .local_name(&service_name)
                .discoverable(config.capabilities.contains(Capabilities::DISCOVERABLE));
            for uuid in primary_service_uuids(&tree) {
                advertisement = advertisement.service_uuid(uuid);
            }

            let mut roots = tree.into_roots();
            roots.push(advertisement.build(&namespace_root)?);
            tree = ObjectTree::new(roots)?;
        }

        if bridge.is_none() {
            warn!("Server {} has no data bridge; bridged values are unavailable", service_name);
        }

        info!(
            "Server {} ready: {} objects under {}, advertising data [{}]",
            owned_name_for(&service_name),
            tree.len(),
            namespace_root,
            hex::encode(&config.advertising_data)
        );

        Ok(Self {
            service_name,
            namespace_root,
            capabilities: config.capabilities,
            advertising_data: config.advertising_data,
            tree,
            bridge,
        })
    }

    // Configuration accessors

    /// Lower-case service name
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Bus ownership name, `com.<service name>`
    pub fn owned_name(&self) -> String {
        owned_name_for(&self.service_name)
    }

    /// Root of the object namespace, `/com/<service name>`
    pub fn namespace_root(&self) -> &ObjectPath {
        &self.namespace_root
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn enable_bredr(&self) -> bool {
        self.capabilities.contains(Capabilities::BREDR)
    }

    pub fn enable_secure_connection(&self) -> bool {
        self.capabilities.contains(Capabilities::SECURE_CONNECTIONS)
    }

    pub fn enable_connectable(&self) -> bool {
        self.capabilities.contains(Capabilities::CONNECTABLE)
    }

    pub fn enable_discoverable(&self) -> bool {
        self.capabilities.contains(Capabilities::DISCOVERABLE)
    }

    pub fn enable_advertising(&self) -> bool {
        self.capabilities.contains(Capabilities::ADVERTISING)
    }

    pub fn enable_bondable(&self) -> bool {
        self.capabilities.contains(Capabilities::BONDABLE)
    }

    pub fn advertising_data(&self) -> &[u8] {
        &self.advertising_data
    }

    /// The advertising payload split into AD structures
    pub fn advertising_structures(&self) -> Vec<AdStructure> {
        // Validated at construction
        parse_advertising_data(&self.advertising_data).unwrap_or_default()
    }

    pub fn data_bridge(&self) -> Option<&dyn DataBridge> {
        self.bridge.as_deref()
    }

    pub fn tree(&self) -> &ObjectTree {
        &self.tree
    }

    /// Root objects, each describing a group of services
    pub fn objects(&self) -> &[ObjectNode] {
        self.tree.roots()
    }

    // Resolution

    pub fn find_interface(&self, path: &ObjectPath, interface: &str) -> Option<&Interface> {
        self.tree.find_interface(path, interface)
    }

    pub fn find_property(
        &self,
        path: &ObjectPath,
        interface: &str,
        property: &str,
    ) -> Option<&Property> {
        self.tree.find_property(path, interface, property)
    }

    /// Find and call a method
    ///
    /// Returns true iff the method was found and called; the reply is left
    /// in `invocation`.
    pub fn call_method(
        &self,
        path: &ObjectPath,
        interface: &str,
        method: &str,
        connection: &dyn Connection,
        args: &[Value],
        invocation: &mut Invocation,
    ) -> bool {
        self.tree.call_method(
            path,
            interface,
            method,
            connection,
            args,
            self.data_bridge(),
            invocation,
        )
    }

    // org.freedesktop.DBus.Properties

    pub fn get_property(&self, path: &ObjectPath, interface: &str, property: &str) -> DispatchResult<Value> {
        self.tree
            .resolve_property(path, interface, property)?
            .read(self.data_bridge())
    }

    pub fn set_property(
        &self,
        path: &ObjectPath,
        interface: &str,
        property: &str,
        value: Value,
    ) -> DispatchResult<()> {
        self.tree
            .resolve_property(path, interface, property)?
            .write(self.data_bridge(), value)
    }

    /// Readable properties of one interface; unavailable values are skipped
    pub fn get_all_properties(&self, path: &ObjectPath, interface: &str) -> DispatchResult<PropertyMap> {
        let iface = self.tree.resolve_interface(path, interface)?;
        Ok(self.readable_properties(path, iface))
    }

    fn readable_properties(&self, path: &ObjectPath, interface: &Interface) -> PropertyMap {
        interface
            .properties()
            .iter()
            .filter(|p| p.is_readable())
            .filter_map(|p| match p.read(self.data_bridge()) {
                Ok(value) => Some((p.name().to_string(), value)),
                Err(err) => {
                    debug!("Skipping {}.{} on {}: {}", interface.name(), p.name(), path, err);
                    None
                }
            })
            .collect()
    }

    // org.freedesktop.DBus.ObjectManager

    /// The `GetManagedObjects` reply: every published object with the
    /// readable properties of each of its interfaces
    pub fn managed_objects(&self) -> Vec<(ObjectPath, InterfaceMap)> {
        self.tree
            .nodes()
            .filter(|node| node.is_published())
            .map(|node| {
                let interfaces = node
                    .interfaces()
                    .iter()
                    .map(|iface| {
                        (
                            iface.name().to_string(),
                            self.readable_properties(node.path(), iface),
                        )
                    })
                    .collect();
                (node.path().clone(), interfaces)
            })
            .collect()
    }

    // org.freedesktop.DBus.Introspectable

    /// Introspection XML for `path`, naming every object below it
    ///
    /// Paths above the objects (such as `/com`) introspect as empty nodes
    /// so callers can walk down to the namespace.
    pub fn introspect(&self, path: &ObjectPath) -> DispatchResult<String> {
        self.tree.introspect(path)
    }

    // Notifications

    /// Tell subscribers a characteristic's value changed
    ///
    /// Re-reads the value through `ReadValue` and emits `PropertiesChanged`
    /// for `Value` if notifications are active on the characteristic.
    /// Returns whether a signal was emitted.
    pub fn notify_updated_characteristic(&self, path: &ObjectPath, connection: &dyn Connection) -> bool {
        let notifying = self
            .find_property(path, GATT_CHARACTERISTIC_INTERFACE, "Notifying")
            .and_then(|p| p.read(self.data_bridge()).ok())
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !notifying {
            trace!("Not notifying {}: no active subscription", path);
            return false;
        }

        let mut invocation = Invocation::new();
        let options = [Value::Dict(Vec::new())];
        if !self.call_method(
            path,
            GATT_CHARACTERISTIC_INTERFACE,
            "ReadValue",
            connection,
            &options,
            &mut invocation,
        ) {
            warn!("Characteristic {} is notifying but not readable", path);
            return false;
        }

        let value = match invocation.take_reply() {
            Some(Ok(mut values)) => match values.pop() {
                Some(value) => value,
                None => return false,
            },
            Some(Err(err)) => {
                warn!("Failed to read {} for notification: {}", path, err);
                return false;
            }
            None => return false,
        };

        let changed = [("Value".to_string(), value)];
        match connection.emit_properties_changed(path, GATT_CHARACTERISTIC_INTERFACE, &changed) {
            Ok(()) => {
                debug!("Notified update of {}", path);
                true
            }
            Err(err) => {
                warn!("Failed to notify {}: {}", path, err);
                false
            }
        }
    }
}

/// UUIDs of every primary service in the tree, in tree order
fn primary_service_uuids(tree: &ObjectTree) -> Vec<Uuid> {
    tree.nodes()
        .filter_map(|node| node.find_interface(GATT_SERVICE_INTERFACE))
        .filter(|iface| {
            iface
                .find_property("Primary")
                .and_then(|p| p.read(None).ok())
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
        })
        .filter_map(|iface| iface.find_property("UUID")?.read(None).ok())
        .filter_map(|v| v.as_str()?.parse::<Uuid>().ok())
        .collect()
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("service_name", &self.service_name)
            .field("namespace_root", &self.namespace_root)
            .field("capabilities", &self.capabilities)
            .field("advertising_data", &hex::encode(&self.advertising_data))
            .field("objects", &self.tree.len())
            .field("bridge", &self.bridge.is_some())
            .finish()
    }
}
