//! Unit tests for GATT object builders

use super::*;
use crate::bridge::{DataBridge, MemoryBridge};
use crate::dbus::constants::*;
use crate::dbus::{
    Connection, DispatchError, DispatchResult, Invocation, ObjectPath, ObjectTree, Value, ValueKind,
};
use crate::error::ServerError;
use crate::uuid::Uuid;
use std::sync::Mutex;

#[derive(Default)]
struct RecordingConnection {
    changed: Mutex<Vec<(String, Vec<(String, Value)>)>>,
}

impl Connection for RecordingConnection {
    fn emit_properties_changed(
        &self,
        path: &ObjectPath,
        _interface: &str,
        changed: &[(String, Value)],
    ) -> DispatchResult<()> {
        self.changed
            .lock()
            .unwrap()
            .push((path.to_string(), changed.to_vec()));
        Ok(())
    }
}

fn root() -> ObjectPath {
    ObjectPath::new("/com/test").unwrap()
}

fn no_options() -> Value {
    Value::Dict(Vec::new())
}

fn text_tree() -> ObjectTree {
    let service = ServiceBuilder::new("text", Uuid::from_u16(0x1234))
        .characteristic(
            CharacteristicBuilder::new(
                "string",
                Uuid::from_u16(0x5678),
                CharacteristicFlags::READ | CharacteristicFlags::WRITE | CharacteristicFlags::NOTIFY,
            )
            .element("text/string", ValueKind::String)
            .descriptor(
                DescriptorBuilder::new("description", Uuid::from_u16(0x2901), DescriptorFlags::READ)
                    .value("A mutable text string"),
            ),
        )
        .build(&root())
        .unwrap();
    ObjectTree::new(vec![service]).unwrap()
}

fn call(
    tree: &ObjectTree,
    bridge: &dyn DataBridge,
    connection: &dyn Connection,
    path: &str,
    interface: &str,
    method: &str,
    args: &[Value],
) -> DispatchResult<Vec<Value>> {
    let mut invocation = Invocation::new();
    let called = tree.call_method(
        &ObjectPath::new(path).unwrap(),
        interface,
        method,
        connection,
        args,
        Some(bridge),
        &mut invocation,
    );
    assert!(called, "{}.{} should resolve on {}", interface, method, path);
    invocation.take_reply().expect("handler must answer")
}

#[test]
fn test_flag_strings() {
    let flags = CharacteristicFlags::READ | CharacteristicFlags::WRITE_WITHOUT_RESPONSE | CharacteristicFlags::NOTIFY;
    assert_eq!(flags.to_strings(), vec!["read", "write-without-response", "notify"]);
    assert!(flags.can_read() && flags.can_write() && flags.can_notify());

    let secure = CharacteristicFlags::SECURE_READ;
    assert!(secure.can_read());
    assert!(!secure.can_write());

    assert_eq!(
        (DescriptorFlags::READ | DescriptorFlags::ENCRYPT_WRITE).to_strings(),
        vec!["read", "encrypt-write"]
    );
}

#[test]
fn test_service_layout() {
    let tree = text_tree();
    let paths: Vec<&str> = tree.nodes().map(|n| n.path().as_str()).collect();
    assert_eq!(
        paths,
        vec!["/com/test/text", "/com/test/text/string", "/com/test/text/string/description"]
    );

    let service = ObjectPath::new("/com/test/text").unwrap();
    let uuid = tree.find_property(&service, GATT_SERVICE_INTERFACE, "UUID").unwrap();
    assert_eq!(
        uuid.read(None),
        Ok(Value::from("00001234-0000-1000-8000-00805f9b34fb"))
    );

    let characteristic = ObjectPath::new("/com/test/text/string").unwrap();
    let owner = tree
        .find_property(&characteristic, GATT_CHARACTERISTIC_INTERFACE, "Service")
        .unwrap();
    assert_eq!(owner.read(None), Ok(Value::ObjectPath(service)));

    let iface = tree
        .find_interface(&characteristic, GATT_CHARACTERISTIC_INTERFACE)
        .unwrap();
    let methods: Vec<&str> = iface.methods().iter().map(|m| m.name()).collect();
    assert_eq!(methods, vec!["ReadValue", "WriteValue", "StartNotify", "StopNotify"]);
}

#[test]
fn test_read_and_write_through_bridge() {
    let tree = text_tree();
    let bridge = MemoryBridge::new().with("text/string", "Hello, world!");
    let connection = RecordingConnection::default();
    let path = "/com/test/text/string";

    let reply = call(&tree, &bridge, &connection, path, GATT_CHARACTERISTIC_INTERFACE, "ReadValue", &[no_options()]);
    assert_eq!(reply, Ok(vec![Value::Bytes(b"Hello, world!".to_vec())]));

    // Read with offset
    let options = Value::Dict(vec![("offset".into(), Value::UInt16(7))]);
    let reply = call(&tree, &bridge, &connection, path, GATT_CHARACTERISTIC_INTERFACE, "ReadValue", &[options]);
    assert_eq!(reply, Ok(vec![Value::Bytes(b"world!".to_vec())]));

    let options = Value::Dict(vec![("offset".into(), Value::UInt16(100))]);
    let reply = call(&tree, &bridge, &connection, path, GATT_CHARACTERISTIC_INTERFACE, "ReadValue", &[options]);
    assert_eq!(reply, Err(DispatchError::InvalidOffset(100)));

    let reply = call(
        &tree,
        &bridge,
        &connection,
        path,
        GATT_CHARACTERISTIC_INTERFACE,
        "WriteValue",
        &[Value::Bytes(b"Goodbye".to_vec()), no_options()],
    );
    assert_eq!(reply, Ok(Vec::new()));
    assert_eq!(bridge.get("text/string"), Some(Value::from("Goodbye")));

    // Not notifying, so nothing was emitted
    assert!(connection.changed.lock().unwrap().is_empty());

    // Invalid UTF-8 is rejected before the bridge
    let reply = call(
        &tree,
        &bridge,
        &connection,
        path,
        GATT_CHARACTERISTIC_INTERFACE,
        "WriteValue",
        &[Value::Bytes(vec![0xC3, 0x28]), no_options()],
    );
    assert!(matches!(reply, Err(DispatchError::InvalidArgs(_))));
    assert_eq!(bridge.get("text/string"), Some(Value::from("Goodbye")));
}

#[test]
fn test_write_notifies_when_notifying() {
    let tree = text_tree();
    let bridge = MemoryBridge::new().with("text/string", "Hello");
    let connection = RecordingConnection::default();
    let path = "/com/test/text/string";
    let characteristic = ObjectPath::new(path).unwrap();

    let notifying = tree
        .find_property(&characteristic, GATT_CHARACTERISTIC_INTERFACE, "Notifying")
        .unwrap();
    assert_eq!(notifying.read(None), Ok(Value::Bool(false)));

    let reply = call(&tree, &bridge, &connection, path, GATT_CHARACTERISTIC_INTERFACE, "StartNotify", &[]);
    assert_eq!(reply, Ok(Vec::new()));
    assert_eq!(notifying.read(None), Ok(Value::Bool(true)));

    call(
        &tree,
        &bridge,
        &connection,
        path,
        GATT_CHARACTERISTIC_INTERFACE,
        "WriteValue",
        &[Value::Bytes(b"Hi".to_vec()), no_options()],
    )
    .unwrap();

    assert_eq!(
        connection.changed.lock().unwrap().as_slice(),
        &[(path.to_string(), vec![("Value".to_string(), Value::Bytes(b"Hi".to_vec()))])]
    );

    call(&tree, &bridge, &connection, path, GATT_CHARACTERISTIC_INTERFACE, "StopNotify", &[]).unwrap();
    assert_eq!(notifying.read(None), Ok(Value::Bool(false)));
}

#[test]
fn test_constant_descriptor() {
    let tree = text_tree();
    let bridge = MemoryBridge::new();
    let connection = RecordingConnection::default();
    let path = "/com/test/text/string/description";

    let reply = call(&tree, &bridge, &connection, path, GATT_DESCRIPTOR_INTERFACE, "ReadValue", &[no_options()]);
    assert_eq!(reply, Ok(vec![Value::Bytes(b"A mutable text string".to_vec())]));

    // Read-only descriptor has no WriteValue at all
    let mut invocation = Invocation::new();
    assert!(!tree.call_method(
        &ObjectPath::new(path).unwrap(),
        GATT_DESCRIPTOR_INTERFACE,
        "WriteValue",
        &connection,
        &[Value::Bytes(vec![1]), no_options()],
        Some(&bridge),
        &mut invocation,
    ));
}

#[test]
fn test_readable_characteristic_needs_a_source() {
    let result = ServiceBuilder::new("battery", Uuid::from_u16(0x180F))
        .characteristic(CharacteristicBuilder::new(
            "level",
            Uuid::from_u16(0x2A19),
            CharacteristicFlags::READ,
        ))
        .build(&root());

    assert_eq!(
        result.unwrap_err(),
        ServerError::MissingValueSource(ObjectPath::new("/com/test/battery/level").unwrap())
    );
}

#[test]
fn test_invalid_segment_rejected() {
    let result = ServiceBuilder::new("bad-name", Uuid::from_u16(0x180F)).build(&root());
    assert!(matches!(result, Err(ServerError::InvalidPath(_))));
}

#[test]
fn test_advertisement_object() {
    let node = AdvertisementBuilder::new("advertisement", AdvertisementType::Peripheral)
        .local_name("test")
        .discoverable(true)
        .service_uuid(Uuid::from_u16(0x180F))
        .service_uuid(Uuid::from_u16(0x180F))
        .build(&root())
        .unwrap();

    assert_eq!(node.path().as_str(), "/com/test/advertisement");
    let iface = node.find_interface(LE_ADVERTISEMENT_INTERFACE).unwrap();
    assert_eq!(
        iface.find_property("Type").unwrap().read(None),
        Ok(Value::from("peripheral"))
    );
    assert_eq!(
        iface.find_property("ServiceUUIDs").unwrap().read(None),
        Ok(Value::StringArray(vec!["0000180f-0000-1000-8000-00805f9b34fb".into()]))
    );
    assert!(iface.find_method("Release").is_some());
}
