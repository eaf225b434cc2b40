//! Unit tests for the object tree and dispatch

use super::*;
use crate::bridge::{DataBridge, FnBridge};
use crate::error::ServerError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Connection that records emitted signals
#[derive(Default)]
struct MockConnection {
    signals: Mutex<Vec<(ObjectPath, String, Vec<(String, Value)>)>>,
}

impl Connection for MockConnection {
    fn emit_properties_changed(
        &self,
        path: &ObjectPath,
        interface: &str,
        changed: &[(String, Value)],
    ) -> DispatchResult<()> {
        self.signals
            .lock()
            .unwrap()
            .push((path.clone(), interface.to_string(), changed.to_vec()));
        Ok(())
    }
}

fn path(s: &str) -> ObjectPath {
    ObjectPath::new(s).unwrap()
}

/// Bridge that counts setter calls
fn counting_bridge(sets: Arc<AtomicUsize>) -> impl DataBridge {
    FnBridge::new(
        |element| match element {
            "battery/level" => Some(Value::Byte(87)),
            "text/string" => Some(Value::from("Hello")),
            "wrong/kind" => Some(Value::from("not a byte")),
            _ => None,
        },
        move |_element, _value| {
            sets.fetch_add(1, Ordering::SeqCst);
            true
        },
    )
}

fn battery_tree(calls: Arc<AtomicUsize>) -> ObjectTree {
    let counter = calls.clone();
    let battery = Interface::new("com.example.Battery")
        .property(Property::bridged(
            "Level",
            ValueKind::Byte,
            "battery/level",
            PropertyAccess::READ,
        ))
        .property(Property::constant("Unit", "percent"))
        .method(
            Method::new("Reset", move |_ctx, _args| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec![Value::Bool(true)])
            })
            .output("ok", "b"),
        );

    let root = ObjectNode::new(path("/org/example/svc0"))
        .interface(battery)
        .child(
            ObjectNode::new(path("/org/example/svc0/char0"))
                .interface(Interface::new("com.example.Other")),
        );

    ObjectTree::new(vec![root]).unwrap()
}

#[test]
fn test_find_interface_requires_exact_path_and_name() {
    let tree = battery_tree(Arc::new(AtomicUsize::new(0)));

    let found = tree.find_interface(&path("/org/example/svc0"), "com.example.Battery");
    assert_eq!(found.map(Interface::name), Some("com.example.Battery"));

    // Child path, parent interface
    assert!(tree
        .find_interface(&path("/org/example/svc0/char0"), "com.example.Battery")
        .is_none());
    // Prefix of a real path
    assert!(tree
        .find_interface(&path("/org/example"), "com.example.Battery")
        .is_none());
    // Right path, wrong interface
    assert!(tree
        .find_interface(&path("/org/example/svc0"), "com.example.Batter")
        .is_none());
    // Nested node resolves
    assert!(tree
        .find_interface(&path("/org/example/svc0/char0"), "com.example.Other")
        .is_some());
}

#[test]
fn test_battery_level_scenario() {
    let tree = battery_tree(Arc::new(AtomicUsize::new(0)));
    let sets = Arc::new(AtomicUsize::new(0));
    let bridge = counting_bridge(sets.clone());
    let svc = path("/org/example/svc0");

    let level = tree
        .find_property(&svc, "com.example.Battery", "Level")
        .expect("Level should resolve");
    assert_eq!(level.read(Some(&bridge)), Ok(Value::Byte(87)));

    assert!(tree
        .find_property(&svc, "com.example.Battery", "Temperature")
        .is_none());

    // Read-only: write rejected without touching the setter
    assert!(matches!(
        level.write(Some(&bridge), Value::Byte(12)),
        Err(DispatchError::WriteNotPermitted(_))
    ));
    assert_eq!(sets.load(Ordering::SeqCst), 0);
}

#[test]
fn test_resolve_names_the_miss() {
    let tree = battery_tree(Arc::new(AtomicUsize::new(0)));
    let svc = path("/org/example/svc0");

    assert_eq!(
        tree.resolve_property(&path("/org/example/nope"), "com.example.Battery", "Level")
            .unwrap_err(),
        DispatchError::UnknownObject(path("/org/example/nope"))
    );
    let err = tree
        .resolve_property(&svc, "com.example.Nope", "Level")
        .unwrap_err();
    assert_eq!(err.error_name(), constants::ERROR_UNKNOWN_INTERFACE);
    assert!(err.is_miss());

    let err = tree
        .resolve_property(&svc, "com.example.Battery", "Temperature")
        .unwrap_err();
    assert_eq!(err.error_name(), constants::ERROR_UNKNOWN_PROPERTY);

    let reset = tree.resolve_method(&svc, "com.example.Battery", "Reset").unwrap();
    assert_eq!(reset.name(), "Reset");

    let err = tree
        .resolve_method(&svc, "com.example.Battery", "Recalibrate")
        .unwrap_err();
    assert_eq!(
        err,
        DispatchError::UnknownMethod {
            interface: "com.example.Battery".to_string(),
            method: "Recalibrate".to_string(),
        }
    );
    assert_eq!(err.error_name(), constants::ERROR_UNKNOWN_METHOD);
    assert!(err.is_miss());

    assert!(matches!(
        tree.resolve_method(&svc, "com.example.Nope", "Reset"),
        Err(DispatchError::UnknownInterface { .. })
    ));
}

#[test]
fn test_call_method_invokes_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let tree = battery_tree(calls.clone());
    let connection = MockConnection::default();
    let svc = path("/org/example/svc0");

    let mut invocation = Invocation::new();
    assert!(tree.call_method(
        &svc,
        "com.example.Battery",
        "Reset",
        &connection,
        &[],
        None,
        &mut invocation
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(invocation.take_reply(), Some(Ok(vec![Value::Bool(true)])));

    // Mismatches: nothing invoked, reply slot untouched
    let misses = [
        ("/org/example/svc0/char0", "com.example.Battery", "Reset"),
        ("/org/example/svc0", "com.example.Other", "Reset"),
        ("/org/example/svc0", "com.example.Battery", "Level"),
        ("/org/example/svc0", "com.example.Battery", "reset"),
    ];
    for (p, iface, method) in misses {
        let mut invocation = Invocation::new();
        assert!(!tree.call_method(&path(p), iface, method, &connection, &[], None, &mut invocation));
        assert!(!invocation.is_answered());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_call_method_reports_bad_arguments_in_reply() {
    let calls = Arc::new(AtomicUsize::new(0));
    let tree = battery_tree(calls.clone());
    let connection = MockConnection::default();

    let mut invocation = Invocation::new();
    assert!(tree.call_method(
        &path("/org/example/svc0"),
        "com.example.Battery",
        "Reset",
        &connection,
        &[Value::Byte(1)],
        None,
        &mut invocation
    ));
    assert!(matches!(
        invocation.reply(),
        Some(Err(DispatchError::InvalidArgs(_)))
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_duplicate_interface_rejected() {
    let node = ObjectNode::new(path("/com/test"))
        .interface(Interface::new("com.example.Battery"))
        .interface(Interface::new("com.example.Battery"));

    assert_eq!(
        ObjectTree::new(vec![node]).unwrap_err(),
        ServerError::DuplicateInterface {
            path: path("/com/test"),
            interface: "com.example.Battery".into(),
        }
    );
}

#[test]
fn test_duplicate_path_rejected() {
    let a = ObjectNode::new(path("/com/test")).child(ObjectNode::new(path("/com/test/a")));
    let b = ObjectNode::new(path("/com/test/a"));

    assert_eq!(
        ObjectTree::new(vec![a, b]).unwrap_err(),
        ServerError::DuplicatePath(path("/com/test/a"))
    );
}

#[test]
fn test_duplicate_member_rejected() {
    let iface = Interface::new("com.example.Battery")
        .property(Property::constant("Level", 1u8))
        .property(Property::constant("Level", 2u8));
    let node = ObjectNode::new(path("/com/test")).interface(iface);

    assert!(matches!(
        ObjectTree::new(vec![node]),
        Err(ServerError::DuplicateMember { member, .. }) if member == "Level"
    ));

    let iface = Interface::new("com.example.Battery")
        .property(Property::constant("Level", 1u8))
        .method(Method::new("Level", |_, _| Ok(Vec::new())));
    let node = ObjectNode::new(path("/com/test")).interface(iface);
    assert!(ObjectTree::new(vec![node]).is_err());
}

#[test]
fn test_invalid_names_rejected() {
    let node = ObjectNode::new(path("/com/test")).interface(Interface::new("Battery"));
    assert_eq!(
        ObjectTree::new(vec![node]).unwrap_err(),
        ServerError::InvalidInterfaceName("Battery".into())
    );

    let node = ObjectNode::new(path("/com/test"))
        .interface(Interface::new("com.example.Battery").property(Property::constant("", 1u8)));
    assert_eq!(
        ObjectTree::new(vec![node]).unwrap_err(),
        ServerError::InvalidMemberName(String::new())
    );

    assert!(interface::is_valid_interface_name("org.bluez.GattService1"));
    assert!(!interface::is_valid_interface_name("org..bluez"));
    assert!(!interface::is_valid_interface_name("org.1bluez"));
}

#[test]
fn test_child_must_extend_parent() {
    let node = ObjectNode::new(path("/com/test")).child(ObjectNode::new(path("/com/other")));
    assert!(matches!(
        ObjectTree::new(vec![node]),
        Err(ServerError::ChildOutsideParent { .. })
    ));
}

#[test]
fn test_nodes_depth_first_order() {
    let tree = ObjectTree::new(vec![
        ObjectNode::new(path("/a"))
            .child(ObjectNode::new(path("/a/b")).child(ObjectNode::new(path("/a/b/c"))))
            .child(ObjectNode::new(path("/a/d"))),
        ObjectNode::new(path("/e")),
    ])
    .unwrap();

    let order: Vec<&str> = tree.nodes().map(|n| n.path().as_str()).collect();
    assert_eq!(order, vec!["/a", "/a/b", "/a/b/c", "/a/d", "/e"]);
    assert_eq!(tree.len(), 5);
}

#[test]
fn test_property_access_rules() {
    let sets = Arc::new(AtomicUsize::new(0));
    let bridge = counting_bridge(sets.clone());

    let write_only = Property::bridged("Secret", ValueKind::String, "text/string", PropertyAccess::WRITE);
    assert!(matches!(
        write_only.read(Some(&bridge)),
        Err(DispatchError::ReadNotPermitted(_))
    ));
    assert_eq!(write_only.write(Some(&bridge), Value::from("x")), Ok(()));
    assert_eq!(sets.load(Ordering::SeqCst), 1);

    // Type mismatch on write is rejected before the setter
    assert!(matches!(
        write_only.write(Some(&bridge), Value::Byte(1)),
        Err(DispatchError::InvalidArgs(_))
    ));
    assert_eq!(sets.load(Ordering::SeqCst), 1);

    // Getter returning the wrong kind
    let wrong = Property::bridged("Level", ValueKind::Byte, "wrong/kind", PropertyAccess::READ);
    assert!(matches!(wrong.read(Some(&bridge)), Err(DispatchError::Failed(_))));

    // Constants are never writable
    let constant = Property::constant("Unit", "percent");
    assert_eq!(constant.read(None), Ok(Value::from("percent")));
    assert!(matches!(
        constant.write(Some(&bridge), Value::from("kelvin")),
        Err(DispatchError::WriteNotPermitted(_))
    ));
}

#[test]
fn test_missing_bridge_is_unavailable() {
    let level = Property::bridged("Level", ValueKind::Byte, "battery/level", PropertyAccess::READ_WRITE);

    let err = level.read(None).unwrap_err();
    assert!(matches!(err, DispatchError::DataUnavailable(_)));
    assert_eq!(err.error_name(), constants::ERROR_NOT_AVAILABLE);
    assert!(!err.is_miss());

    assert!(matches!(
        level.write(None, Value::Byte(3)),
        Err(DispatchError::DataUnavailable(_))
    ));

    // Getter with no value for the element
    let bridge = counting_bridge(Arc::new(AtomicUsize::new(0)));
    let missing = Property::bridged("Missing", ValueKind::Byte, "not/there", PropertyAccess::READ);
    assert!(matches!(
        missing.read(Some(&bridge)),
        Err(DispatchError::DataUnavailable(_))
    ));
}

#[test]
fn test_introspection_xml() {
    let tree = battery_tree(Arc::new(AtomicUsize::new(0)));
    let xml = tree.find_node(&path("/org/example/svc0")).unwrap().introspect();

    assert!(xml.starts_with("<!DOCTYPE node"));
    assert!(xml.contains("<node name=\"/org/example/svc0\">"));
    assert!(xml.contains("<interface name=\"com.example.Battery\">"));
    assert!(xml.contains("<property name=\"Level\" type=\"y\" access=\"read\"/>"));
    assert!(xml.contains("<arg name=\"ok\" type=\"b\" direction=\"out\"/>"));
    assert!(xml.contains("<node name=\"char0\"/>"));
    assert!(xml.trim_end().ends_with("</node>"));
}

#[test]
fn test_tree_introspection_names_every_node_below() {
    let service = ObjectNode::new(path("/com/test"))
        .interface(Interface::new("com.test.Root"))
        .child(ObjectNode::new(path("/com/test/battery/level")));
    let advertisement = ObjectNode::new(path("/com/test/advertisement"));
    let tree = ObjectTree::new(vec![service, advertisement]).unwrap();

    let xml = tree.introspect(&path("/com/test")).unwrap();
    assert!(xml.contains("<interface name=\"com.test.Root\">"));
    assert!(xml.contains("<node name=\"battery\"/>"));
    assert!(xml.contains("<node name=\"advertisement\"/>"));
    assert!(!xml.contains("battery/level"));

    // Intermediate paths have no node of their own
    let xml = tree.introspect(&path("/com")).unwrap();
    assert!(xml.contains("<node name=\"/com\">"));
    assert!(xml.contains("<node name=\"test\"/>"));
    assert!(!xml.contains("<interface"));

    let xml = tree.introspect(&path("/com/test/battery")).unwrap();
    assert!(xml.contains("<node name=\"level\"/>"));

    assert_eq!(
        tree.introspect(&path("/org")),
        Err(DispatchError::UnknownObject(path("/org")))
    );
}

#[test]
fn test_inaccessible_property_rejected() {
    let node = ObjectNode::new(path("/com/test")).interface(
        Interface::new("com.test.Device").property(Property::bridged(
            "Name",
            ValueKind::String,
            "device/name",
            PropertyAccess::empty(),
        )),
    );

    assert_eq!(
        ObjectTree::new(vec![node]).unwrap_err(),
        ServerError::InaccessibleProperty {
            path: path("/com/test"),
            interface: "com.test.Device".to_string(),
            property: "Name".to_string(),
        }
    );
}

#[test]
fn test_tree_is_shareable_across_threads() {
    let tree = Arc::new(battery_tree(Arc::new(AtomicUsize::new(0))));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let tree = tree.clone();
            std::thread::spawn(move || {
                let svc = ObjectPath::new("/org/example/svc0").unwrap();
                (0..100)
                    .filter(|_| tree.find_property(&svc, "com.example.Battery", "Level").is_some())
                    .count()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 100);
    }
}
