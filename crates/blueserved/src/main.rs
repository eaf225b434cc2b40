//! Demo peripheral daemon
//!
//! Builds a peripheral with Device Information, Battery and a writable text
//! service, installs it as the process's server and drives it through a
//! loopback connection that logs every signal it would send.
//!
//! Set `BLUESERVE_NAME` to change the service name and `RUST_LOG` to change
//! the log level.

use blueserve::dbus::constants::{GATT_CHARACTERISTIC_INTERFACE, OBJECT_MANAGER_INTERFACE};
use blueserve::server::{handle, MAX_ADVERTISING_DATA_LEN};
use blueserve::{
    CharacteristicBuilder, CharacteristicFlags, Connection, DataBridge, DescriptorBuilder,
    DescriptorFlags, DispatchResult, Invocation, MemoryBridge, ObjectNode, ObjectPath, Server,
    ServerConfig, ServiceBuilder, Uuid, Value, ValueKind,
};
use log::{debug, info, warn};
use std::error::Error;
use std::sync::Arc;

const TEXT_SERVICE_UUID: &str = "00000001-1e3c-fad4-74e2-97a033f1bfaa";
const TEXT_STRING_UUID: &str = "00000002-1e3c-fad4-74e2-97a033f1bfaa";

// AD types
const AD_FLAGS: u8 = 0x01;
const AD_SHORTENED_LOCAL_NAME: u8 = 0x08;
const AD_COMPLETE_LOCAL_NAME: u8 = 0x09;

/// LE General Discoverable, BR/EDR not supported
const AD_FLAGS_VALUE: u8 = 0x06;

/// Connection that only logs what it would put on the bus
struct LoopbackConnection;

impl Connection for LoopbackConnection {
    fn emit_properties_changed(
        &self,
        path: &ObjectPath,
        interface: &str,
        changed: &[(String, Value)],
    ) -> DispatchResult<()> {
        for (name, value) in changed {
            info!("PropertiesChanged {} {}.{} = {:?}", path, interface, name, value);
        }
        Ok(())
    }
}

/// Flags plus the local name, shortened if it does not fit
fn advertising_data(name: &str) -> Vec<u8> {
    let mut data = vec![0x02, AD_FLAGS, AD_FLAGS_VALUE];

    let room = MAX_ADVERTISING_DATA_LEN - data.len() - 2;
    let (ad_type, name) = if name.len() > room {
        (AD_SHORTENED_LOCAL_NAME, &name.as_bytes()[..room])
    } else {
        (AD_COMPLETE_LOCAL_NAME, name.as_bytes())
    };
    data.push(name.len() as u8 + 1);
    data.push(ad_type);
    data.extend_from_slice(name);
    data
}

fn build_objects(root: &ObjectPath) -> Result<Vec<ObjectNode>, Box<dyn Error>> {
    let device_info = ServiceBuilder::new("device", Uuid::from_u16(0x180A))
        .characteristic(
            CharacteristicBuilder::new("mfgr_name", Uuid::from_u16(0x2A29), CharacteristicFlags::READ)
                .value("Acme Inc."),
        )
        .characteristic(
            CharacteristicBuilder::new("model_num", Uuid::from_u16(0x2A24), CharacteristicFlags::READ)
                .value("Blueserve Demo"),
        )
        .build(root)?;

    let battery = ServiceBuilder::new("battery", Uuid::from_u16(0x180F))
        .characteristic(
            CharacteristicBuilder::new(
                "level",
                Uuid::from_u16(0x2A19),
                CharacteristicFlags::READ | CharacteristicFlags::NOTIFY,
            )
            .element("battery/level", ValueKind::Byte),
        )
        .build(root)?;

    let text = ServiceBuilder::new("text", TEXT_SERVICE_UUID.parse()?)
        .characteristic(
            CharacteristicBuilder::new(
                "string",
                TEXT_STRING_UUID.parse()?,
                CharacteristicFlags::READ | CharacteristicFlags::WRITE | CharacteristicFlags::NOTIFY,
            )
            .element("text/string", ValueKind::String)
            .descriptor(
                DescriptorBuilder::new("description", Uuid::from_u16(0x2901), DescriptorFlags::READ)
                    .value("A mutable text string used for testing"),
            ),
        )
        .build(root)?;

    Ok(vec![device_info, battery, text])
}

fn call(
    server: &Server,
    path: &ObjectPath,
    method: &str,
    args: &[Value],
) -> Result<Vec<Value>, Box<dyn Error>> {
    let mut invocation = Invocation::new();
    if !server.call_method(
        path,
        GATT_CHARACTERISTIC_INTERFACE,
        method,
        &LoopbackConnection,
        args,
        &mut invocation,
    ) {
        return Err(format!("{} has no method {}", path, method).into());
    }
    match invocation.take_reply() {
        Some(reply) => Ok(reply?),
        None => Err(format!("{} on {} left no reply", method, path).into()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let name = std::env::var("BLUESERVE_NAME").unwrap_or_else(|_| "blueserve".to_string());
    let config = ServerConfig::new(&name).with_advertising_data(advertising_data(&name.to_lowercase()));
    let root = config.namespace_root()?;

    let bridge = Arc::new(
        MemoryBridge::new()
            .with("battery/level", 78u8)
            .with("text/string", "Hello, world!"),
    );
    let data: Arc<dyn DataBridge> = bridge.clone();

    let server = Arc::new(Server::new(config, build_objects(&root)?, Some(data))?);
    handle::install(server)?;

    let server = handle::current().ok_or("no server installed")?;
    info!("Serving {} as {}", server.namespace_root(), server.owned_name());

    for (path, interfaces) in server.managed_objects() {
        for (interface, properties) in interfaces {
            debug!("{} {} {:?}", path, interface, properties);
        }
    }
    info!(
        "{}.GetManagedObjects lists {} objects",
        OBJECT_MANAGER_INTERFACE,
        server.managed_objects().len()
    );

    let no_options = || Value::Dict(Vec::new());

    let text = root.join("text")?.join("string")?;
    let reply = call(&server, &text, "ReadValue", &[no_options()])?;
    info!("{} reads {:?}", text, reply);

    call(&server, &text, "StartNotify", &[])?;
    call(
        &server,
        &text,
        "WriteValue",
        &[Value::Bytes(b"Goodbye, world!".to_vec()), no_options()],
    )?;
    info!("Text is now {:?}", bridge.get("text/string"));

    let level = root.join("battery")?.join("level")?;
    call(&server, &level, "StartNotify", &[])?;
    for percent in (75u8..78).rev() {
        bridge.insert("battery/level", percent);
        if !server.notify_updated_characteristic(&level, &LoopbackConnection) {
            warn!("Battery update at {}% was not notified", percent);
        }
    }
    call(&server, &level, "StopNotify", &[])?;

    debug!("{}", server.introspect(&root.join("battery")?)?);

    if let Some(server) = handle::uninstall() {
        info!("Stopped {}", server.owned_name());
    }
    Ok(())
}
