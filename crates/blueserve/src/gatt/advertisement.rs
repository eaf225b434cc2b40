//! LE advertisement object
use super::types::AdvertisementType;
use crate::dbus::constants::LE_ADVERTISEMENT_INTERFACE;
use crate::dbus::{Interface, Method, ObjectNode, ObjectPath, Property};
use crate::error::ServerResult;
use crate::uuid::Uuid;
use log::info;

/// Builds the `org.bluez.LEAdvertisement1` object registered with the
/// advertising manager
#[derive(Debug, Clone)]
pub struct AdvertisementBuilder {
    segment: String,
    kind: AdvertisementType,
    local_name: Option<String>,
    discoverable: bool,
    service_uuids: Vec<Uuid>,
}

impl AdvertisementBuilder {
    pub fn new(segment: &str, kind: AdvertisementType) -> Self {
        Self {
            segment: segment.to_string(),
            kind,
            local_name: None,
            discoverable: false,
            service_uuids: Vec::new(),
        }
    }

    pub fn local_name(mut self, name: &str) -> Self {
        self.local_name = Some(name.to_string());
        self
    }

    pub fn discoverable(mut self, discoverable: bool) -> Self {
        self.discoverable = discoverable;
        self
    }

    pub fn service_uuid(mut self, uuid: Uuid) -> Self {
        if !self.service_uuids.contains(&uuid) {
            self.service_uuids.push(uuid);
        }
        self
    }

    pub fn build(self, root: &ObjectPath) -> ServerResult<ObjectNode> {
        let path = root.join(&self.segment)?;
        let uuids: Vec<String> = self.service_uuids.iter().map(Uuid::to_string).collect();

        let mut interface = Interface::new(LE_ADVERTISEMENT_INTERFACE)
            .property(Property::constant("Type", self.kind.as_str()))
            .property(Property::constant("ServiceUUIDs", uuids))
            .property(Property::constant("Discoverable", self.discoverable));
        if let Some(name) = &self.local_name {
            interface = interface.property(Property::constant("LocalName", name.as_str()));
        }
        interface = interface.method(Method::new("Release", |ctx, _args| {
            info!("Advertisement {} released by the advertising manager", ctx.path);
            Ok(Vec::new())
        }));

        Ok(ObjectNode::new(path).interface(interface))
    }
}
