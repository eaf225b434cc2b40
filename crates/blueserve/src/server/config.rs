//! Server configuration
use crate::dbus::constants::{NAMESPACE_ROOT_SEGMENT, OWNED_NAME_PREFIX};
use crate::dbus::ObjectPath;
use crate::error::{ServerError, ServerResult};
use bitflags::bitflags;

/// Maximum advertising payload carried by a legacy advertising frame
pub const MAX_ADVERTISING_DATA_LEN: usize = 31;

/// Service name used when none is configured
pub const DEFAULT_SERVICE_NAME: &str = "blueserve";

bitflags! {
    /// Controller capabilities requested by the server
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const BREDR = 1 << 0;
        const SECURE_CONNECTIONS = 1 << 1;
        const CONNECTABLE = 1 << 2;
        const DISCOVERABLE = 1 << 3;
        const ADVERTISING = 1 << 4;
        const BONDABLE = 1 << 5;
    }
}

impl Default for Capabilities {
    /// An LE-only peripheral that advertises and accepts connections
    fn default() -> Self {
        Capabilities::CONNECTABLE | Capabilities::DISCOVERABLE | Capabilities::ADVERTISING
    }
}

/// Construction-time description of a server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Name of the server; lower-cased when the server is built
    pub service_name: String,
    /// Raw advertising payload (AD structures)
    pub advertising_data: Vec<u8>,
    /// Requested controller capabilities
    pub capabilities: Capabilities,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            advertising_data: Vec::new(),
            capabilities: Capabilities::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_advertising_data(mut self, data: Vec<u8>) -> Self {
        self.advertising_data = data;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// The service name as stored by the server: validated, lower case
    ///
    /// The name becomes both a path segment and a bus name element, so it
    /// must start with a letter or underscore and contain only letters,
    /// digits and underscores.
    pub fn canonical_service_name(&self) -> ServerResult<String> {
        let name = self.service_name.trim().to_lowercase();
        if name.is_empty() {
            return Err(ServerError::EmptyServiceName);
        }

        let mut chars = name.chars();
        let first_ok = chars
            .next()
            .map_or(false, |c| c.is_ascii_lowercase() || c == '_');
        if !first_ok || !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
            return Err(ServerError::InvalidServiceName(self.service_name.clone()));
        }
        Ok(name)
    }

    /// Root of the server's object namespace, `/com/<service name>`
    pub fn namespace_root(&self) -> ServerResult<ObjectPath> {
        let name = self.canonical_service_name()?;
        Ok(ObjectPath::root()
            .join(NAMESPACE_ROOT_SEGMENT)?
            .join(&name)?)
    }

    /// Bus ownership name, `com.<service name>`
    pub fn owned_name(&self) -> ServerResult<String> {
        Ok(owned_name_for(&self.canonical_service_name()?))
    }
}

pub(crate) fn owned_name_for(service_name: &str) -> String {
    format!("{}{}", OWNED_NAME_PREFIX, service_name)
}

/// One length-type-data structure of an advertising payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdStructure {
    pub ad_type: u8,
    pub data: Vec<u8>,
}

/// Split an advertising payload into its AD structures
///
/// A zero length byte ends the significant part of the payload. A structure
/// running past the end of the payload is an error.
pub fn parse_advertising_data(data: &[u8]) -> ServerResult<Vec<AdStructure>> {
    if data.len() > MAX_ADVERTISING_DATA_LEN {
        return Err(ServerError::AdvertisingDataTooLong {
            len: data.len(),
            max: MAX_ADVERTISING_DATA_LEN,
        });
    }

    let mut result = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let length = usize::from(data[i]);
        if length == 0 {
            break;
        }
        if i + 1 + length > data.len() {
            return Err(ServerError::MalformedAdvertisingData(i));
        }

        result.push(AdStructure {
            ad_type: data[i + 1],
            data: data[i + 2..i + 1 + length].to_vec(),
        });

        i += 1 + length;
    }

    Ok(result)
}
