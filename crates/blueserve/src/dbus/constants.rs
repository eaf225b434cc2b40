//! Bus interface and error names

/// Prefix of the bus ownership name; the service name is appended
pub const OWNED_NAME_PREFIX: &str = "com.";

/// First path segment of the server's object namespace
pub const NAMESPACE_ROOT_SEGMENT: &str = "com";

// Standard bus interfaces
pub const OBJECT_MANAGER_INTERFACE: &str = "org.freedesktop.DBus.ObjectManager";

// BlueZ interfaces
pub const GATT_SERVICE_INTERFACE: &str = "org.bluez.GattService1";
pub const GATT_CHARACTERISTIC_INTERFACE: &str = "org.bluez.GattCharacteristic1";
pub const GATT_DESCRIPTOR_INTERFACE: &str = "org.bluez.GattDescriptor1";
pub const LE_ADVERTISEMENT_INTERFACE: &str = "org.bluez.LEAdvertisement1";

// Standard bus error names
pub const ERROR_UNKNOWN_OBJECT: &str = "org.freedesktop.DBus.Error.UnknownObject";
pub const ERROR_UNKNOWN_INTERFACE: &str = "org.freedesktop.DBus.Error.UnknownInterface";
pub const ERROR_UNKNOWN_METHOD: &str = "org.freedesktop.DBus.Error.UnknownMethod";
pub const ERROR_UNKNOWN_PROPERTY: &str = "org.freedesktop.DBus.Error.UnknownProperty";
pub const ERROR_PROPERTY_READ_ONLY: &str = "org.freedesktop.DBus.Error.PropertyReadOnly";
pub const ERROR_INVALID_ARGS: &str = "org.freedesktop.DBus.Error.InvalidArgs";

// BlueZ error names
pub const ERROR_NOT_PERMITTED: &str = "org.bluez.Error.NotPermitted";
pub const ERROR_NOT_AVAILABLE: &str = "org.bluez.Error.NotAvailable";
pub const ERROR_INVALID_OFFSET: &str = "org.bluez.Error.InvalidOffset";
pub const ERROR_FAILED: &str = "org.bluez.Error.Failed";
