//! Common types for GATT objects
//!
//! Characteristic and descriptor flags, rendered as the flag strings BlueZ
//! reads from the `Flags` property.

use bitflags::bitflags;

bitflags! {
    /// Characteristic flags as understood by `org.bluez.GattCharacteristic1`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CharacteristicFlags: u32 {
        const BROADCAST = 1 << 0;
        const READ = 1 << 1;
        const WRITE_WITHOUT_RESPONSE = 1 << 2;
        const WRITE = 1 << 3;
        const NOTIFY = 1 << 4;
        const INDICATE = 1 << 5;
        const AUTHENTICATED_SIGNED_WRITES = 1 << 6;
        const EXTENDED_PROPERTIES = 1 << 7;
        const RELIABLE_WRITE = 1 << 8;
        const WRITABLE_AUXILIARIES = 1 << 9;
        const ENCRYPT_READ = 1 << 10;
        const ENCRYPT_WRITE = 1 << 11;
        const ENCRYPT_AUTHENTICATED_READ = 1 << 12;
        const ENCRYPT_AUTHENTICATED_WRITE = 1 << 13;
        const SECURE_READ = 1 << 14;
        const SECURE_WRITE = 1 << 15;
        const AUTHORIZE = 1 << 16;
    }
}

const CHARACTERISTIC_FLAG_NAMES: &[(CharacteristicFlags, &str)] = &[
    (CharacteristicFlags::BROADCAST, "broadcast"),
    (CharacteristicFlags::READ, "read"),
    (CharacteristicFlags::WRITE_WITHOUT_RESPONSE, "write-without-response"),
    (CharacteristicFlags::WRITE, "write"),
    (CharacteristicFlags::NOTIFY, "notify"),
    (CharacteristicFlags::INDICATE, "indicate"),
    (CharacteristicFlags::AUTHENTICATED_SIGNED_WRITES, "authenticated-signed-writes"),
    (CharacteristicFlags::EXTENDED_PROPERTIES, "extended-properties"),
    (CharacteristicFlags::RELIABLE_WRITE, "reliable-write"),
    (CharacteristicFlags::WRITABLE_AUXILIARIES, "writable-auxiliaries"),
    (CharacteristicFlags::ENCRYPT_READ, "encrypt-read"),
    (CharacteristicFlags::ENCRYPT_WRITE, "encrypt-write"),
    (CharacteristicFlags::ENCRYPT_AUTHENTICATED_READ, "encrypt-authenticated-read"),
    (CharacteristicFlags::ENCRYPT_AUTHENTICATED_WRITE, "encrypt-authenticated-write"),
    (CharacteristicFlags::SECURE_READ, "secure-read"),
    (CharacteristicFlags::SECURE_WRITE, "secure-write"),
    (CharacteristicFlags::AUTHORIZE, "authorize"),
];

impl CharacteristicFlags {
    const ANY_READ: Self = Self::READ
        .union(Self::ENCRYPT_READ)
        .union(Self::ENCRYPT_AUTHENTICATED_READ)
        .union(Self::SECURE_READ);

    const ANY_WRITE: Self = Self::WRITE
        .union(Self::WRITE_WITHOUT_RESPONSE)
        .union(Self::AUTHENTICATED_SIGNED_WRITES)
        .union(Self::RELIABLE_WRITE)
        .union(Self::ENCRYPT_WRITE)
        .union(Self::ENCRYPT_AUTHENTICATED_WRITE)
        .union(Self::SECURE_WRITE);

    pub fn can_read(&self) -> bool {
        self.intersects(Self::ANY_READ)
    }

    pub fn can_write(&self) -> bool {
        self.intersects(Self::ANY_WRITE)
    }

    pub fn can_notify(&self) -> bool {
        self.intersects(Self::NOTIFY | Self::INDICATE)
    }

    /// BlueZ flag strings in canonical order
    pub fn to_strings(&self) -> Vec<String> {
        CHARACTERISTIC_FLAG_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| name.to_string())
            .collect()
    }
}

bitflags! {
    /// Descriptor flags as understood by `org.bluez.GattDescriptor1`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DescriptorFlags: u16 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const ENCRYPT_READ = 1 << 2;
        const ENCRYPT_WRITE = 1 << 3;
        const ENCRYPT_AUTHENTICATED_READ = 1 << 4;
        const ENCRYPT_AUTHENTICATED_WRITE = 1 << 5;
        const SECURE_READ = 1 << 6;
        const SECURE_WRITE = 1 << 7;
        const AUTHORIZE = 1 << 8;
    }
}

const DESCRIPTOR_FLAG_NAMES: &[(DescriptorFlags, &str)] = &[
    (DescriptorFlags::READ, "read"),
    (DescriptorFlags::WRITE, "write"),
    (DescriptorFlags::ENCRYPT_READ, "encrypt-read"),
    (DescriptorFlags::ENCRYPT_WRITE, "encrypt-write"),
    (DescriptorFlags::ENCRYPT_AUTHENTICATED_READ, "encrypt-authenticated-read"),
    (DescriptorFlags::ENCRYPT_AUTHENTICATED_WRITE, "encrypt-authenticated-write"),
    (DescriptorFlags::SECURE_READ, "secure-read"),
    (DescriptorFlags::SECURE_WRITE, "secure-write"),
    (DescriptorFlags::AUTHORIZE, "authorize"),
];

impl DescriptorFlags {
    const ANY_READ: Self = Self::READ
        .union(Self::ENCRYPT_READ)
        .union(Self::ENCRYPT_AUTHENTICATED_READ)
        .union(Self::SECURE_READ);

    const ANY_WRITE: Self = Self::WRITE
        .union(Self::ENCRYPT_WRITE)
        .union(Self::ENCRYPT_AUTHENTICATED_WRITE)
        .union(Self::SECURE_WRITE);

    pub fn can_read(&self) -> bool {
        self.intersects(Self::ANY_READ)
    }

    pub fn can_write(&self) -> bool {
        self.intersects(Self::ANY_WRITE)
    }

    pub fn to_strings(&self) -> Vec<String> {
        DESCRIPTOR_FLAG_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| name.to_string())
            .collect()
    }
}

/// `Type` of an LE advertisement object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisementType {
    Broadcast,
    Peripheral,
}

impl AdvertisementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvertisementType::Broadcast => "broadcast",
            AdvertisementType::Peripheral => "peripheral",
        }
    }
}
