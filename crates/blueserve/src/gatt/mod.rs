//! GATT (Generic Attribute Profile) objects
//!
//! This module builds the BlueZ-facing objects of a peripheral: services,
//! characteristics, descriptors and the LE advertisement.

pub mod advertisement;
pub mod builder;
pub mod types;

#[cfg(test)]
mod tests;

pub use advertisement::AdvertisementBuilder;
pub use builder::{CharacteristicBuilder, DescriptorBuilder, ServiceBuilder};
pub use types::{AdvertisementType, CharacteristicFlags, DescriptorFlags};
