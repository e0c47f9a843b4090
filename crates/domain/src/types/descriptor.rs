//! Typed view of a domain's XML descriptor (`virDomainGetXMLDesc`).
//!
//! Only the parts the collectors read are modelled: declared disks and
//! network interfaces, and the optional OpenStack Nova ownership block under
//! `<metadata>`. Every level is optional; [`DomainDescriptor::ownership`] is
//! the single presence check for the nested metadata.
//!
//! Element names are matched on their local part, so `<nova:instance>` maps
//! to `instance` regardless of the namespace prefix in use.

use serde::Deserialize;
use thiserror::Error;

use crate::errors::VirtstatError;

/// The descriptor could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid domain descriptor: {0}")]
pub struct DescriptorError(pub String);

impl From<DescriptorError> for VirtstatError {
    fn from(err: DescriptorError) -> Self {
        Self::Descriptor(err.0)
    }
}

/// Root `<domain>` element.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainDescriptor {
    #[serde(default)]
    metadata: Option<Metadata>,
    #[serde(default)]
    devices: Option<Devices>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    instance: Option<NovaInstance>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct NovaInstance {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    flavor: Option<NovaFlavor>,
    #[serde(default)]
    owner: Option<NovaOwner>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct NovaFlavor {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct NovaOwner {
    #[serde(default)]
    user: Option<NovaPrincipal>,
    #[serde(default)]
    project: Option<NovaPrincipal>,
}

/// `<nova:user uuid="...">name</nova:user>` and the project equivalent.
#[derive(Debug, Clone, Default, Deserialize)]
struct NovaPrincipal {
    #[serde(default)]
    uuid: Option<String>,
    #[serde(rename = "$value", default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Devices {
    #[serde(rename = "disk", default)]
    disks: Vec<Disk>,
    #[serde(rename = "interface", default)]
    interfaces: Vec<Interface>,
}

/// A declared `<disk>`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Disk {
    #[serde(rename = "type", default)]
    disk_type: Option<String>,
    #[serde(default)]
    driver: Option<DiskDriver>,
    #[serde(default)]
    source: Option<DiskSource>,
    #[serde(default)]
    target: Option<DeviceTarget>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DiskDriver {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    driver_type: Option<String>,
    #[serde(default)]
    discard: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DiskSource {
    #[serde(default)]
    file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DeviceTarget {
    #[serde(default)]
    dev: Option<String>,
    #[serde(default)]
    bus: Option<String>,
}

/// A declared network `<interface>`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Interface {
    #[serde(default)]
    mac: Option<InterfaceMac>,
    #[serde(default)]
    target: Option<DeviceTarget>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct InterfaceMac {
    #[serde(default)]
    address: Option<String>,
}

/// Nova ownership fields, present only when every one of them is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipMetadata {
    pub instance_name: String,
    pub flavor: String,
    pub user_name: String,
    pub user_uuid: String,
    pub project_name: String,
    pub project_uuid: String,
}

impl DomainDescriptor {
    /// Parse a descriptor document.
    ///
    /// Disks and interfaces are often interleaved with other devices, so
    /// repeated elements are collected even when they are not adjacent.
    pub fn parse(xml: &str) -> Result<Self, DescriptorError> {
        let mut de = serde_xml_rs::Deserializer::new_from_reader(xml.as_bytes())
            .non_contiguous_seq_elements(true);
        Self::deserialize(&mut de).map_err(|err| DescriptorError(err.to_string()))
    }

    /// Nova ownership metadata, or `None` when any part of it is absent.
    pub fn ownership(&self) -> Option<OwnershipMetadata> {
        let instance = self.metadata.as_ref()?.instance.as_ref()?;
        let owner = instance.owner.as_ref()?;
        let user = owner.user.as_ref()?;
        let project = owner.project.as_ref()?;

        Some(OwnershipMetadata {
            instance_name: instance.name.clone()?,
            flavor: instance.flavor.as_ref()?.name.clone()?,
            user_name: user.name.clone()?,
            user_uuid: user.uuid.clone()?,
            project_name: project.name.clone()?,
            project_uuid: project.uuid.clone()?,
        })
    }

    /// Declared disks in document order.
    pub fn disks(&self) -> &[Disk] {
        self.devices.as_ref().map_or(&[], |devices| devices.disks.as_slice())
    }

    /// Declared network interfaces in document order.
    pub fn interfaces(&self) -> &[Interface] {
        self.devices.as_ref().map_or(&[], |devices| devices.interfaces.as_slice())
    }
}

impl Disk {
    pub fn disk_type(&self) -> &str {
        self.disk_type.as_deref().unwrap_or_default()
    }

    /// Guest-visible device name (`vda`, `sdb`), used as the stats key.
    pub fn target_dev(&self) -> Option<&str> {
        self.target.as_ref().and_then(|target| target.dev.as_deref())
    }

    pub fn target_bus(&self) -> &str {
        self.target.as_ref().and_then(|target| target.bus.as_deref()).unwrap_or_default()
    }

    pub fn source_file(&self) -> &str {
        self.source.as_ref().and_then(|source| source.file.as_deref()).unwrap_or_default()
    }

    pub fn driver_name(&self) -> &str {
        self.driver.as_ref().and_then(|driver| driver.name.as_deref()).unwrap_or_default()
    }

    pub fn driver_type(&self) -> &str {
        self.driver.as_ref().and_then(|driver| driver.driver_type.as_deref()).unwrap_or_default()
    }

    pub fn driver_discard(&self) -> &str {
        self.driver.as_ref().and_then(|driver| driver.discard.as_deref()).unwrap_or_default()
    }
}

impl Interface {
    /// Host-side device name (`vnet0`); absent while the domain is shut off.
    pub fn target_dev(&self) -> Option<&str> {
        self.target.as_ref().and_then(|target| target.dev.as_deref())
    }

    pub fn mac_address(&self) -> &str {
        self.mac.as_ref().and_then(|mac| mac.address.as_deref()).unwrap_or_default()
    }
}
