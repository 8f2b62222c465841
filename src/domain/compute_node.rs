// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute Node Entity with Compositional Invariants
//!
//! A compute node composes with the rest of the topology only by reference:
//! - owning network (and a subnet selector into its partitions)
//! - identity role (mandatory)
//! - security policy (optional)

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::{LogicalId, ResourceRef, SubnetSelector};

/// Compute node validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComputeNodeError {
    #[error("Compute node {0} has no identity role")]
    MissingIdentityRole(String),

    #[error("Compute node {0} has no subnet selector")]
    MissingSubnet(String),

    #[error("Invalid instance class: {0:?} (expected family.size, e.g. t3.micro)")]
    InvalidInstanceClass(String),

    #[error("Invalid volume on {device}: {reason}")]
    InvalidVolume { device: String, reason: String },

    #[error("Duplicate block device: {0}")]
    DuplicateDevice(String),
}

/// Machine image selector
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "selector", content = "value")]
pub enum MachineImage {
    /// Latest Amazon Linux 2 image, resolved at provisioning time
    AmazonLinux2Latest,
    /// Latest Amazon Linux 2023 image, resolved at provisioning time
    AmazonLinux2023Latest,
    /// Fixed image id
    Explicit(String),
}

impl MachineImage {
    /// Image id as the provisioning engine should resolve it
    pub fn image_id(&self) -> String {
        match self {
            Self::AmazonLinux2Latest => {
                "{{resolve:ssm:/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2}}"
                    .to_string()
            }
            Self::AmazonLinux2023Latest => {
                "{{resolve:ssm:/aws/service/ami-amazon-linux-latest/al2023-ami-kernel-default-x86_64}}"
                    .to_string()
            }
            Self::Explicit(id) => id.clone(),
        }
    }
}

impl Default for MachineImage {
    fn default() -> Self {
        Self::AmazonLinux2Latest
    }
}

/// Instance sizing class value object ("t3.micro")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceClass(String);

impl InstanceClass {
    pub fn new(class: impl Into<String>) -> Result<Self, ComputeNodeError> {
        let class = class.into();

        let valid = match class.split_once('.') {
            Some((family, size)) => {
                !family.is_empty()
                    && !size.is_empty()
                    && family.starts_with(|c: char| c.is_ascii_lowercase())
                    && family
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
                    && size.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            }
            None => false,
        };

        if !valid {
            return Err(ComputeNodeError::InvalidInstanceClass(class));
        }

        Ok(Self(class))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Instance family ("t3")
    pub fn family(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for InstanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for InstanceClass {
    type Error = ComputeNodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InstanceClass> for String {
    fn from(class: InstanceClass) -> Self {
        class.0
    }
}

/// Block storage volume type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeType {
    Standard,
    Gp2,
    Gp3,
    Io1,
    Io2,
    St1,
    Sc1,
}

impl VolumeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Gp2 => "gp2",
            Self::Gp3 => "gp3",
            Self::Io1 => "io1",
            Self::Io2 => "io2",
            Self::St1 => "st1",
            Self::Sc1 => "sc1",
        }
    }

    /// Size range in GiB accepted for this volume type
    pub fn size_range(&self) -> (u32, u32) {
        match self {
            Self::Standard => (1, 1024),
            Self::Gp2 | Self::Gp3 => (1, 16384),
            Self::Io1 | Self::Io2 => (4, 16384),
            Self::St1 | Self::Sc1 => (125, 16384),
        }
    }
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attached storage volume
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockDevice {
    pub device_name: String,
    pub size_gib: u32,
    pub volume_type: VolumeType,
}

impl BlockDevice {
    pub fn new(
        device_name: impl Into<String>,
        size_gib: u32,
        volume_type: VolumeType,
    ) -> Result<Self, ComputeNodeError> {
        let device_name = device_name.into();

        if !device_name.starts_with("/dev/") || device_name.len() <= "/dev/".len() {
            return Err(ComputeNodeError::InvalidVolume {
                device: device_name,
                reason: "device name must be a /dev/ path".to_string(),
            });
        }

        let (min, max) = volume_type.size_range();
        if size_gib < min || size_gib > max {
            return Err(ComputeNodeError::InvalidVolume {
                device: device_name,
                reason: format!(
                    "{} GiB outside {}..={} GiB for {}",
                    size_gib, min, max, volume_type
                ),
            });
        }

        Ok(Self {
            device_name,
            size_gib,
            volume_type,
        })
    }
}

/// Compute Node Entity
///
/// # Invariants
/// - Must have an identity role
/// - Must select a subnet of its owning network
/// - Block device names are unique
///
/// Whether the selector actually matches a partition of the network, and
/// whether the security policy lives in the same network, are graph-level
/// invariants checked when the whole topology is assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeNode {
    pub id: LogicalId,
    pub image: MachineImage,
    pub instance_class: InstanceClass,
    pub network: ResourceRef,
    pub subnet: SubnetSelector,
    pub block_devices: Vec<BlockDevice>,
    pub role: ResourceRef,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub security_policy: Option<ResourceRef>,
    /// When false the node may process traffic not addressed to itself
    pub source_dest_check: bool,
    pub propagate_tags_to_volumes: bool,
}

impl ComputeNode {
    /// Builder pattern for fluent construction
    pub fn builder(
        id: LogicalId,
        instance_class: InstanceClass,
        network: ResourceRef,
    ) -> ComputeNodeBuilder {
        ComputeNodeBuilder::new(id, instance_class, network)
    }

    /// Check if the node can act as an inline inspection appliance
    pub fn is_inspection_capable(&self) -> bool {
        !self.source_dest_check
    }

    /// References to sibling entities
    pub fn references(&self) -> Vec<ResourceRef> {
        let mut refs = vec![self.network.clone(), self.role.clone()];
        refs.extend(self.security_policy.iter().cloned());
        refs
    }
}

/// Builder for ComputeNode with fluent API
pub struct ComputeNodeBuilder {
    id: LogicalId,
    image: MachineImage,
    instance_class: InstanceClass,
    network: ResourceRef,
    subnet: Option<SubnetSelector>,
    block_devices: Vec<BlockDevice>,
    role: Option<ResourceRef>,
    security_policy: Option<ResourceRef>,
    source_dest_check: bool,
    propagate_tags_to_volumes: bool,
}

impl ComputeNodeBuilder {
    fn new(id: LogicalId, instance_class: InstanceClass, network: ResourceRef) -> Self {
        Self {
            id,
            image: MachineImage::default(),
            instance_class,
            network,
            subnet: None,
            block_devices: Vec::new(),
            role: None,
            security_policy: None,
            source_dest_check: true,
            propagate_tags_to_volumes: false,
        }
    }

    pub fn image(mut self, image: MachineImage) -> Self {
        self.image = image;
        self
    }

    pub fn subnet(mut self, selector: SubnetSelector) -> Self {
        self.subnet = Some(selector);
        self
    }

    pub fn block_device(mut self, device: BlockDevice) -> Self {
        self.block_devices.push(device);
        self
    }

    pub fn role(mut self, role: ResourceRef) -> Self {
        self.role = Some(role);
        self
    }

    pub fn security_policy(mut self, policy: ResourceRef) -> Self {
        self.security_policy = Some(policy);
        self
    }

    pub fn source_dest_check(mut self, enabled: bool) -> Self {
        self.source_dest_check = enabled;
        self
    }

    pub fn propagate_tags_to_volumes(mut self, enabled: bool) -> Self {
        self.propagate_tags_to_volumes = enabled;
        self
    }

    pub fn build(self) -> Result<ComputeNode, ComputeNodeError> {
        let role = self
            .role
            .ok_or_else(|| ComputeNodeError::MissingIdentityRole(self.id.to_string()))?;

        let subnet = self
            .subnet
            .ok_or_else(|| ComputeNodeError::MissingSubnet(self.id.to_string()))?;

        for (i, device) in self.block_devices.iter().enumerate() {
            if self.block_devices[..i]
                .iter()
                .any(|d| d.device_name == device.device_name)
            {
                return Err(ComputeNodeError::DuplicateDevice(device.device_name.clone()));
            }
        }

        Ok(ComputeNode {
            id: self.id,
            image: self.image,
            instance_class: self.instance_class,
            network: self.network,
            subnet,
            block_devices: self.block_devices,
            role,
            security_policy: self.security_policy,
            source_dest_check: self.source_dest_check,
            propagate_tags_to_volumes: self.propagate_tags_to_volumes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoutingClass;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    fn builder() -> ComputeNodeBuilder {
        ComputeNode::builder(
            id("MonitoringInstance"),
            InstanceClass::new("t3.micro").unwrap(),
            ResourceRef::network(id("MonitoringVpc")),
        )
    }

    #[test]
    fn test_builder_pattern() {
        let node = builder()
            .subnet(SubnetSelector::routing(RoutingClass::PrivateRouted))
            .block_device(BlockDevice::new("/dev/xvda", 8, VolumeType::Gp3).unwrap())
            .role(ResourceRef::identity_role(id("SsmIamRole")))
            .security_policy(ResourceRef::security_policy(id("MonitoringSg")))
            .source_dest_check(false)
            .propagate_tags_to_volumes(true)
            .build()
            .unwrap();

        assert!(node.is_inspection_capable());
        assert_eq!(node.image, MachineImage::AmazonLinux2Latest);
        assert_eq!(node.block_devices[0].size_gib, 8);
        assert_eq!(node.references().len(), 3);
    }

    #[test]
    fn test_missing_role_is_rejected() {
        let result = builder()
            .subnet(SubnetSelector::routing(RoutingClass::Public))
            .build();

        assert_eq!(
            result,
            Err(ComputeNodeError::MissingIdentityRole("MonitoringInstance".to_string()))
        );
    }

    #[test]
    fn test_missing_subnet_is_rejected() {
        let result = builder()
            .role(ResourceRef::identity_role(id("SsmIamRole")))
            .build();

        assert!(matches!(result, Err(ComputeNodeError::MissingSubnet(_))));
    }

    #[test]
    fn test_duplicate_devices_are_rejected() {
        let device = BlockDevice::new("/dev/xvda", 8, VolumeType::Gp3).unwrap();
        let result = builder()
            .subnet(SubnetSelector::routing(RoutingClass::Public))
            .role(ResourceRef::identity_role(id("SsmIamRole")))
            .block_device(device.clone())
            .block_device(device)
            .build();

        assert!(matches!(result, Err(ComputeNodeError::DuplicateDevice(_))));
    }

    #[test]
    fn test_instance_class_validation() {
        assert!(InstanceClass::new("t3.micro").is_ok());
        assert!(InstanceClass::new("c6gn.16xlarge").is_ok());
        assert_eq!(InstanceClass::new("m5.large").unwrap().family(), "m5");

        assert!(InstanceClass::new("").is_err());
        assert!(InstanceClass::new("t3").is_err());
        assert!(InstanceClass::new("T3.micro").is_err());
        assert!(InstanceClass::new("t3.").is_err());
    }

    #[test]
    fn test_volume_validation() {
        assert!(BlockDevice::new("/dev/xvda", 8, VolumeType::Gp3).is_ok());
        assert!(BlockDevice::new("/dev/xvda", 0, VolumeType::Gp3).is_err());
        assert!(BlockDevice::new("/dev/xvdb", 100, VolumeType::St1).is_err());
        assert!(BlockDevice::new("xvda", 8, VolumeType::Gp3).is_err());
    }

    #[test]
    fn test_machine_image_resolution() {
        assert!(MachineImage::AmazonLinux2Latest.image_id().contains("amzn2-ami-hvm"));
        assert_eq!(
            MachineImage::Explicit("ami-0123456789abcdef0".into()).image_id(),
            "ami-0123456789abcdef0"
        );
    }
}
