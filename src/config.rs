// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology configuration
//!
//! Every knob of the declaration lives here. [`TopologyConfig::default`]
//! describes the reference deployment: two 2-AZ networks sharing
//! `10.10.0.0/24`, one `t3.micro` on each side, and a gateway load balancer
//! health-checking 22/TCP while forwarding GENEVE on 6081.
//!
//! Configuration can be loaded from JSON (missing fields fall back to the
//! defaults) or overridden from `MIRROR_TOPOLOGY_*` environment variables.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::declaration::LONGEST_DERIVED_ID;
use crate::domain::identity::INSTANCE_PROFILE_SUFFIX;
use crate::domain::network::DEFAULT_ADDRESS_BLOCK;
use crate::domain::{Ipv4Cidr, LogicalId, MachineImage, Protocol, VolumeType, GENEVE_PORT};
use crate::errors::{TopologyError, TopologyResult};
use crate::graph::DeploymentContext;

/// Prefix of every recognized environment variable
pub const ENV_PREFIX: &str = "MIRROR_TOPOLOGY_";

/// Address and gateway layout of one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub cidr: Ipv4Cidr,
    pub az_count: u8,
    pub outbound_gateways: u8,
}

impl NetworkConfig {
    pub fn new(cidr: Ipv4Cidr, az_count: u8, outbound_gateways: u8) -> Self {
        Self {
            cidr,
            az_count,
            outbound_gateways,
        }
    }

    fn reference(outbound_gateways: u8) -> Self {
        Self::new(DEFAULT_ADDRESS_BLOCK, 2, outbound_gateways)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::reference(0)
    }
}

/// Compute node sizing shared by both nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeConfig {
    pub instance_class: String,
    pub image: MachineImage,
    pub device_name: String,
    pub volume_size_gib: u32,
    pub volume_type: VolumeType,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            instance_class: "t3.micro".to_string(),
            image: MachineImage::AmazonLinux2Latest,
            device_name: "/dev/xvda".to_string(),
            volume_size_gib: 8,
            volume_type: VolumeType::Gp3,
        }
    }
}

/// Identity role assumed by both compute nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    /// Label of the role; `None` declares nodes without a role, which fails the build
    pub instance_role: Option<String>,
    pub trust_principal: String,
    pub managed_policies: Vec<String>,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            instance_role: Some("SSM IAM Role".to_string()),
            trust_principal: "ec2.amazonaws.com".to_string(),
            managed_policies: vec!["AmazonSSMManagedInstanceCore".to_string()],
        }
    }
}

/// Gateway load balancer health-check and forwarding settings
///
/// A gateway load balancer only forwards GENEVE on 6081; any other
/// forwarding protocol or port is rejected by [`TopologyConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirroringConfig {
    pub health_check_port: u16,
    pub health_check_protocol: Protocol,
    pub forward_port: u16,
    pub forward_protocol: Protocol,
    pub acceptance_required: bool,
}

impl Default for MirroringConfig {
    fn default() -> Self {
        Self {
            health_check_port: 22,
            health_check_protocol: Protocol::Tcp,
            forward_port: GENEVE_PORT,
            forward_protocol: Protocol::Geneve,
            acceptance_required: false,
        }
    }
}

/// Complete declaration input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub region: String,
    pub account: Option<String>,
    /// Prepended to every logical id; empty for none
    pub name_prefix: String,
    pub description: String,
    pub consumer: NetworkConfig,
    pub monitoring: NetworkConfig,
    pub compute: ComputeConfig,
    pub role: RoleConfig,
    pub mirroring: MirroringConfig,
    /// Declare the consumer-side endpoint into the monitoring endpoint service
    pub interface_endpoint: bool,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            account: None,
            name_prefix: String::new(),
            description: "Traffic mirroring from a consumer network into a monitoring network \
                          through a gateway load balancer"
                .to_string(),
            consumer: NetworkConfig::reference(0),
            monitoring: NetworkConfig::reference(1),
            compute: ComputeConfig::default(),
            role: RoleConfig::default(),
            mirroring: MirroringConfig::default(),
            interface_endpoint: false,
        }
    }
}

impl TopologyConfig {
    /// Parse JSON; absent fields keep their defaults
    ///
    /// The document is laid over the serialized defaults, so a partial
    /// nested object such as `{"monitoring": {"az_count": 3}}` keeps the
    /// remaining fields of that network's default.
    pub fn from_json_str(json: &str) -> TopologyResult<Self> {
        let mut merged = serde_json::to_value(Self::default())?;
        overlay(&mut merged, serde_json::from_str(json)?);
        Ok(serde_json::from_value(merged)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> TopologyResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Defaults overridden by `MIRROR_TOPOLOGY_*` environment variables
    pub fn from_env() -> TopologyResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    ///
    /// Recognized suffixes: `REGION`, `ACCOUNT`, `NAME_PREFIX`,
    /// `INSTANCE_CLASS`, `VOLUME_SIZE_GIB`, `AZ_COUNT` (both networks),
    /// `HEALTH_CHECK_PORT`, `FORWARD_PORT`, `INTERFACE_ENDPOINT`.
    pub fn from_lookup<F>(lookup: F) -> TopologyResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));
        let mut config = Self::default();

        if let Some(region) = var("REGION") {
            config.region = region;
        }
        if let Some(account) = var("ACCOUNT") {
            config.account = Some(account).filter(|a| !a.is_empty());
        }
        if let Some(prefix) = var("NAME_PREFIX") {
            config.name_prefix = prefix;
        }
        if let Some(class) = var("INSTANCE_CLASS") {
            config.compute.instance_class = class;
        }
        if let Some(size) = var("VOLUME_SIZE_GIB") {
            config.compute.volume_size_gib = parse_var("VOLUME_SIZE_GIB", &size)?;
        }
        if let Some(count) = var("AZ_COUNT") {
            let count = parse_var("AZ_COUNT", &count)?;
            config.consumer.az_count = count;
            config.monitoring.az_count = count;
        }
        if let Some(port) = var("HEALTH_CHECK_PORT") {
            config.mirroring.health_check_port = parse_var("HEALTH_CHECK_PORT", &port)?;
        }
        if let Some(port) = var("FORWARD_PORT") {
            config.mirroring.forward_port = parse_var("FORWARD_PORT", &port)?;
        }
        if let Some(flag) = var("INTERFACE_ENDPOINT") {
            config.interface_endpoint = parse_flag("INTERFACE_ENDPOINT", &flag)?;
        }

        Ok(config)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn with_instance_class(mut self, class: impl Into<String>) -> Self {
        self.compute.instance_class = class.into();
        self
    }

    pub fn with_volume_size(mut self, size_gib: u32) -> Self {
        self.compute.volume_size_gib = size_gib;
        self
    }

    /// Set the AZ spread of both networks
    pub fn with_az_count(mut self, az_count: u8) -> Self {
        self.consumer.az_count = az_count;
        self.monitoring.az_count = az_count;
        self
    }

    pub fn with_ports(mut self, health_check_port: u16, forward_port: u16) -> Self {
        self.mirroring.health_check_port = health_check_port;
        self.mirroring.forward_port = forward_port;
        self
    }

    pub fn with_instance_role(mut self, role: Option<String>) -> Self {
        self.role.instance_role = role;
        self
    }

    pub fn with_interface_endpoint(mut self, enabled: bool) -> Self {
        self.interface_endpoint = enabled;
        self
    }

    /// Deployment context handed to the resource graph
    pub fn context(&self) -> DeploymentContext {
        let context = DeploymentContext::new(self.region.clone());
        match &self.account {
            Some(account) => context.with_account(account.clone()),
            None => context,
        }
    }

    /// Check the inputs that no entity constructor can check on its own
    pub fn validate(&self) -> TopologyResult<()> {
        if self.region.trim().is_empty() {
            return Err(config_error("region is required"));
        }

        if !self.name_prefix.is_empty() {
            LogicalId::new(self.name_prefix.as_str()).map_err(|e| {
                config_error(format!("name prefix {:?} is not id-safe: {}", self.name_prefix, e))
            })?;
        }

        let longest_prefix = LogicalId::MAX_LENGTH - LONGEST_DERIVED_ID;
        if self.name_prefix.len() > longest_prefix {
            return Err(config_error(format!(
                "name prefix is {} characters, derived ids allow at most {}",
                self.name_prefix.len(),
                longest_prefix
            )));
        }

        if let Some(label) = &self.role.instance_role {
            LogicalId::from_label(&format!("{} {}", self.name_prefix, label))
                .and_then(|role| role.child(INSTANCE_PROFILE_SUFFIX))
                .map_err(|e| config_error(format!("instance role {:?}: {}", label, e)))?;
        }

        if self.compute.instance_class.trim().is_empty() {
            return Err(config_error("instance sizing class is required"));
        }

        if self.compute.volume_size_gib == 0 {
            return Err(config_error("volume size must be at least 1 GiB"));
        }

        for (name, network) in [("consumer", &self.consumer), ("monitoring", &self.monitoring)] {
            if network.az_count == 0 {
                return Err(config_error(format!("{} network needs at least one AZ", name)));
            }
        }

        let mirroring = &self.mirroring;
        if mirroring.health_check_port == 0 || mirroring.forward_port == 0 {
            return Err(config_error("health-check and forwarding ports must be non-zero"));
        }

        if mirroring.health_check_port == mirroring.forward_port {
            return Err(config_error(format!(
                "health-check port {} equals the forwarding port",
                mirroring.forward_port
            )));
        }

        if mirroring.forward_protocol != Protocol::Geneve || mirroring.forward_port != GENEVE_PORT {
            return Err(config_error(format!(
                "gateway load balancer forwards GENEVE/{}, not {}/{}",
                GENEVE_PORT, mirroring.forward_protocol, mirroring.forward_port
            )));
        }

        Ok(())
    }
}

/// Merge `patch` into `base`: objects key by key, everything else replaced
fn overlay(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

fn config_error(message: impl Into<String>) -> TopologyError {
    TopologyError::Configuration(message.into())
}

fn parse_var<T>(suffix: &str, value: &str) -> TopologyResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| config_error(format!("{}{}={:?}: {}", ENV_PREFIX, suffix, value, e)))
}

fn parse_flag(suffix: &str, value: &str) -> TopologyResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(config_error(format!(
            "{}{}={:?}: expected true or false",
            ENV_PREFIX, suffix, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (format!("{}{}", ENV_PREFIX, k), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_default_is_reference_deployment() {
        let config = TopologyConfig::default();

        assert_eq!(config.consumer.cidr.to_string(), "10.10.0.0/24");
        assert_eq!(config.monitoring.cidr, config.consumer.cidr);
        assert_eq!(config.consumer.outbound_gateways, 0);
        assert_eq!(config.monitoring.outbound_gateways, 1);
        assert_eq!(config.compute.instance_class, "t3.micro");
        assert_eq!(config.mirroring.health_check_port, 22);
        assert_eq!(config.mirroring.forward_port, 6081);
        assert!(!config.mirroring.acceptance_required);
        assert!(!config.interface_endpoint);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_inputs() {
        let cases = [
            TopologyConfig::default().with_region(""),
            TopologyConfig::default().with_instance_class(" "),
            TopologyConfig::default().with_volume_size(0),
            TopologyConfig::default().with_az_count(0),
            TopologyConfig::default().with_ports(6081, 6081),
            TopologyConfig::default().with_name_prefix("not ok"),
            TopologyConfig::default().with_name_prefix("A".repeat(208)),
            TopologyConfig::default().with_ports(0, GENEVE_PORT),
            TopologyConfig::default().with_ports(22, 0),
            TopologyConfig::default().with_ports(22, 6082),
            TopologyConfig::default().with_instance_role(Some("!!".to_string())),
        ];

        for config in cases {
            assert!(matches!(
                config.validate(),
                Err(TopologyError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_json_partial_override() {
        let config = TopologyConfig::from_json_str(
            r#"{ "region": "eu-west-1", "mirroring": { "acceptance_required": true } }"#,
        )
        .unwrap();

        assert_eq!(config.region, "eu-west-1");
        assert!(config.mirroring.acceptance_required);
        assert_eq!(config.mirroring.forward_port, 6081);
        assert_eq!(config.compute, ComputeConfig::default());
    }

    #[test]
    fn test_forward_protocol_must_be_geneve() {
        let mut config = TopologyConfig::default();
        config.mirroring.forward_protocol = Protocol::Udp;

        assert!(matches!(config.validate(), Err(TopologyError::Configuration(_))));
    }

    #[test]
    fn test_longest_accepted_prefix() {
        let prefix = "A".repeat(LogicalId::MAX_LENGTH - LONGEST_DERIVED_ID);
        assert!(TopologyConfig::default().with_name_prefix(prefix).validate().is_ok());
    }

    #[test]
    fn test_json_partial_network() {
        let config = TopologyConfig::from_json_str(
            r#"{ "consumer": { "az_count": 3 }, "monitoring": { "az_count": 3 } }"#,
        )
        .unwrap();

        assert_eq!(config.consumer.az_count, 3);
        assert_eq!(config.consumer.cidr, DEFAULT_ADDRESS_BLOCK);
        assert_eq!(config.consumer.outbound_gateways, 0);
        assert_eq!(config.monitoring.outbound_gateways, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_rejects_bad_cidr() {
        let result = TopologyConfig::from_json_str(
            r#"{ "consumer": { "cidr": "10.10.0.7/24", "az_count": 2, "outbound_gateways": 0 } }"#,
        );
        assert!(matches!(result, Err(TopologyError::Serialization(_))));
    }

    #[test]
    fn test_lookup_overrides() {
        let config = TopologyConfig::from_lookup(lookup(&[
            ("REGION", "ap-southeast-2"),
            ("ACCOUNT", "123456789012"),
            ("AZ_COUNT", "3"),
            ("VOLUME_SIZE_GIB", "16"),
            ("INTERFACE_ENDPOINT", "yes"),
        ]))
        .unwrap();

        assert_eq!(config.region, "ap-southeast-2");
        assert_eq!(config.account.as_deref(), Some("123456789012"));
        assert_eq!(config.consumer.az_count, 3);
        assert_eq!(config.monitoring.az_count, 3);
        assert_eq!(config.compute.volume_size_gib, 16);
        assert!(config.interface_endpoint);
        assert_eq!(config.context().account.as_deref(), Some("123456789012"));
    }

    #[test]
    fn test_lookup_rejects_unparsable_values() {
        assert!(matches!(
            TopologyConfig::from_lookup(lookup(&[("FORWARD_PORT", "geneve")])),
            Err(TopologyError::Configuration(_))
        ));
        assert!(matches!(
            TopologyConfig::from_lookup(lookup(&[("INTERFACE_ENDPOINT", "maybe")])),
            Err(TopologyError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("MIRROR_TOPOLOGY_INSTANCE_CLASS", Some("c5.large")),
                ("MIRROR_TOPOLOGY_HEALTH_CHECK_PORT", Some("80")),
                ("MIRROR_TOPOLOGY_REGION", None),
            ],
            || {
                let config = TopologyConfig::from_env().unwrap();
                assert_eq!(config.compute.instance_class, "c5.large");
                assert_eq!(config.mirroring.health_check_port, 80);
                assert_eq!(config.region, "us-east-1");
            },
        );
    }
}
