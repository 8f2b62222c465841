// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Partitioning Invariants
//!
//! A [`Network`] owns an IPv4 address block and carves it into subnets: one
//! subnet per partition entry per availability zone, allocated sequentially
//! and aligned to the partition's mask size.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

use super::{LogicalId, LogicalIdError};

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4)")]
    InvalidPrefixLength(u8),

    #[error("Address block has host bits set: {0}")]
    NotNetworkAligned(String),

    #[error("Invalid AZ count: {0} (must be 1-{max})", max = Network::MAX_AZ_COUNT)]
    InvalidAzCount(u8),

    #[error("Network {0} declares no subnet partitions")]
    NoPartitions(String),

    #[error("Invalid partition role: {0}")]
    InvalidRole(String),

    #[error("Invalid subnet id: {0}")]
    InvalidSubnetId(#[from] LogicalIdError),

    #[error("Duplicate partition role: {0}")]
    DuplicatePartition(String),

    #[error("Partition {role} mask /{mask} does not fit network prefix /{network_prefix}")]
    InvalidSubnetMask {
        role: String,
        mask: u8,
        network_prefix: u8,
    },

    #[error("Address block of {network} exhausted while allocating partition {role}")]
    AddressSpaceExhausted { network: String, role: String },

    #[error("{gateways} outbound gateways requested but only {az_count} AZs available")]
    TooManyGateways { gateways: u8, az_count: u8 },

    #[error("Network {0} has outbound gateways but no public partition to place them in")]
    GatewayWithoutPublicSubnet(String),

    #[error("Network {0} has private-routed partitions but no outbound gateway")]
    PrivateRoutedWithoutGateway(String),
}

/// Address block shared by both networks of the reference deployment
pub const DEFAULT_ADDRESS_BLOCK: Ipv4Cidr = Ipv4Cidr {
    address: Ipv4Addr::new(10, 10, 0, 0),
    prefix_len: 24,
};

/// IPv4 address block in CIDR notation
///
/// Invariants:
/// - Prefix length 0-32
/// - No host bits set (`10.10.0.0/24`, never `10.10.0.5/24`)
///
/// Serialized as its CIDR string.
///
/// # Examples
///
/// ```rust
/// use cim_mirror_topology::domain::Ipv4Cidr;
///
/// let block: Ipv4Cidr = "10.10.0.0/24".parse().unwrap();
/// assert_eq!(block.prefix_len(), 24);
/// assert_eq!(block.size(), 256);
/// assert!(block.contains(&"10.10.0.16/28".parse().unwrap()));
/// assert!("10.10.0.5/24".parse::<Ipv4Cidr>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    address: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Cidr {
    /// Every IPv4 address (`0.0.0.0/0`)
    pub const ANY: Ipv4Cidr = Ipv4Cidr {
        address: Ipv4Addr::UNSPECIFIED,
        prefix_len: 0,
    };

    /// Create from separate address and prefix
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> Result<Self, NetworkError> {
        if prefix_len > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_len));
        }

        let cidr = Self {
            address,
            prefix_len,
        };

        // Invariant: canonical network address
        if u32::from(address) & !cidr.netmask() != 0 {
            return Err(NetworkError::NotNetworkAligned(cidr.to_string()));
        }

        Ok(cidr)
    }

    /// Network address
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Number of addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_len))
    }

    /// Check if another block lies entirely within this one
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix_len >= self.prefix_len
            && u32::from(other.address) & self.netmask() == u32::from(self.address)
    }

    /// Check if two blocks share any address
    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.contains(other) || other.contains(self)
    }

    fn netmask(&self) -> u32 {
        u32::MAX
            .checked_shl(32 - u32::from(self.prefix_len))
            .unwrap_or(0)
    }

    fn start(&self) -> u64 {
        u64::from(u32::from(self.address))
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, prefix_str) = s
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(s.to_string()))?;

        let address = addr_str
            .parse::<Ipv4Addr>()
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_len = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(s.to_string()))?;

        Self::new(address, prefix_len)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ipv4Cidr> for String {
    fn from(cidr: Ipv4Cidr) -> Self {
        cidr.to_string()
    }
}

/// Routing class of a subnet partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingClass {
    /// Default route through the network's internet gateway
    Public,
    /// Default route through an outbound (NAT) gateway
    PrivateRouted,
    /// No default route at all
    Isolated,
}

impl RoutingClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::PrivateRouted => "private_routed",
            Self::Isolated => "isolated",
        }
    }
}

impl fmt::Display for RoutingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a network's subnet partition list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubnetPartition {
    /// Role tag ("Public", "Isolated"), also used in subnet logical ids
    pub role: String,
    /// Address-mask size of each subnet in this partition
    pub mask: u8,
    /// Routing class
    pub routing: RoutingClass,
}

impl SubnetPartition {
    pub fn new(role: impl Into<String>, mask: u8, routing: RoutingClass) -> Self {
        Self {
            role: role.into(),
            mask,
            routing,
        }
    }
}

/// Selects subnets of a network by routing class, optionally pinned to one AZ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubnetSelector {
    pub routing: RoutingClass,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub zone: Option<u8>,
}

impl SubnetSelector {
    /// Select every subnet of a routing class
    pub fn routing(routing: RoutingClass) -> Self {
        Self {
            routing,
            zone: None,
        }
    }

    /// Narrow the selection to one availability zone (zero-based)
    pub fn in_zone(mut self, zone: u8) -> Self {
        self.zone = Some(zone);
        self
    }

    fn matches(&self, subnet: &Subnet) -> bool {
        subnet.routing == self.routing && self.zone.map_or(true, |zone| zone == subnet.zone)
    }
}

impl fmt::Display for SubnetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.zone {
            Some(zone) => write!(f, "{} (zone {})", self.routing, zone),
            None => write!(f, "{}", self.routing),
        }
    }
}

/// Concrete subnet allocated from a network's address block
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subnet {
    pub id: LogicalId,
    pub role: String,
    pub routing: RoutingClass,
    pub cidr: Ipv4Cidr,
    /// Zero-based availability zone index
    pub zone: u8,
}

/// Network specification
///
/// # Invariants
/// - 1 to [`Network::MAX_AZ_COUNT`] availability zones
/// - At least one partition, roles unique and id-safe
/// - Every partition mask fits the address block, and all subnets fit it together
/// - Outbound gateways ≤ AZ count, and only with a public partition to live in
/// - Private-routed partitions require at least one outbound gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: LogicalId,
    pub cidr: Ipv4Cidr,
    pub az_count: u8,
    pub outbound_gateways: u8,
    pub enable_dns_support: bool,
    pub enable_dns_hostnames: bool,
    pub partitions: Vec<SubnetPartition>,
    pub subnets: Vec<Subnet>,
}

impl Network {
    /// Upper bound on AZ spread
    pub const MAX_AZ_COUNT: u8 = 6;

    /// Create a network and allocate its subnets
    pub fn new(
        id: LogicalId,
        cidr: Ipv4Cidr,
        az_count: u8,
        outbound_gateways: u8,
        partitions: Vec<SubnetPartition>,
    ) -> Result<Self, NetworkError> {
        if az_count == 0 || az_count > Self::MAX_AZ_COUNT {
            return Err(NetworkError::InvalidAzCount(az_count));
        }

        if partitions.is_empty() {
            return Err(NetworkError::NoPartitions(id.to_string()));
        }

        if outbound_gateways > az_count {
            return Err(NetworkError::TooManyGateways {
                gateways: outbound_gateways,
                az_count,
            });
        }

        let has_routing = |class: RoutingClass| partitions.iter().any(|p| p.routing == class);

        if outbound_gateways > 0 && !has_routing(RoutingClass::Public) {
            return Err(NetworkError::GatewayWithoutPublicSubnet(id.to_string()));
        }

        if outbound_gateways == 0 && has_routing(RoutingClass::PrivateRouted) {
            return Err(NetworkError::PrivateRoutedWithoutGateway(id.to_string()));
        }

        let subnets = allocate_subnets(&id, cidr, az_count, &partitions)?;

        Ok(Self {
            id,
            cidr,
            az_count,
            outbound_gateways,
            enable_dns_support: true,
            enable_dns_hostnames: true,
            partitions,
            subnets,
        })
    }

    /// Set DNS resolution flags
    pub fn with_dns(mut self, support: bool, hostnames: bool) -> Self {
        self.enable_dns_support = support;
        self.enable_dns_hostnames = hostnames;
        self
    }

    /// Subnets matched by a selector, in allocation order
    pub fn select(&self, selector: &SubnetSelector) -> Vec<&Subnet> {
        self.subnets.iter().filter(|s| selector.matches(s)).collect()
    }

    /// Check if the selector's routing class is one of this network's partitions
    pub fn has_partition(&self, selector: &SubnetSelector) -> bool {
        self.partitions.iter().any(|p| p.routing == selector.routing)
    }

    /// Check if the network carries at least one outbound gateway
    pub fn is_gateway_bearing(&self) -> bool {
        self.outbound_gateways > 0
    }

    /// Check if the network needs an internet gateway
    pub fn has_public_partition(&self) -> bool {
        self.partitions
            .iter()
            .any(|p| p.routing == RoutingClass::Public)
    }
}

/// Carve subnets partition by partition, zone by zone, each aligned to its mask
fn allocate_subnets(
    network: &LogicalId,
    cidr: Ipv4Cidr,
    az_count: u8,
    partitions: &[SubnetPartition],
) -> Result<Vec<Subnet>, NetworkError> {
    let end = cidr.start() + cidr.size();
    let mut cursor = cidr.start();
    let mut subnets = Vec::with_capacity(partitions.len() * usize::from(az_count));
    let mut seen_roles: Vec<&str> = Vec::new();

    for partition in partitions {
        if LogicalId::new(partition.role.as_str()).is_err() {
            return Err(NetworkError::InvalidRole(partition.role.clone()));
        }

        if seen_roles.contains(&partition.role.as_str()) {
            return Err(NetworkError::DuplicatePartition(partition.role.clone()));
        }
        seen_roles.push(&partition.role);

        if partition.mask < cidr.prefix_len() || partition.mask > 32 {
            return Err(NetworkError::InvalidSubnetMask {
                role: partition.role.clone(),
                mask: partition.mask,
                network_prefix: cidr.prefix_len(),
            });
        }

        let block = 1u64 << (32 - u32::from(partition.mask));

        for zone in 0..az_count {
            let aligned = cursor.div_ceil(block) * block;
            if aligned + block > end {
                return Err(NetworkError::AddressSpaceExhausted {
                    network: network.to_string(),
                    role: partition.role.clone(),
                });
            }

            let address = u32::try_from(aligned)
                .map(Ipv4Addr::from)
                .map_err(|_| NetworkError::AddressSpaceExhausted {
                    network: network.to_string(),
                    role: partition.role.clone(),
                })?;

            let id = network.child(&format!("{}Subnet{}", partition.role, zone + 1))?;

            subnets.push(Subnet {
                id,
                role: partition.role.clone(),
                routing: partition.routing,
                cidr: Ipv4Cidr::new(address, partition.mask)?,
                zone,
            });

            cursor = aligned + block;
        }
    }

    Ok(subnets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    fn block() -> Ipv4Cidr {
        "10.10.0.0/24".parse().unwrap()
    }

    fn consumer_partitions() -> Vec<SubnetPartition> {
        vec![
            SubnetPartition::new("Public", 28, RoutingClass::Public),
            SubnetPartition::new("Isolated", 28, RoutingClass::Isolated),
        ]
    }

    #[test]
    fn test_cidr_parsing() {
        let cidr: Ipv4Cidr = "10.10.0.0/24".parse().unwrap();
        assert_eq!(cidr.address(), Ipv4Addr::new(10, 10, 0, 0));
        assert_eq!(cidr.prefix_len(), 24);
        assert_eq!(cidr.to_string(), "10.10.0.0/24");

        assert!(matches!(
            "10.10.0.0".parse::<Ipv4Cidr>(),
            Err(NetworkError::InvalidCidr(_))
        ));
        assert!(matches!(
            "10.10.0.300/24".parse::<Ipv4Cidr>(),
            Err(NetworkError::InvalidIpAddress(_))
        ));
        assert_eq!(
            "10.10.0.0/33".parse::<Ipv4Cidr>(),
            Err(NetworkError::InvalidPrefixLength(33))
        );
        assert!(matches!(
            "10.10.0.1/24".parse::<Ipv4Cidr>(),
            Err(NetworkError::NotNetworkAligned(_))
        ));
    }

    #[test]
    fn test_default_block_is_canonical() {
        assert_eq!(DEFAULT_ADDRESS_BLOCK, block());
    }

    #[test]
    fn test_cidr_containment() {
        let outer = block();
        let inner: Ipv4Cidr = "10.10.0.48/28".parse().unwrap();
        let elsewhere: Ipv4Cidr = "10.11.0.0/28".parse().unwrap();

        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(inner.overlaps(&outer));
        assert!(!outer.overlaps(&elsewhere));

        let everything: Ipv4Cidr = "0.0.0.0/0".parse().unwrap();
        assert_eq!(everything.size(), 1u64 << 32);
        assert!(everything.contains(&outer));
    }

    #[test]
    fn test_cidr_serde_as_string() {
        let cidr = block();
        assert_eq!(serde_json::to_string(&cidr).unwrap(), "\"10.10.0.0/24\"");
        let parsed: Ipv4Cidr = serde_json::from_str("\"10.10.0.0/24\"").unwrap();
        assert_eq!(parsed, cidr);
        assert!(serde_json::from_str::<Ipv4Cidr>("\"10.10.0.9/24\"").is_err());
    }

    #[test]
    fn test_subnet_allocation_order() {
        let network = Network::new(id("ConsumerVpc"), block(), 2, 0, consumer_partitions()).unwrap();

        let allocated: Vec<(String, String)> = network
            .subnets
            .iter()
            .map(|s| (s.id.to_string(), s.cidr.to_string()))
            .collect();

        assert_eq!(
            allocated,
            vec![
                ("ConsumerVpcPublicSubnet1".to_string(), "10.10.0.0/28".to_string()),
                ("ConsumerVpcPublicSubnet2".to_string(), "10.10.0.16/28".to_string()),
                ("ConsumerVpcIsolatedSubnet1".to_string(), "10.10.0.32/28".to_string()),
                ("ConsumerVpcIsolatedSubnet2".to_string(), "10.10.0.48/28".to_string()),
            ]
        );
        assert!(network.subnets.iter().all(|s| network.cidr.contains(&s.cidr)));
    }

    #[test]
    fn test_allocation_aligns_mixed_masks() {
        let partitions = vec![
            SubnetPartition::new("Small", 28, RoutingClass::Isolated),
            SubnetPartition::new("Large", 26, RoutingClass::Isolated),
        ];
        let network = Network::new(id("Mixed"), block(), 1, 0, partitions).unwrap();

        assert_eq!(network.subnets[0].cidr.to_string(), "10.10.0.0/28");
        assert_eq!(network.subnets[1].cidr.to_string(), "10.10.0.64/26");
    }

    #[test]
    fn test_address_space_exhausted() {
        let partitions = vec![SubnetPartition::new("Wide", 25, RoutingClass::Isolated)];
        let result = Network::new(id("Tight"), block(), 3, 0, partitions);

        assert_eq!(
            result,
            Err(NetworkError::AddressSpaceExhausted {
                network: "Tight".to_string(),
                role: "Wide".to_string(),
            })
        );
    }

    #[test]
    fn test_partition_validation() {
        assert!(matches!(
            Network::new(id("Net"), block(), 0, 0, consumer_partitions()),
            Err(NetworkError::InvalidAzCount(0))
        ));
        assert!(matches!(
            Network::new(id("Net"), block(), 2, 0, vec![]),
            Err(NetworkError::NoPartitions(_))
        ));

        let duplicated = vec![
            SubnetPartition::new("Public", 28, RoutingClass::Public),
            SubnetPartition::new("Public", 28, RoutingClass::Isolated),
        ];
        assert!(matches!(
            Network::new(id("Net"), block(), 2, 0, duplicated),
            Err(NetworkError::DuplicatePartition(_))
        ));

        let bad_role = vec![SubnetPartition::new("Not Ok", 28, RoutingClass::Public)];
        assert!(matches!(
            Network::new(id("Net"), block(), 2, 0, bad_role),
            Err(NetworkError::InvalidRole(_))
        ));

        let too_wide = vec![SubnetPartition::new("Public", 16, RoutingClass::Public)];
        assert!(matches!(
            Network::new(id("Net"), block(), 1, 0, too_wide),
            Err(NetworkError::InvalidSubnetMask { mask: 16, .. })
        ));
    }

    #[test]
    fn test_overlong_subnet_id_keeps_its_cause() {
        let long = id(&format!("Net{}", "x".repeat(LogicalId::MAX_LENGTH - 10)));

        assert_eq!(
            Network::new(long, block(), 2, 0, consumer_partitions()),
            Err(NetworkError::InvalidSubnetId(LogicalIdError::TooLong(
                LogicalId::MAX_LENGTH + 6
            )))
        );
    }

    #[test]
    fn test_gateway_rules() {
        let private_only = vec![SubnetPartition::new("Private", 28, RoutingClass::PrivateRouted)];
        assert!(matches!(
            Network::new(id("Net"), block(), 2, 1, private_only.clone()),
            Err(NetworkError::GatewayWithoutPublicSubnet(_))
        ));

        let mut with_public = private_only;
        with_public.insert(0, SubnetPartition::new("Public", 28, RoutingClass::Public));
        assert!(matches!(
            Network::new(id("Net"), block(), 2, 0, with_public.clone()),
            Err(NetworkError::PrivateRoutedWithoutGateway(_))
        ));
        assert!(matches!(
            Network::new(id("Net"), block(), 2, 3, with_public.clone()),
            Err(NetworkError::TooManyGateways { gateways: 3, az_count: 2 })
        ));

        let network = Network::new(id("Net"), block(), 2, 1, with_public).unwrap();
        assert!(network.is_gateway_bearing());
        assert!(network.has_public_partition());
    }

    #[test]
    fn test_selection() {
        let network = Network::new(id("ConsumerVpc"), block(), 2, 0, consumer_partitions()).unwrap();

        let isolated = SubnetSelector::routing(RoutingClass::Isolated);
        assert!(network.has_partition(&isolated));
        assert_eq!(network.select(&isolated).len(), 2);

        let pinned = isolated.in_zone(1);
        let selected = network.select(&pinned);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id.as_str(), "ConsumerVpcIsolatedSubnet2");

        let private = SubnetSelector::routing(RoutingClass::PrivateRouted);
        assert!(!network.has_partition(&private));
        assert!(network.select(&private).is_empty());
        assert!(network.select(&isolated.in_zone(5)).is_empty());
    }
}
