// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Kind Taxonomy and Typed References
//!
//! Defines the closed set of resource kinds a topology can declare, the kinds
//! derived from them when the graph is rendered for the provisioning engine,
//! and the typed reference every cross-entity link is expressed with.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::LogicalId;

/// Resource kind taxonomy
///
/// The first group are entities declared directly in a resource graph. The
/// second group never appear as graph entities; they are emitted alongside a
/// declared entity when the graph is rendered (a network carries its subnets,
/// route tables and gateways; a role carries its instance profile).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    // Declared entities
    /// Virtual network with its subnet partitions
    Network,
    /// Allow-list security policy bound to a network
    SecurityPolicy,
    /// Compute instance
    ComputeNode,
    /// Load balancer (gateway class in this topology)
    LoadBalancer,
    /// Target group behind a load balancer listener
    TargetGroup,
    /// Load balancer listener
    Listener,
    /// Provider-side endpoint service
    EndpointService,
    /// Consumer-side endpoint into an endpoint service
    InterfaceEndpoint,
    /// Identity role assumed by compute nodes
    IdentityRole,

    // Derived entities
    /// Subnet carved from a network's address block
    Subnet,
    /// Per-subnet route table
    RouteTable,
    /// Association of a subnet with its route table
    SubnetRouteTableAssociation,
    /// Default route
    Route,
    /// Internet gateway of a network with public partitions
    InternetGateway,
    /// Attachment of an internet gateway to its network
    GatewayAttachment,
    /// Elastic address backing an outbound gateway
    ElasticIp,
    /// Outbound (NAT) gateway
    NatGateway,
    /// Instance profile wrapping an identity role
    InstanceProfile,
}

impl ResourceKind {
    /// All kinds that can be declared in a resource graph
    pub const DECLARED: [ResourceKind; 9] = [
        Self::Network,
        Self::SecurityPolicy,
        Self::ComputeNode,
        Self::LoadBalancer,
        Self::TargetGroup,
        Self::Listener,
        Self::EndpointService,
        Self::InterfaceEndpoint,
        Self::IdentityRole,
    ];

    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::SecurityPolicy => "security_policy",
            Self::ComputeNode => "compute_node",
            Self::LoadBalancer => "load_balancer",
            Self::TargetGroup => "target_group",
            Self::Listener => "listener",
            Self::EndpointService => "endpoint_service",
            Self::InterfaceEndpoint => "interface_endpoint",
            Self::IdentityRole => "identity_role",
            Self::Subnet => "subnet",
            Self::RouteTable => "route_table",
            Self::SubnetRouteTableAssociation => "subnet_route_table_association",
            Self::Route => "route",
            Self::InternetGateway => "internet_gateway",
            Self::GatewayAttachment => "gateway_attachment",
            Self::ElasticIp => "elastic_ip",
            Self::NatGateway => "nat_gateway",
            Self::InstanceProfile => "instance_profile",
        }
    }

    /// Externally recognized resource type consumed by the provisioning engine
    pub fn template_type(&self) -> &'static str {
        match self {
            Self::Network => "AWS::EC2::VPC",
            Self::SecurityPolicy => "AWS::EC2::SecurityGroup",
            Self::ComputeNode => "AWS::EC2::Instance",
            Self::LoadBalancer => "AWS::ElasticLoadBalancingV2::LoadBalancer",
            Self::TargetGroup => "AWS::ElasticLoadBalancingV2::TargetGroup",
            Self::Listener => "AWS::ElasticLoadBalancingV2::Listener",
            Self::EndpointService => "AWS::EC2::VPCEndpointService",
            Self::InterfaceEndpoint => "AWS::EC2::VPCEndpoint",
            Self::IdentityRole => "AWS::IAM::Role",
            Self::Subnet => "AWS::EC2::Subnet",
            Self::RouteTable => "AWS::EC2::RouteTable",
            Self::SubnetRouteTableAssociation => "AWS::EC2::SubnetRouteTableAssociation",
            Self::Route => "AWS::EC2::Route",
            Self::InternetGateway => "AWS::EC2::InternetGateway",
            Self::GatewayAttachment => "AWS::EC2::VPCGatewayAttachment",
            Self::ElasticIp => "AWS::EC2::EIP",
            Self::NatGateway => "AWS::EC2::NatGateway",
            Self::InstanceProfile => "AWS::IAM::InstanceProfile",
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Network => "Network",
            Self::SecurityPolicy => "Security Policy",
            Self::ComputeNode => "Compute Node",
            Self::LoadBalancer => "Load Balancer",
            Self::TargetGroup => "Target Group",
            Self::Listener => "Listener",
            Self::EndpointService => "Endpoint Service",
            Self::InterfaceEndpoint => "Interface Endpoint",
            Self::IdentityRole => "Identity Role",
            Self::Subnet => "Subnet",
            Self::RouteTable => "Route Table",
            Self::SubnetRouteTableAssociation => "Subnet Route Table Association",
            Self::Route => "Route",
            Self::InternetGateway => "Internet Gateway",
            Self::GatewayAttachment => "Gateway Attachment",
            Self::ElasticIp => "Elastic IP",
            Self::NatGateway => "NAT Gateway",
            Self::InstanceProfile => "Instance Profile",
        }
    }

    /// Get the primary category for this kind
    pub fn category(&self) -> ResourceCategory {
        match self {
            Self::Network
            | Self::Subnet
            | Self::RouteTable
            | Self::SubnetRouteTableAssociation
            | Self::Route
            | Self::InternetGateway
            | Self::GatewayAttachment
            | Self::ElasticIp
            | Self::NatGateway => ResourceCategory::Network,

            Self::SecurityPolicy => ResourceCategory::Security,

            Self::ComputeNode => ResourceCategory::Compute,

            Self::LoadBalancer
            | Self::TargetGroup
            | Self::Listener
            | Self::EndpointService
            | Self::InterfaceEndpoint => ResourceCategory::LoadBalancing,

            Self::IdentityRole | Self::InstanceProfile => ResourceCategory::Identity,
        }
    }

    /// Check if this kind can be declared directly in a resource graph
    pub fn is_declared(&self) -> bool {
        Self::DECLARED.contains(self)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Resource category (high-level grouping)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    /// Networks and everything carved from them
    Network,
    /// Security policies
    Security,
    /// Compute instances
    Compute,
    /// Load balancers, listeners, target groups, endpoints
    LoadBalancing,
    /// Roles and instance profiles
    Identity,
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "Network"),
            Self::Security => write!(f, "Security"),
            Self::Compute => write!(f, "Compute"),
            Self::LoadBalancing => write!(f, "Load Balancing"),
            Self::Identity => write!(f, "Identity"),
        }
    }
}

/// Typed reference from one declared entity to another
///
/// A reference names both the logical id and the kind it expects to find, so
/// a listener that points at a compute node instead of a target group fails
/// resolution rather than rendering a broken template.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: LogicalId,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, id: LogicalId) -> Self {
        Self { kind, id }
    }

    pub fn network(id: LogicalId) -> Self {
        Self::new(ResourceKind::Network, id)
    }

    pub fn security_policy(id: LogicalId) -> Self {
        Self::new(ResourceKind::SecurityPolicy, id)
    }

    pub fn compute_node(id: LogicalId) -> Self {
        Self::new(ResourceKind::ComputeNode, id)
    }

    pub fn load_balancer(id: LogicalId) -> Self {
        Self::new(ResourceKind::LoadBalancer, id)
    }

    pub fn target_group(id: LogicalId) -> Self {
        Self::new(ResourceKind::TargetGroup, id)
    }

    pub fn endpoint_service(id: LogicalId) -> Self {
        Self::new(ResourceKind::EndpointService, id)
    }

    pub fn identity_role(id: LogicalId) -> Self {
        Self::new(ResourceKind::IdentityRole, id)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}
