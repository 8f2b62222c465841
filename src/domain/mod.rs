// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Models
//!
//! The entities a mirroring topology is declared from, the value objects they
//! are built of, and the pure invariants that hold between them once they are
//! assembled into one graph.
//!
//! # Value Objects with Invariants
//!
//! - [`LogicalId`] - Template-safe entity identifier
//! - [`Ipv4Cidr`] - Host-bit-free IPv4 address block
//! - [`InstanceClass`] - Instance sizing class (`family.size`)
//! - [`BlockDevice`] - Attached storage volume
//! - [`ResourceKind`] - Declared and derived resource taxonomy
//! - [`ResourceRef`] - Typed reference between entities
//!
//! # Entities
//!
//! - [`Network`] - Address block carved into partitioned subnets
//! - [`SecurityPolicy`] - Allow-list rules bound to a network
//! - [`ComputeNode`] - Instance referencing network, role and policy
//! - [`LoadBalancer`], [`TargetGroup`], [`Listener`] - Gateway load balancing
//! - [`EndpointService`], [`InterfaceEndpoint`] - Cross-network exposure
//! - [`IdentityRole`] - Role assumed by compute nodes
//!
//! Every entity is wrapped by the closed [`Resource`] enum once declared.

pub mod compute_node;
pub mod identifier;
pub mod identity;
pub mod invariants;
pub mod load_balancing;
pub mod network;
pub mod resource;
pub mod resource_kind;
pub mod security;

pub use compute_node::{
    BlockDevice, ComputeNode, ComputeNodeBuilder, ComputeNodeError, InstanceClass, MachineImage,
    VolumeType,
};
pub use identifier::{LogicalId, LogicalIdError};
pub use identity::IdentityRole;
pub use invariants::{ValidationError, ValidationResult};
pub use load_balancing::{
    AddressFamily, EndpointService, EndpointType, HealthCheck, InterfaceEndpoint, Listener,
    ListenerAction, LoadBalancer, LoadBalancerType, Protocol, TargetGroup, TargetType,
    GENEVE_PORT,
};
pub use network::{
    Ipv4Cidr, Network, NetworkError, RoutingClass, Subnet, SubnetPartition, SubnetSelector,
};
pub use resource::{Declared, Resource};
pub use resource_kind::{ResourceCategory, ResourceKind, ResourceRef};
pub use security::{AllowRule, Direction, PeerSelector, PortSelector, SecurityPolicy};
