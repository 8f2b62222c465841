// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Graph Invariants
//!
//! Entity constructors enforce what an entity can check about itself. The
//! functions here check what only holds between entities: a subnet selector
//! against the partitions of the network it points into, a target group
//! against its members, a listener against the load balancer it sits on.
//!
//! # Invariant Categories
//!
//! 1. **Placement**: selectors resolve to subnets of the owning network
//! 2. **Network affinity**: linked entities live in the same network
//! 3. **Port discipline**: health-check and forwarding ports stay apart
//! 4. **Gateway rules**: what a gateway load balancer demands of its
//!    target group, members, service and endpoints
//!
//! All functions are pure: no I/O, no mutation, deterministic.

use super::{
    ComputeNode, EndpointService, EndpointType, InterfaceEndpoint, Listener, LoadBalancer,
    LogicalId, Network, Protocol, ResourceRef, SecurityPolicy, SubnetSelector, TargetGroup,
    GENEVE_PORT,
};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Invariant violation with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Selector names a routing class the network has no partition for
    #[error("{entity} selects {selector} subnets, but network {network} has no such partition")]
    SubnetSelectorNotPartitioned {
        entity: String,
        selector: String,
        network: String,
    },

    /// Selector pins an availability zone the network does not span
    #[error("{entity} pins zone {zone}, but network {network} spans only {az_count} AZs")]
    SubnetZoneOutOfRange {
        entity: String,
        zone: u8,
        network: String,
        az_count: u8,
    },

    /// Selector resolves to no concrete subnet
    #[error("{entity} selects {selector} subnets of {network}, which resolves to none")]
    EmptySubnetSelection {
        entity: String,
        selector: String,
        network: String,
    },

    /// Two linked entities live in different networks
    #[error("{entity} belongs to {actual}, expected network {expected}")]
    NetworkMismatch {
        entity: String,
        expected: String,
        actual: String,
    },

    /// Health check probes the data-plane port
    #[error("Target group {target_group} health-checks its forwarding port {port}")]
    PortConflation { target_group: String, port: u16 },

    /// Health check protocol cannot probe anything
    #[error("Target group {target_group} cannot health-check with {protocol}")]
    HealthCheckProtocol {
        target_group: String,
        protocol: String,
    },

    /// Gateway target groups must forward GENEVE on its well-known port
    #[error("Target group {target_group} behind a gateway forwards {protocol}/{port}, expected GENEVE/6081")]
    GatewayForwarding {
        target_group: String,
        protocol: String,
        port: u16,
    },

    /// Appliance behind a gateway would drop traffic not addressed to itself
    #[error("Compute node {node} is a member of gateway target group {target_group} but keeps source/destination check enabled")]
    SourceDestCheckEnabled { node: String, target_group: String },

    /// Endpoint service must be backed by a gateway load balancer
    #[error("Endpoint service {service} is backed by {load_balancer}, which is not a gateway load balancer")]
    EndpointServiceBacking {
        service: String,
        load_balancer: String,
    },

    /// Gateway-load-balancer endpoints attach to exactly one subnet
    #[error("Endpoint {endpoint} resolves to {count} subnets, a gateway endpoint needs exactly one")]
    EndpointSubnetCount { endpoint: String, count: usize },

    /// Endpoint port differs from what its service forwards
    #[error("Endpoint {endpoint} uses port {port}, expected {expected}")]
    EndpointPort {
        endpoint: String,
        port: u16,
        expected: u16,
    },
}

/// Validate a subnet selector against the network it points into
///
/// # Rules
/// - The routing class is one of the network's partitions
/// - A pinned zone lies within the network's AZ spread
/// - The selection resolves to at least one concrete subnet
pub fn validate_subnet_selection(
    entity: &LogicalId,
    selector: &SubnetSelector,
    network: &Network,
) -> ValidationResult {
    if !network.has_partition(selector) {
        return Err(ValidationError::SubnetSelectorNotPartitioned {
            entity: entity.to_string(),
            selector: selector.to_string(),
            network: network.id.to_string(),
        });
    }

    if let Some(zone) = selector.zone {
        if zone >= network.az_count {
            return Err(ValidationError::SubnetZoneOutOfRange {
                entity: entity.to_string(),
                zone,
                network: network.id.to_string(),
                az_count: network.az_count,
            });
        }
    }

    if network.select(selector).is_empty() {
        return Err(ValidationError::EmptySubnetSelection {
            entity: entity.to_string(),
            selector: selector.to_string(),
            network: network.id.to_string(),
        });
    }

    Ok(())
}

/// Validate that an entity lives in the expected network
pub fn validate_same_network(
    entity: &LogicalId,
    expected: &ResourceRef,
    actual: &ResourceRef,
) -> ValidationResult {
    if expected.id != actual.id {
        return Err(ValidationError::NetworkMismatch {
            entity: entity.to_string(),
            expected: expected.id.to_string(),
            actual: actual.id.to_string(),
        });
    }
    Ok(())
}

/// Validate where a compute node sits
///
/// # Rules
/// - Its subnet selector resolves within its own network
/// - An attached security policy belongs to the same network
pub fn validate_compute_placement(
    node: &ComputeNode,
    network: &Network,
    policy: Option<&SecurityPolicy>,
) -> ValidationResult {
    validate_subnet_selection(&node.id, &node.subnet, network)?;

    if let Some(policy) = policy {
        validate_same_network(&policy.id, &node.network, &policy.network)?;
    }

    Ok(())
}

/// Validate the port discipline of a target group
///
/// # Rules
/// - The health-check port differs from the forwarding port
/// - The health-check protocol can actually probe (TCP/HTTP/HTTPS)
pub fn validate_target_group_ports(group: &TargetGroup) -> ValidationResult {
    if group.health_check.port == group.port {
        return Err(ValidationError::PortConflation {
            target_group: group.id.to_string(),
            port: group.port,
        });
    }

    if !group.health_check.protocol.is_health_checkable() {
        return Err(ValidationError::HealthCheckProtocol {
            target_group: group.id.to_string(),
            protocol: group.health_check.protocol.to_string(),
        });
    }

    Ok(())
}

/// Validate a target group member
///
/// Members must share the group's network. Behind a gateway load balancer
/// they must also have source/destination check disabled.
pub fn validate_target_member(
    group: &TargetGroup,
    member: &ComputeNode,
    behind_gateway: bool,
) -> ValidationResult {
    validate_same_network(&member.id, &group.network, &member.network)?;

    if behind_gateway && member.source_dest_check {
        return Err(ValidationError::SourceDestCheckEnabled {
            node: member.id.to_string(),
            target_group: group.id.to_string(),
        });
    }

    Ok(())
}

/// Validate a listener against the load balancer it sits on and the group it forwards to
///
/// # Rules
/// - Load balancer and target group share a network
/// - Behind a gateway, the group forwards GENEVE on 6081
pub fn validate_listener(
    listener: &Listener,
    load_balancer: &LoadBalancer,
    group: &TargetGroup,
) -> ValidationResult {
    validate_same_network(&listener.id, &load_balancer.network, &group.network)?;

    if load_balancer.is_gateway() && (group.protocol != Protocol::Geneve || group.port != GENEVE_PORT)
    {
        return Err(ValidationError::GatewayForwarding {
            target_group: group.id.to_string(),
            protocol: group.protocol.to_string(),
            port: group.port,
        });
    }

    Ok(())
}

/// Validate that an endpoint service is backed by a gateway load balancer
pub fn validate_endpoint_service(
    service: &EndpointService,
    load_balancer: &LoadBalancer,
) -> ValidationResult {
    if !load_balancer.is_gateway() {
        return Err(ValidationError::EndpointServiceBacking {
            service: service.id.to_string(),
            load_balancer: load_balancer.id.to_string(),
        });
    }
    Ok(())
}

/// Validate a consumer-side endpoint
///
/// # Rules
/// - Its subnet selector resolves within its own network
/// - A gateway-load-balancer endpoint resolves to exactly one subnet
/// - A gateway-load-balancer endpoint uses the GENEVE port
pub fn validate_interface_endpoint(
    endpoint: &InterfaceEndpoint,
    network: &Network,
) -> ValidationResult {
    validate_subnet_selection(&endpoint.id, &endpoint.subnets, network)?;

    if endpoint.endpoint_type == EndpointType::GatewayLoadBalancer {
        let count = network.select(&endpoint.subnets).len();
        if count != 1 {
            return Err(ValidationError::EndpointSubnetCount {
                endpoint: endpoint.id.to_string(),
                count,
            });
        }

        if endpoint.port != GENEVE_PORT {
            return Err(ValidationError::EndpointPort {
                endpoint: endpoint.id.to_string(),
                port: endpoint.port,
                expected: GENEVE_PORT,
            });
        }
    }

    Ok(())
}
