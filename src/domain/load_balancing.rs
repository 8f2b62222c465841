// Copyright (c) 2025 - Cowboy AI, Inc.
//! Load Balancing Entities
//!
//! Gateway load balancer, its target group and listener, and the endpoint
//! service/endpoint pair that exposes it across network boundaries.
//!
//! # Port discipline
//!
//! A gateway target group has two ports that must never be conflated:
//! - the **health-check port** (control plane, 22/TCP here)
//! - the **forwarding port** (data plane, GENEVE on 6081)

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{LogicalId, ResourceRef, SubnetSelector};

/// Well-known GENEVE data-plane port
pub const GENEVE_PORT: u16 = 6081;

/// Address family of a load balancer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Ipv4,
    Dualstack,
}

impl AddressFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ipv4 => "ipv4",
            Self::Dualstack => "dualstack",
        }
    }
}

/// Load balancer class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadBalancerType {
    Application,
    Network,
    Gateway,
}

impl LoadBalancerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Network => "network",
            Self::Gateway => "gateway",
        }
    }
}

/// Transport protocol for health checks and forwarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
    Http,
    Https,
    Geneve,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Http => "HTTP",
            Self::Https => "HTTPS",
            Self::Geneve => "GENEVE",
        }
    }

    /// Protocols a health check may probe with
    pub fn is_health_checkable(&self) -> bool {
        matches!(self, Self::Tcp | Self::Http | Self::Https)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target type tag of a target group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Instance,
    Ip,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::Ip => "ip",
        }
    }
}

/// Load balancer placed into the subnets of one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub id: LogicalId,
    pub lb_type: LoadBalancerType,
    pub address_family: AddressFamily,
    pub network: ResourceRef,
    pub subnets: SubnetSelector,
}

impl LoadBalancer {
    /// Gateway-class load balancer
    pub fn gateway(id: LogicalId, network: ResourceRef, subnets: SubnetSelector) -> Self {
        Self {
            id,
            lb_type: LoadBalancerType::Gateway,
            address_family: AddressFamily::Ipv4,
            network,
            subnets,
        }
    }

    pub fn is_gateway(&self) -> bool {
        self.lb_type == LoadBalancerType::Gateway
    }

    pub fn references(&self) -> Vec<ResourceRef> {
        vec![self.network.clone()]
    }
}

/// Health check probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealthCheck {
    pub port: u16,
    pub protocol: Protocol,
}

/// Target group of compute nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub id: LogicalId,
    pub health_check: HealthCheck,
    /// Forwarding (data-plane) port
    pub port: u16,
    /// Forwarding (data-plane) protocol
    pub protocol: Protocol,
    pub target_type: TargetType,
    pub network: ResourceRef,
    pub targets: Vec<ResourceRef>,
}

impl TargetGroup {
    /// Target group forwarding GENEVE on its well-known port
    pub fn geneve(id: LogicalId, network: ResourceRef, health_check: HealthCheck) -> Self {
        Self {
            id,
            health_check,
            port: GENEVE_PORT,
            protocol: Protocol::Geneve,
            target_type: TargetType::Instance,
            network,
            targets: Vec::new(),
        }
    }

    /// Register a compute node; registering twice is a no-op
    pub fn target(mut self, node: ResourceRef) -> Self {
        if !self.targets.contains(&node) {
            self.targets.push(node);
        }
        self
    }

    pub fn references(&self) -> Vec<ResourceRef> {
        let mut refs = vec![self.network.clone()];
        refs.extend(self.targets.iter().cloned());
        refs
    }
}

/// Default action of a listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ListenerAction {
    Forward { target_group: ResourceRef },
}

/// Listener on a load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    pub id: LogicalId,
    pub load_balancer: ResourceRef,
    pub default_action: ListenerAction,
}

impl Listener {
    pub fn forward(id: LogicalId, load_balancer: ResourceRef, target_group: ResourceRef) -> Self {
        Self {
            id,
            load_balancer,
            default_action: ListenerAction::Forward { target_group },
        }
    }

    /// Target group the default action forwards to
    pub fn target_group(&self) -> &ResourceRef {
        match &self.default_action {
            ListenerAction::Forward { target_group } => target_group,
        }
    }

    pub fn references(&self) -> Vec<ResourceRef> {
        vec![self.load_balancer.clone(), self.target_group().clone()]
    }
}

/// Provider-side endpoint service backed by a gateway load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointService {
    pub id: LogicalId,
    pub load_balancer: ResourceRef,
    /// When false, connection requests are accepted automatically
    pub acceptance_required: bool,
}

impl EndpointService {
    pub fn new(id: LogicalId, load_balancer: ResourceRef, acceptance_required: bool) -> Self {
        Self {
            id,
            load_balancer,
            acceptance_required,
        }
    }

    pub fn references(&self) -> Vec<ResourceRef> {
        vec![self.load_balancer.clone()]
    }
}

/// How an endpoint attaches to its service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointType {
    Interface,
    GatewayLoadBalancer,
}

impl EndpointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interface => "Interface",
            Self::GatewayLoadBalancer => "GatewayLoadBalancer",
        }
    }
}

/// Consumer-side endpoint into an endpoint service of another network
///
/// A gateway-load-balancer endpoint attaches to exactly one subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceEndpoint {
    pub id: LogicalId,
    pub endpoint_type: EndpointType,
    pub network: ResourceRef,
    pub subnets: SubnetSelector,
    pub service: ResourceRef,
    pub port: u16,
}

impl InterfaceEndpoint {
    pub fn gateway_load_balancer(
        id: LogicalId,
        network: ResourceRef,
        subnets: SubnetSelector,
        service: ResourceRef,
    ) -> Self {
        Self {
            id,
            endpoint_type: EndpointType::GatewayLoadBalancer,
            network,
            subnets,
            service,
            port: GENEVE_PORT,
        }
    }

    pub fn references(&self) -> Vec<ResourceRef> {
        vec![self.network.clone(), self.service.clone()]
    }
}
