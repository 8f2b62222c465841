// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Declaration
//!
//! [`build`] is the only entry point: a pure function from a
//! [`TopologyConfig`] to a validated [`ResourceGraph`]. It declares
//!
//! - a consumer network (public + isolated partitions, no outbound gateway)
//! - a monitoring network (public + private-routed partitions, one gateway)
//! - an SSM identity role shared by both compute nodes
//! - one compute node per network, the monitoring one acting as appliance
//! - a security policy admitting the monitoring network's own block, and an
//!   outbound-only one for the consumer node
//! - a gateway load balancer with target group and listener
//! - an endpoint service exposing the load balancer
//! - optionally, a consumer-side endpoint into that service
//!
//! Any configuration error, unresolved reference or invariant violation
//! fails the whole build.

use tracing::{debug, info, warn};

use crate::config::TopologyConfig;
use crate::domain::{
    AllowRule, BlockDevice, ComputeNode, EndpointService, HealthCheck, IdentityRole,
    InstanceClass, InterfaceEndpoint, Listener, LoadBalancer, LogicalId, Network, PeerSelector,
    PortSelector, ResourceRef, RoutingClass, SecurityPolicy, SubnetPartition, SubnetSelector,
    TargetGroup,
};
use crate::errors::TopologyResult;
use crate::graph::{GraphBuilder, ResourceGraph};

/// Mask size of every subnet partition
const SUBNET_MASK: u8 = 28;

/// Length of the longest id derived from an unprefixed label
/// ("MonitoringVPCPrivateSubnet1RouteTableAssociation")
pub(crate) const LONGEST_DERIVED_ID: usize = 48;

/// Declare the mirroring topology described by `config`
pub fn build(config: &TopologyConfig) -> TopologyResult<ResourceGraph> {
    config.validate()?;

    let name = |label: &str| LogicalId::from_label(&format!("{} {}", config.name_prefix, label));
    let mut graph =
        GraphBuilder::new(config.description.clone()).with_context(config.context());

    // Identity
    let role = match &config.role.instance_role {
        Some(label) => {
            let role = config.role.managed_policies.iter().fold(
                IdentityRole::new(name(label.as_str())?, config.role.trust_principal.clone()),
                |role, policy| role.managed_policy(policy.clone()),
            );
            Some(graph.add(role)?)
        }
        None => {
            warn!("No instance role configured, compute nodes cannot be declared");
            None
        }
    };

    // Networks
    let consumer = graph.add(Network::new(
        name("Consumer VPC")?,
        config.consumer.cidr,
        config.consumer.az_count,
        config.consumer.outbound_gateways,
        vec![
            SubnetPartition::new("Public", SUBNET_MASK, RoutingClass::Public),
            SubnetPartition::new("Isolated", SUBNET_MASK, RoutingClass::Isolated),
        ],
    )?)?;

    let monitoring = graph.add(Network::new(
        name("Monitoring VPC")?,
        config.monitoring.cidr,
        config.monitoring.az_count,
        config.monitoring.outbound_gateways,
        vec![
            SubnetPartition::new("Public", SUBNET_MASK, RoutingClass::Public),
            SubnetPartition::new("Private", SUBNET_MASK, RoutingClass::PrivateRouted),
        ],
    )?)?;

    // Security
    let consumer_policy = graph.add(
        SecurityPolicy::new(name("Consumer EC2 Instance SG")?, consumer.clone(), "")
            .allow_all_outbound(true),
    )?;

    let appliance_policy = graph.add(
        SecurityPolicy::new(name("Monitoring EC2 Instance SG")?, monitoring.clone(), "")
            .allow_all_outbound(true)
            .rule(AllowRule::ingress(
                PeerSelector::Ipv4(config.monitoring.cidr),
                PortSelector::AllTraffic,
            )),
    )?;

    // Compute
    let instance_class = InstanceClass::new(config.compute.instance_class.as_str())?;
    let root_volume = BlockDevice::new(
        config.compute.device_name.as_str(),
        config.compute.volume_size_gib,
        config.compute.volume_type,
    )?;

    let node = |label: &str, network: &ResourceRef| -> TopologyResult<_> {
        let builder = ComputeNode::builder(name(label)?, instance_class.clone(), network.clone())
            .image(config.compute.image.clone())
            .block_device(root_volume.clone())
            .propagate_tags_to_volumes(true);
        Ok(match &role {
            Some(role) => builder.role(role.clone()),
            None => builder,
        })
    };

    graph.add(
        node("Consumer EC2 Instance", &consumer)?
            .subnet(SubnetSelector::routing(RoutingClass::Public))
            .security_policy(consumer_policy)
            .build()?,
    )?;

    let appliance = graph.add(
        node("Monitoring EC2 Instance", &monitoring)?
            .subnet(SubnetSelector::routing(RoutingClass::PrivateRouted))
            .security_policy(appliance_policy)
            .source_dest_check(false)
            .build()?,
    )?;

    // Gateway load balancing
    let gateway = graph.add(LoadBalancer::gateway(
        name("Gateway Load Balancer")?,
        monitoring.clone(),
        SubnetSelector::routing(RoutingClass::PrivateRouted),
    ))?;

    let mut targets = TargetGroup::geneve(
        name("Gateway Load Balancer Target Group")?,
        monitoring,
        HealthCheck {
            port: config.mirroring.health_check_port,
            protocol: config.mirroring.health_check_protocol,
        },
    )
    .target(appliance);
    targets.port = config.mirroring.forward_port;
    targets.protocol = config.mirroring.forward_protocol;
    let targets = graph.add(targets)?;

    graph.add(Listener::forward(
        name("Gateway Load Balancer Listener")?,
        gateway.clone(),
        targets,
    ))?;

    if !config.mirroring.acceptance_required {
        warn!("Endpoint service accepts connection requests without approval");
    }
    let service = graph.add(EndpointService::new(
        name("VPC Endpoint Service")?,
        gateway,
        config.mirroring.acceptance_required,
    ))?;

    // Consumer-side endpoint, pinned to the first isolated subnet
    if config.interface_endpoint {
        let endpoint = graph.add(InterfaceEndpoint::gateway_load_balancer(
            name("VPC Endpoint")?,
            consumer,
            SubnetSelector::routing(RoutingClass::Isolated).in_zone(0),
            service,
        ))?;
        debug!("Declared consumer endpoint {}", endpoint.id);
    }

    let declared = graph.len();
    let graph = graph.finish()?;

    info!(
        region = %graph.context().region,
        resources = declared,
        interface_endpoint = config.interface_endpoint,
        "Declared mirroring topology"
    );

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComputeNodeError, Declared, Resource, ResourceKind};
    use crate::errors::TopologyError;

    #[test]
    fn test_reference_deployment() {
        let graph = build(&TopologyConfig::default()).unwrap();

        assert_eq!(graph.len(), 11);
        assert!(graph.get("ConsumerVPC").is_some());
        assert!(graph.get("MonitoringVPC").is_some());
        assert!(graph.get("SSMIAMRole").is_some());
        assert!(graph.get("VPCEndpoint").is_none());
        assert_eq!(graph.resources_of(ResourceKind::ComputeNode).count(), 2);
    }

    #[test]
    fn test_exactly_one_gateway_bearing_network() {
        let graph = build(&TopologyConfig::default()).unwrap();
        let bearing: Vec<&str> = graph
            .resources_of(ResourceKind::Network)
            .filter_map(Resource::as_network)
            .filter(|n| n.is_gateway_bearing())
            .map(|n| n.id.as_str())
            .collect();

        assert_eq!(bearing, vec!["MonitoringVPC"]);
    }

    #[test]
    fn test_consumer_node_has_outbound_only_policy() {
        let graph = build(&TopologyConfig::default()).unwrap();
        let policy = graph
            .get("ConsumerEC2InstanceSG")
            .and_then(Resource::as_security_policy)
            .unwrap();
        let node = graph
            .get("ConsumerEC2Instance")
            .and_then(Resource::as_compute_node)
            .unwrap();

        assert_eq!(node.security_policy.as_ref(), Some(&policy.reference()));
        assert_eq!(policy.network.id.as_str(), "ConsumerVPC");
        assert!(policy.allow_all_outbound);
        assert!(policy.rules.is_empty());
    }

    #[test]
    fn test_longest_derived_id() {
        let graph = build(&TopologyConfig::default().with_az_count(6).with_interface_endpoint(true))
            .unwrap();
        let template = crate::projection::synthesize(&graph).unwrap();
        let longest = template["Resources"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::len)
            .max();

        assert_eq!(longest, Some(LONGEST_DERIVED_ID));
    }

    #[test]
    fn test_missing_role_fails() {
        let config = TopologyConfig::default().with_instance_role(None);
        assert!(matches!(
            build(&config),
            Err(TopologyError::ComputeNode(ComputeNodeError::MissingIdentityRole(_)))
        ));
    }

    #[test]
    fn test_name_prefix() {
        let graph = build(&TopologyConfig::default().with_name_prefix("Demo")).unwrap();
        assert!(graph.get("DemoConsumerVPC").is_some());
        assert!(graph.get("DemoGatewayLoadBalancerListener").is_some());
    }

    #[test]
    fn test_interface_endpoint_toggle() {
        let graph = build(&TopologyConfig::default().with_interface_endpoint(true)).unwrap();
        let endpoint = graph
            .get("VPCEndpoint")
            .and_then(Resource::as_interface_endpoint)
            .unwrap();

        assert_eq!(endpoint.network.id.as_str(), "ConsumerVPC");
        assert_eq!(endpoint.service.id.as_str(), "VPCEndpointService");
        assert_eq!(endpoint.port, 6081);
    }
}
