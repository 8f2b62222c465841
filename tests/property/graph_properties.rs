// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Topology Declaration
//!
//! Every accepted configuration must yield a closed, acyclic graph whose
//! subnets tile their network, whose waves respect every reference, and
//! whose template contains no dangling reference.

use cim_mirror_topology::domain::{GENEVE_PORT, Resource, ResourceKind};
use cim_mirror_topology::{build, synthesize, TopologyConfig, TopologyError};
use proptest::prelude::*;

use crate::fixtures::template_targets;

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Health-check ports that never collide with the forwarding port
fn health_check_port() -> impl Strategy<Value = u16> {
    (1u16..=u16::MAX).prop_filter("must differ from the GENEVE port", |p| *p != GENEVE_PORT)
}

/// Optional id-safe name prefix
fn name_prefix() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[A-Z][a-z]{0,8}"]
}

/// Accepted topology configurations
fn topology_config() -> impl Strategy<Value = TopologyConfig> {
    (1u8..=6, 1u32..=100, health_check_port(), any::<bool>(), name_prefix()).prop_map(
        |(az_count, volume, health_port, endpoint, prefix)| {
            TopologyConfig::default()
                .with_az_count(az_count)
                .with_volume_size(volume)
                .with_ports(health_port, GENEVE_PORT)
                .with_interface_endpoint(endpoint)
                .with_name_prefix(prefix)
        },
    )
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Every reference resolves to an entity of the expected kind
    #[test]
    fn prop_references_resolve(config in topology_config()) {
        let graph = build(&config).unwrap();

        for (from, target) in graph.references() {
            prop_assert!(
                graph.resolve(&target).is_some(),
                "{} refers to missing {}",
                from,
                target
            );
        }
    }

    /// Property: Subnets tile their network without overlapping
    #[test]
    fn prop_subnets_partition_network(config in topology_config()) {
        let graph = build(&config).unwrap();

        for network in graph
            .resources_of(ResourceKind::Network)
            .filter_map(Resource::as_network)
        {
            prop_assert_eq!(
                network.subnets.len(),
                usize::from(network.az_count) * network.partitions.len()
            );

            for (i, subnet) in network.subnets.iter().enumerate() {
                prop_assert!(network.cidr.contains(&subnet.cidr));
                prop_assert!(subnet.zone < network.az_count);

                for other in &network.subnets[i + 1..] {
                    prop_assert!(!subnet.cidr.overlaps(&other.cidr));
                }
            }
        }
    }

    /// Property: A referenced entity is provisioned in an earlier wave
    #[test]
    fn prop_waves_respect_references(config in topology_config()) {
        let graph = build(&config).unwrap();
        let order = graph.provisioning_order().unwrap();

        prop_assert_eq!(order.total(), graph.len());

        for (from, target) in graph.references() {
            let referrer = order.wave_of(from.as_str());
            let referenced = order.wave_of(target.id.as_str());
            prop_assert!(referrer.is_some() && referenced.is_some());
            prop_assert!(referrer > referenced, "{} provisioned before {}", from, target);
        }
    }

    /// Property: Building twice yields the same graph and fingerprint
    #[test]
    fn prop_build_is_deterministic(config in topology_config()) {
        let first = build(&config).unwrap();
        let second = build(&config).unwrap();

        prop_assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
        prop_assert_eq!(first, second);
    }

    /// Property: Equal health-check and forwarding ports are always rejected
    #[test]
    fn prop_equal_ports_rejected(config in topology_config(), port in 0u16..=u16::MAX) {
        let result = build(&config.with_ports(port, port));

        prop_assert!(matches!(result, Err(TopologyError::Configuration(_))));
    }

    /// Property: A zero port on either side is always rejected
    #[test]
    fn prop_zero_port_rejected(config in topology_config(), port in 1u16..=u16::MAX) {
        let health = build(&config.clone().with_ports(0, port));
        let forward = build(&config.with_ports(port, 0));

        prop_assert!(matches!(health, Err(TopologyError::Configuration(_))));
        prop_assert!(matches!(forward, Err(TopologyError::Configuration(_))));
    }

    /// Property: Template references only point at template resources
    #[test]
    fn prop_template_references_resolve(config in topology_config()) {
        let graph = build(&config).unwrap();
        let template = synthesize(&graph).unwrap();
        let resources = template["Resources"].as_object().unwrap();

        for target in template_targets(&template["Resources"]) {
            prop_assert!(
                resources.contains_key(&target) || target.starts_with("AWS::"),
                "dangling template reference {}",
                target
            );
        }
    }
}
