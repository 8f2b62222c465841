// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-mirror-topology
//!
//! Provides the reference deployment and a few deterministic variants of it.
//!
//! # Design Principles
//! - Fixtures are the ONLY place that builds configurations from scratch
//! - Tests tweak a fixture with `with_*` builders, never hand-roll a config
//! - Everything here is deterministic: same call, same graph

#![allow(dead_code)]

use std::collections::BTreeSet;

use serde_json::Value;
use tracing_subscriber::EnvFilter;

use cim_mirror_topology::domain::LogicalId;
use cim_mirror_topology::{build, ResourceGraph, TopologyConfig};

/// Address block shared by both reference networks
pub const REFERENCE_BLOCK: &str = "10.10.0.0/24";

/// Logical ids of the reference deployment, sorted
pub const REFERENCE_IDS: [&str; 11] = [
    "ConsumerEC2Instance",
    "ConsumerEC2InstanceSG",
    "ConsumerVPC",
    "GatewayLoadBalancer",
    "GatewayLoadBalancerListener",
    "GatewayLoadBalancerTargetGroup",
    "MonitoringEC2Instance",
    "MonitoringEC2InstanceSG",
    "MonitoringVPC",
    "SSMIAMRole",
    "VPCEndpointService",
];

/// Route test logs through the test harness (`RUST_LOG=debug` to see them)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn id(s: &str) -> LogicalId {
    LogicalId::new(s).expect("Invalid logical id in test fixture")
}

/// The reference deployment configuration
pub fn reference_config() -> TopologyConfig {
    TopologyConfig::default()
}

/// The reference deployment with the consumer-side endpoint declared
pub fn endpoint_config() -> TopologyConfig {
    reference_config().with_interface_endpoint(true)
}

pub fn reference_graph() -> ResourceGraph {
    init_tracing();
    build(&reference_config()).expect("Reference deployment must build")
}

pub fn endpoint_graph() -> ResourceGraph {
    init_tracing();
    build(&endpoint_config()).expect("Endpoint deployment must build")
}

/// Every `Ref` and `Fn::GetAtt` target anywhere inside a template value
pub fn template_targets(value: &Value) -> BTreeSet<String> {
    let mut targets = BTreeSet::new();
    collect_targets(value, &mut targets);
    targets
}

fn collect_targets(value: &Value, targets: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get("Ref") {
                targets.insert(target.clone());
            }
            if let Some(Value::String(target)) = map.get("Fn::GetAtt").and_then(|v| v.get(0)) {
                targets.insert(target.clone());
            }
            for nested in map.values() {
                collect_targets(nested, targets);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_targets(item, targets);
            }
        }
        _ => {}
    }
}
