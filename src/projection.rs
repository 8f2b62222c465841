// Copyright (c) 2025 - Cowboy AI, Inc.

//! Template Projection - Functor F: ResourceGraph → Template
//!
//! Renders a validated resource graph into the JSON document a
//! CloudFormation-style provisioning engine consumes.
//!
//! # Functoriality
//!
//! The projection is a pure fold over the graph's entities: each entity maps
//! to one or more template resources, and the template is their union.
//!
//! 1. **Identity**: an empty graph projects to an empty `Resources` map
//! 2. **Composition**: projecting entity by entity and merging equals
//!    projecting the whole graph
//!
//! # Architecture
//!
//! ```text
//! ResourceGraph ────F──────> Template
//!    │                          │
//!    │ Entities                 │ Resources
//!    ▼                          ▼
//! [Network]        ──>  [VPC, Subnet×n, RouteTable×n, IGW, EIP, NAT, ...]
//! [IdentityRole]   ──>  [Role, InstanceProfile]
//! [ComputeNode]    ──>  [Instance]
//! ```
//!
//! References between entities render as `{"Ref": "<logical id>"}`; the
//! engine derives its own dependency order from them.

mod network;
mod resources;

use serde_json::{json, Map, Value};

use crate::domain::{LogicalId, Resource, ResourceKind};
use crate::errors::{TopologyError, TopologyResult};
use crate::graph::ResourceGraph;

/// Template format version understood by the provisioning engine
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// One rendered template resource, keyed by its logical id
pub type TemplateEntry = (LogicalId, Value);

/// Project a graph into a template document
pub fn synthesize(graph: &ResourceGraph) -> TopologyResult<Value> {
    let resources = graph
        .iter()
        .try_fold(Map::new(), |mut rendered, resource| {
            for (id, body) in project_resource(graph, resource)? {
                if rendered.insert(id.to_string(), body).is_some() {
                    return Err(TopologyError::DuplicateId(id));
                }
            }
            Ok(rendered)
        })?;

    let context = graph.context();
    let mut deployment = Map::new();
    deployment.insert("Region".to_string(), json!(context.region));
    if let Some(account) = &context.account {
        deployment.insert("Account".to_string(), json!(account));
    }

    Ok(json!({
        "AWSTemplateFormatVersion": TEMPLATE_FORMAT_VERSION,
        "Description": graph.description(),
        "Metadata": { "DeploymentContext": deployment },
        "Resources": resources,
    }))
}

/// Project a graph into pretty-printed template text
pub fn synthesize_pretty(graph: &ResourceGraph) -> TopologyResult<String> {
    Ok(serde_json::to_string_pretty(&synthesize(graph)?)?)
}

/// Project one entity into its template resources
pub fn project_resource(
    graph: &ResourceGraph,
    resource: &Resource,
) -> TopologyResult<Vec<TemplateEntry>> {
    match resource {
        Resource::Network(net) => network::project(net),
        Resource::SecurityPolicy(policy) => Ok(vec![resources::security_policy(policy)]),
        Resource::ComputeNode(node) => Ok(vec![resources::compute_node(graph, node)?]),
        Resource::LoadBalancer(lb) => Ok(vec![resources::load_balancer(graph, lb)?]),
        Resource::TargetGroup(group) => Ok(vec![resources::target_group(group)]),
        Resource::Listener(listener) => Ok(vec![resources::listener(listener)]),
        Resource::EndpointService(service) => Ok(vec![resources::endpoint_service(service)]),
        Resource::InterfaceEndpoint(endpoint) => {
            Ok(vec![resources::interface_endpoint(graph, endpoint)?])
        }
        Resource::IdentityRole(role) => resources::identity_role(role),
    }
}

/// `{"Type": ..., "Properties": ...}`
fn template_resource(kind: ResourceKind, properties: Value) -> Value {
    json!({
        "Type": kind.template_type(),
        "Properties": properties,
    })
}

/// Same as [`template_resource`] with an explicit `DependsOn`
fn template_resource_after(kind: ResourceKind, properties: Value, depends_on: &[&LogicalId]) -> Value {
    let mut body = template_resource(kind, properties);
    body["DependsOn"] = depends_on.iter().map(|id| json!(id.as_str())).collect();
    body
}

/// `{"Ref": id}`
fn reference(id: &LogicalId) -> Value {
    json!({ "Ref": id.as_str() })
}

/// `{"Fn::GetAtt": [id, attribute]}`
fn get_att(id: &LogicalId, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id.as_str(), attribute] })
}

/// Availability zone by index within the deployment region
fn availability_zone(zone: u8) -> Value {
    json!({ "Fn::Select": [zone, { "Fn::GetAZs": "" }] })
}

fn name_tag(id: &LogicalId) -> Value {
    json!([{ "Key": "Name", "Value": id.as_str() }])
}
