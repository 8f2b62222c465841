// Copyright (c) 2025 - Cowboy AI, Inc.
//! Graph Builder
//!
//! Collects declared entities and turns them into a [`ResourceGraph`] only
//! once every reference resolves to an entity of the expected kind and every
//! cross-entity invariant holds. The first failure aborts the build; no
//! partial graph is ever handed out.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::{DeploymentContext, ProvisioningSequence, ResourceGraph};
use crate::domain::invariants::{
    validate_compute_placement, validate_endpoint_service, validate_interface_endpoint,
    validate_listener, validate_subnet_selection, validate_target_group_ports,
    validate_target_member,
};
use crate::domain::{LogicalId, Resource, ResourceRef};
use crate::errors::{TopologyError, TopologyResult};

/// Accumulates entities for one resource graph
#[derive(Debug, Default)]
pub struct GraphBuilder {
    description: String,
    context: DeploymentContext,
    resources: BTreeMap<LogicalId, Resource>,
}

impl GraphBuilder {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            context: DeploymentContext::default(),
            resources: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, context: DeploymentContext) -> Self {
        self.context = context;
        self
    }

    /// Declare an entity and get a reference to it
    ///
    /// Rejects a logical id that is already declared, whatever its kind.
    pub fn add(&mut self, resource: impl Into<Resource>) -> TopologyResult<ResourceRef> {
        let resource = resource.into();
        let reference = resource.to_ref();

        if self.resources.contains_key(&reference.id) {
            return Err(TopologyError::DuplicateId(reference.id));
        }

        debug!(
            id = %reference.id,
            kind = reference.kind.as_str(),
            references = resource.references().len(),
            "Declared resource"
        );

        self.resources.insert(reference.id.clone(), resource);
        Ok(reference)
    }

    /// Number of entities declared so far
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Validate and seal the graph
    ///
    /// # Checks, in order
    /// 1. Every reference resolves to an entity of the referenced kind
    /// 2. Every cross-entity invariant holds
    /// 3. The reference graph is acyclic
    pub fn finish(self) -> TopologyResult<ResourceGraph> {
        for resource in self.resources.values() {
            for target in resource.references() {
                self.lookup(resource.id(), &target)?;
            }
        }

        for resource in self.resources.values() {
            self.check_invariants(resource)?;
        }

        let graph = ResourceGraph {
            description: self.description,
            context: self.context,
            resources: self.resources,
        };

        let order = ProvisioningSequence::from_graph(&graph)?;

        info!(
            resources = graph.len(),
            edges = graph.references().len(),
            waves = order.num_waves(),
            "Resource graph validated"
        );

        Ok(graph)
    }

    fn lookup(&self, from: &LogicalId, target: &ResourceRef) -> TopologyResult<&Resource> {
        let resource = self.resources.get(&target.id).ok_or_else(|| {
            TopologyError::UnresolvedReference {
                from: from.clone(),
                target: target.clone(),
            }
        })?;

        if resource.kind() != target.kind {
            return Err(TopologyError::KindMismatch {
                from: from.clone(),
                target: target.clone(),
                actual: resource.kind(),
            });
        }

        Ok(resource)
    }

    /// Resolve a reference and project it onto one variant
    fn typed<'a, T>(
        &'a self,
        from: &LogicalId,
        target: &ResourceRef,
        project: fn(&'a Resource) -> Option<&'a T>,
    ) -> TopologyResult<&'a T> {
        let resource = self.lookup(from, target)?;
        project(resource).ok_or_else(|| TopologyError::KindMismatch {
            from: from.clone(),
            target: target.clone(),
            actual: resource.kind(),
        })
    }

    /// Whether a target group sits behind a listener on a gateway load balancer
    fn is_behind_gateway(&self, group: &LogicalId) -> bool {
        self.resources
            .values()
            .filter_map(Resource::as_listener)
            .filter(|listener| &listener.target_group().id == group)
            .filter_map(|listener| self.resources.get(&listener.load_balancer.id))
            .filter_map(Resource::as_load_balancer)
            .any(|lb| lb.is_gateway())
    }

    fn check_invariants(&self, resource: &Resource) -> TopologyResult<()> {
        match resource {
            Resource::Network(_) | Resource::IdentityRole(_) | Resource::SecurityPolicy(_) => {}

            Resource::ComputeNode(node) => {
                let network = self.typed(&node.id, &node.network, Resource::as_network)?;
                let policy = match &node.security_policy {
                    Some(reference) => {
                        Some(self.typed(&node.id, reference, Resource::as_security_policy)?)
                    }
                    None => None,
                };
                validate_compute_placement(node, network, policy)?;
            }

            Resource::LoadBalancer(lb) => {
                let network = self.typed(&lb.id, &lb.network, Resource::as_network)?;
                validate_subnet_selection(&lb.id, &lb.subnets, network)?;
            }

            Resource::TargetGroup(group) => {
                validate_target_group_ports(group)?;
                let behind_gateway = self.is_behind_gateway(&group.id);
                for target in &group.targets {
                    let member = self.typed(&group.id, target, Resource::as_compute_node)?;
                    validate_target_member(group, member, behind_gateway)?;
                }
            }

            Resource::Listener(listener) => {
                let lb = self.typed(
                    &listener.id,
                    &listener.load_balancer,
                    Resource::as_load_balancer,
                )?;
                let group = self.typed(
                    &listener.id,
                    listener.target_group(),
                    Resource::as_target_group,
                )?;
                validate_listener(listener, lb, group)?;
            }

            Resource::EndpointService(service) => {
                let lb = self.typed(&service.id, &service.load_balancer, Resource::as_load_balancer)?;
                validate_endpoint_service(service, lb)?;
            }

            Resource::InterfaceEndpoint(endpoint) => {
                let network = self.typed(&endpoint.id, &endpoint.network, Resource::as_network)?;
                validate_interface_endpoint(endpoint, network)?;
            }
        }

        Ok(())
    }
}
