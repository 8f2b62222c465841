// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Graph
//!
//! A [`ResourceGraph`] is the complete, validated set of declared entities of
//! one topology, keyed by logical id. It is only obtainable through
//! [`GraphBuilder::finish`], so holding one means every reference resolves and
//! every invariant holds.
//!
//! All operations are read-only views.

mod builder;
mod sequence;

pub use builder::GraphBuilder;
pub use sequence::{ProvisioningSequence, ProvisioningWave};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{LogicalId, Network, Resource, ResourceKind, ResourceRef};
use crate::errors::TopologyResult;

/// Namespace for graph fingerprints
const FINGERPRINT_NAMESPACE: Uuid = Uuid::from_u128(0x6d1f_3c2a_9b4e_5f70_8a21_c0de_7e57_a11c);

/// Where the provisioning engine will realize a graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentContext {
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub account: Option<String>,
}

impl DeploymentContext {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account: None,
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }
}

impl Default for DeploymentContext {
    fn default() -> Self {
        Self::new("us-east-1")
    }
}

/// Validated set of declared entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceGraph {
    description: String,
    context: DeploymentContext,
    resources: BTreeMap<LogicalId, Resource>,
}

impl ResourceGraph {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn context(&self) -> &DeploymentContext {
        &self.context
    }

    /// Look up an entity by logical id
    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Resolve a reference; the entity must exist and be of the referenced kind
    pub fn resolve(&self, reference: &ResourceRef) -> Option<&Resource> {
        self.get(reference.id.as_str())
            .filter(|resource| resource.kind() == reference.kind)
    }

    /// Resolve a network reference
    pub fn network(&self, reference: &ResourceRef) -> Option<&Network> {
        self.resolve(reference).and_then(Resource::as_network)
    }

    /// Entities in logical id order
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Entities of one kind, in logical id order
    pub fn resources_of(&self, kind: ResourceKind) -> impl Iterator<Item = &Resource> {
        self.iter().filter(move |resource| resource.kind() == kind)
    }

    /// Every reference edge as (referrer, target)
    pub fn references(&self) -> Vec<(LogicalId, ResourceRef)> {
        self.iter()
            .flat_map(|resource| {
                let from = resource.id().clone();
                resource
                    .references()
                    .into_iter()
                    .map(move |target| (from.clone(), target))
            })
            .collect()
    }

    /// Entities that refer to `id`
    pub fn dependents_of(&self, id: &str) -> Vec<&Resource> {
        self.iter()
            .filter(|resource| {
                resource
                    .references()
                    .iter()
                    .any(|target| target.id.as_str() == id)
            })
            .collect()
    }

    /// Dependency waves, referenced entities first
    pub fn provisioning_order(&self) -> TopologyResult<ProvisioningSequence> {
        ProvisioningSequence::from_graph(self)
    }

    /// Ids in the order the provisioning engine should delete them
    pub fn teardown_order(&self) -> TopologyResult<Vec<LogicalId>> {
        Ok(self.provisioning_order()?.teardown_order())
    }

    /// Deterministic content fingerprint
    ///
    /// Two graphs built from the same configuration carry the same
    /// fingerprint; any change to any entity changes it.
    pub fn fingerprint(&self) -> TopologyResult<Uuid> {
        let canonical = serde_json::to_vec(self)?;
        Ok(Uuid::new_v5(&FINGERPRINT_NAMESPACE, &canonical))
    }
}

impl<'a> IntoIterator for &'a ResourceGraph {
    type Item = &'a Resource;
    type IntoIter = std::collections::btree_map::Values<'a, LogicalId, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.values()
    }
}
