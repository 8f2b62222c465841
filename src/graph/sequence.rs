// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Order
//!
//! The provisioning engine must realize every referenced entity before the
//! entities that refer to it. This module derives that order from the
//! reference graph as a sequence of waves: every entity in wave N only
//! refers to entities in waves 0..N, so a wave can be realized concurrently.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use super::ResourceGraph;
use crate::domain::LogicalId;
use crate::errors::{TopologyError, TopologyResult};

/// Entities that can be realized together
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProvisioningWave {
    ids: Vec<LogicalId>,
}

impl ProvisioningWave {
    /// Logical ids in this wave, sorted
    pub fn ids(&self) -> &[LogicalId] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|candidate| candidate.as_str() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Ordered waves covering every entity of a graph exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningSequence {
    waves: Vec<ProvisioningWave>,
    total: usize,
}

impl ProvisioningSequence {
    /// Compute the sequence for a resource graph
    pub fn from_graph(graph: &ResourceGraph) -> TopologyResult<Self> {
        let dependencies = graph
            .iter()
            .map(|resource| {
                let targets = resource.references().into_iter().map(|r| r.id).collect();
                (resource.id().clone(), targets)
            })
            .collect();

        Self::from_dependencies(&dependencies)
    }

    /// Kahn's algorithm over an id -> dependencies map
    ///
    /// Dependencies that are not keys of the map are treated as already
    /// realized. When a round places nothing, the remaining ids form or hang
    /// off a cycle and are reported.
    pub(crate) fn from_dependencies(
        dependencies: &BTreeMap<LogicalId, BTreeSet<LogicalId>>,
    ) -> TopologyResult<Self> {
        let total = dependencies.len();
        let mut placed: BTreeSet<&LogicalId> = BTreeSet::new();
        let mut waves = Vec::new();

        while placed.len() < total {
            let ids: Vec<LogicalId> = dependencies
                .iter()
                .filter(|(id, _)| !placed.contains(id))
                .filter(|(_, deps)| {
                    deps.iter()
                        .filter(|dep| dependencies.contains_key(*dep))
                        .all(|dep| placed.contains(dep))
                })
                .map(|(id, _)| id.clone())
                .collect();

            if ids.is_empty() {
                let stuck: Vec<LogicalId> = dependencies
                    .keys()
                    .filter(|id| !placed.contains(id))
                    .cloned()
                    .collect();
                return Err(TopologyError::DependencyCycle(stuck));
            }

            debug!(wave = waves.len(), entities = ids.len(), "Computed provisioning wave");

            for id in &ids {
                if let Some((key, _)) = dependencies.get_key_value(id) {
                    placed.insert(key);
                }
            }
            waves.push(ProvisioningWave { ids });
        }

        info!(waves = waves.len(), entities = total, "Computed provisioning order");

        Ok(Self { waves, total })
    }

    pub fn waves(&self) -> &[ProvisioningWave] {
        &self.waves
    }

    pub fn num_waves(&self) -> usize {
        self.waves.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Zero-based wave an entity is realized in
    pub fn wave_of(&self, id: &str) -> Option<usize> {
        self.waves.iter().position(|wave| wave.contains(id))
    }

    /// All ids in provisioning order (flattened)
    pub fn in_order(&self) -> Vec<LogicalId> {
        self.waves
            .iter()
            .flat_map(|wave| wave.ids.iter().cloned())
            .collect()
    }

    /// All ids in reverse order, referrers before what they refer to
    pub fn teardown_order(&self) -> Vec<LogicalId> {
        self.waves
            .iter()
            .rev()
            .flat_map(|wave| wave.ids.iter().cloned())
            .collect()
    }
}
