// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declared Resource Variants
//!
//! The set of resource kinds is closed, so a topology holds its entities as
//! one tagged enum. Every variant shares the same capability: it has a
//! logical id, a kind, and a list of references to its siblings.

use serde::{Deserialize, Serialize};

use super::{
    ComputeNode, EndpointService, IdentityRole, InterfaceEndpoint, Listener, LoadBalancer,
    LogicalId, Network, ResourceKind, ResourceRef, SecurityPolicy, TargetGroup,
};

/// Capability shared by every declared entity
pub trait Declared {
    fn logical_id(&self) -> &LogicalId;
    fn kind(&self) -> ResourceKind;
    fn references(&self) -> Vec<ResourceRef>;

    /// Reference pointing at this entity
    fn reference(&self) -> ResourceRef {
        ResourceRef::new(self.kind(), self.logical_id().clone())
    }
}

macro_rules! declared {
    ($entity:ty, $kind:expr) => {
        impl Declared for $entity {
            fn logical_id(&self) -> &LogicalId {
                &self.id
            }

            fn kind(&self) -> ResourceKind {
                $kind
            }

            fn references(&self) -> Vec<ResourceRef> {
                <$entity>::references(self)
            }
        }
    };
}

impl Network {
    pub fn references(&self) -> Vec<ResourceRef> {
        Vec::new()
    }
}

declared!(Network, ResourceKind::Network);
declared!(SecurityPolicy, ResourceKind::SecurityPolicy);
declared!(ComputeNode, ResourceKind::ComputeNode);
declared!(LoadBalancer, ResourceKind::LoadBalancer);
declared!(TargetGroup, ResourceKind::TargetGroup);
declared!(Listener, ResourceKind::Listener);
declared!(EndpointService, ResourceKind::EndpointService);
declared!(InterfaceEndpoint, ResourceKind::InterfaceEndpoint);
declared!(IdentityRole, ResourceKind::IdentityRole);

/// A declared entity of any kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    Network(Network),
    SecurityPolicy(SecurityPolicy),
    ComputeNode(ComputeNode),
    LoadBalancer(LoadBalancer),
    TargetGroup(TargetGroup),
    Listener(Listener),
    EndpointService(EndpointService),
    InterfaceEndpoint(InterfaceEndpoint),
    IdentityRole(IdentityRole),
}

impl Resource {
    fn inner(&self) -> &dyn Declared {
        match self {
            Self::Network(r) => r,
            Self::SecurityPolicy(r) => r,
            Self::ComputeNode(r) => r,
            Self::LoadBalancer(r) => r,
            Self::TargetGroup(r) => r,
            Self::Listener(r) => r,
            Self::EndpointService(r) => r,
            Self::InterfaceEndpoint(r) => r,
            Self::IdentityRole(r) => r,
        }
    }

    pub fn id(&self) -> &LogicalId {
        self.inner().logical_id()
    }

    pub fn kind(&self) -> ResourceKind {
        self.inner().kind()
    }

    /// Every sibling this entity points at
    pub fn references(&self) -> Vec<ResourceRef> {
        self.inner().references()
    }

    /// Reference pointing at this entity
    pub fn to_ref(&self) -> ResourceRef {
        self.inner().reference()
    }

    pub fn as_network(&self) -> Option<&Network> {
        match self {
            Self::Network(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_security_policy(&self) -> Option<&SecurityPolicy> {
        match self {
            Self::SecurityPolicy(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_compute_node(&self) -> Option<&ComputeNode> {
        match self {
            Self::ComputeNode(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_load_balancer(&self) -> Option<&LoadBalancer> {
        match self {
            Self::LoadBalancer(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_target_group(&self) -> Option<&TargetGroup> {
        match self {
            Self::TargetGroup(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            Self::Listener(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_endpoint_service(&self) -> Option<&EndpointService> {
        match self {
            Self::EndpointService(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_interface_endpoint(&self) -> Option<&InterfaceEndpoint> {
        match self {
            Self::InterfaceEndpoint(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_identity_role(&self) -> Option<&IdentityRole> {
        match self {
            Self::IdentityRole(r) => Some(r),
            _ => None,
        }
    }
}

macro_rules! into_resource {
    ($entity:ident) => {
        impl From<$entity> for Resource {
            fn from(entity: $entity) -> Self {
                Resource::$entity(entity)
            }
        }
    };
}

into_resource!(Network);
into_resource!(SecurityPolicy);
into_resource!(ComputeNode);
into_resource!(LoadBalancer);
into_resource!(TargetGroup);
into_resource!(Listener);
into_resource!(EndpointService);
into_resource!(InterfaceEndpoint);
into_resource!(IdentityRole);
