//! Declarative traffic-mirroring topology
//!
//! This crate declares two virtual networks joined by a gateway load balancer,
//! so traffic leaving a "consumer" network can be mirrored into a
//! "monitoring" network. It never talks to a cloud API: [`build`] turns a
//! [`TopologyConfig`] into a validated [`ResourceGraph`], and the graph can be
//! ordered for provisioning, fingerprinted, or rendered into a template for
//! an external provisioning engine.
//!
//! ```rust
//! use cim_mirror_topology::{build, synthesize, TopologyConfig};
//!
//! let graph = build(&TopologyConfig::default()).unwrap();
//! let template = synthesize(&graph).unwrap();
//! assert_eq!(
//!     template["Resources"]["GatewayLoadBalancer"]["Type"],
//!     "AWS::ElasticLoadBalancingV2::LoadBalancer"
//! );
//! ```

pub mod config;
pub mod declaration;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod projection;

// Re-export commonly used types
pub use config::TopologyConfig;
pub use declaration::build;
pub use errors::{TopologyError, TopologyResult};
pub use graph::{DeploymentContext, GraphBuilder, ProvisioningSequence, ResourceGraph};
pub use projection::{synthesize, synthesize_pretty};
