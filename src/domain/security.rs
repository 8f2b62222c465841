// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security Policy Entity
//!
//! Allow-list rules bound to a single network. There are no deny rules: what
//! is not allowed is dropped.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Ipv4Cidr, LogicalId, ResourceRef};

/// Traffic direction of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ingress,
    Egress,
}

/// Source (ingress) or destination (egress) selector
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerSelector {
    /// Any IPv4 address
    AnyIpv4,
    /// A fixed address block
    Ipv4(Ipv4Cidr),
}

impl PeerSelector {
    /// Address block this selector covers
    pub fn cidr(&self) -> Ipv4Cidr {
        match self {
            Self::AnyIpv4 => Ipv4Cidr::ANY,
            Self::Ipv4(cidr) => *cidr,
        }
    }
}

impl fmt::Display for PeerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cidr())
    }
}

/// Port/protocol selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortSelector {
    /// Every protocol, every port
    AllTraffic,
    Tcp(u16),
    TcpRange { from: u16, to: u16 },
    Udp(u16),
}

impl PortSelector {
    /// Protocol label understood by the provisioning engine ("-1" is all)
    pub fn protocol(&self) -> &'static str {
        match self {
            Self::AllTraffic => "-1",
            Self::Tcp(_) | Self::TcpRange { .. } => "tcp",
            Self::Udp(_) => "udp",
        }
    }

    /// Inclusive port range, `None` for all traffic
    pub fn port_range(&self) -> Option<(u16, u16)> {
        match self {
            Self::AllTraffic => None,
            Self::Tcp(port) | Self::Udp(port) => Some((*port, *port)),
            Self::TcpRange { from, to } => Some((*from, *to)),
        }
    }
}

/// Single allow rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowRule {
    pub peer: PeerSelector,
    pub ports: PortSelector,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

impl AllowRule {
    pub fn ingress(peer: PeerSelector, ports: PortSelector) -> Self {
        Self {
            peer,
            ports,
            direction: Direction::Ingress,
            description: None,
        }
    }

    pub fn egress(peer: PeerSelector, ports: PortSelector) -> Self {
        Self {
            peer,
            ports,
            direction: Direction::Egress,
            description: None,
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Security Policy Entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityPolicy {
    pub id: LogicalId,
    pub network: ResourceRef,
    pub description: String,
    /// Implicit egress rule to anywhere
    pub allow_all_outbound: bool,
    /// Ordered allow rules
    pub rules: Vec<AllowRule>,
}

impl SecurityPolicy {
    pub fn new(id: LogicalId, network: ResourceRef, description: impl Into<String>) -> Self {
        Self {
            id,
            network,
            description: description.into(),
            allow_all_outbound: true,
            rules: Vec::new(),
        }
    }

    pub fn allow_all_outbound(mut self, enabled: bool) -> Self {
        self.allow_all_outbound = enabled;
        self
    }

    pub fn rule(mut self, rule: AllowRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Rules in one direction, in declaration order
    pub fn rules_for(&self, direction: Direction) -> impl Iterator<Item = &AllowRule> {
        self.rules.iter().filter(move |r| r.direction == direction)
    }

    /// Effective egress rules, including the implicit allow-all
    pub fn effective_egress(&self) -> Vec<AllowRule> {
        let mut rules: Vec<AllowRule> = self.rules_for(Direction::Egress).cloned().collect();
        if self.allow_all_outbound {
            rules.push(AllowRule::egress(PeerSelector::AnyIpv4, PortSelector::AllTraffic));
        }
        rules
    }

    /// Check that every ingress source lies within `block`
    pub fn ingress_scoped_to(&self, block: &Ipv4Cidr) -> bool {
        self.rules_for(Direction::Ingress)
            .all(|rule| block.contains(&rule.peer.cidr()))
    }

    pub fn references(&self) -> Vec<ResourceRef> {
        vec![self.network.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    fn block() -> Ipv4Cidr {
        "10.10.0.0/24".parse().unwrap()
    }

    #[test]
    fn test_network_scoped_policy() {
        let policy = SecurityPolicy::new(
            id("MonitoringSg"),
            ResourceRef::network(id("MonitoringVpc")),
            "monitoring",
        )
        .rule(AllowRule::ingress(PeerSelector::Ipv4(block()), PortSelector::AllTraffic));

        assert!(policy.ingress_scoped_to(&block()));
        assert_eq!(policy.effective_egress().len(), 1);
        assert_eq!(policy.effective_egress()[0].peer.cidr().to_string(), "0.0.0.0/0");
    }

    #[test]
    fn test_broad_ingress_is_not_scoped() {
        let policy = SecurityPolicy::new(
            id("OpenSg"),
            ResourceRef::network(id("MonitoringVpc")),
            "open",
        )
        .allow_all_outbound(false)
        .rule(AllowRule::ingress(PeerSelector::AnyIpv4, PortSelector::Tcp(22)));

        assert!(!policy.ingress_scoped_to(&block()));
        assert!(policy.effective_egress().is_empty());
    }

    #[test]
    fn test_port_selectors() {
        assert_eq!(PortSelector::AllTraffic.protocol(), "-1");
        assert_eq!(PortSelector::AllTraffic.port_range(), None);
        assert_eq!(PortSelector::Tcp(22).port_range(), Some((22, 22)));
        assert_eq!(
            PortSelector::TcpRange { from: 1024, to: 2048 }.port_range(),
            Some((1024, 2048))
        );
        assert_eq!(PortSelector::Udp(6081).protocol(), "udp");
    }
}
