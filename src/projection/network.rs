// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network expansion
//!
//! A declared network renders as the VPC itself plus everything carved from
//! it: one subnet, route table and association per allocated subnet, an
//! internet gateway when any partition is public, and one elastic address
//! and NAT gateway per outbound gateway. Default routes follow the routing
//! class of each subnet.

use serde_json::json;

use super::{
    availability_zone, get_att, name_tag, reference, template_resource, template_resource_after,
    TemplateEntry,
};
use crate::domain::{LogicalId, Network, ResourceKind, RoutingClass, Subnet, SubnetSelector};
use crate::errors::TopologyResult;

const DEFAULT_ROUTE: &str = "0.0.0.0/0";

/// Logical ids of the internet gateway pair of a network
struct InternetGatewayIds {
    gateway: LogicalId,
    attachment: LogicalId,
}

pub(super) fn project(network: &Network) -> TopologyResult<Vec<TemplateEntry>> {
    let mut entries = vec![(
        network.id.clone(),
        template_resource(
            ResourceKind::Network,
            json!({
                "CidrBlock": network.cidr.to_string(),
                "EnableDnsHostnames": network.enable_dns_hostnames,
                "EnableDnsSupport": network.enable_dns_support,
                "InstanceTenancy": "default",
                "Tags": name_tag(&network.id),
            }),
        ),
    )];

    let igw = if network.has_public_partition() {
        let ids = InternetGatewayIds {
            gateway: network.id.child("IGW")?,
            attachment: network.id.child("VPCGW")?,
        };
        entries.push((
            ids.gateway.clone(),
            template_resource(
                ResourceKind::InternetGateway,
                json!({ "Tags": name_tag(&network.id) }),
            ),
        ));
        entries.push((
            ids.attachment.clone(),
            template_resource(
                ResourceKind::GatewayAttachment,
                json!({
                    "VpcId": reference(&network.id),
                    "InternetGatewayId": reference(&ids.gateway),
                }),
            ),
        ));
        Some(ids)
    } else {
        None
    };

    for subnet in &network.subnets {
        entries.extend(subnet_entries(network, subnet)?);
    }

    // Outbound gateways live in the public subnets of the first zones
    let mut nat_gateways = Vec::with_capacity(usize::from(network.outbound_gateways));
    for zone in 0..network.outbound_gateways {
        let selector = SubnetSelector::routing(RoutingClass::Public).in_zone(zone);
        if let Some(public) = network.select(&selector).first() {
            let eip = public.id.child("EIP")?;
            let nat = public.id.child("NATGateway")?;
            let route = public.id.child("DefaultRoute")?;

            entries.push((
                eip.clone(),
                template_resource(ResourceKind::ElasticIp, json!({ "Domain": "vpc" })),
            ));
            entries.push((
                nat.clone(),
                template_resource_after(
                    ResourceKind::NatGateway,
                    json!({
                        "SubnetId": reference(&public.id),
                        "AllocationId": get_att(&eip, "AllocationId"),
                        "Tags": name_tag(&public.id),
                    }),
                    &[&route],
                ),
            ));
            nat_gateways.push(nat);
        }
    }

    for subnet in &network.subnets {
        let table = subnet.id.child("RouteTable")?;
        let route = subnet.id.child("DefaultRoute")?;

        match subnet.routing {
            RoutingClass::Public => {
                if let Some(igw) = &igw {
                    entries.push((
                        route,
                        template_resource_after(
                            ResourceKind::Route,
                            json!({
                                "RouteTableId": reference(&table),
                                "DestinationCidrBlock": DEFAULT_ROUTE,
                                "GatewayId": reference(&igw.gateway),
                            }),
                            &[&igw.attachment],
                        ),
                    ));
                }
            }
            RoutingClass::PrivateRouted => {
                if !nat_gateways.is_empty() {
                    let nat = &nat_gateways[usize::from(subnet.zone) % nat_gateways.len()];
                    entries.push((
                        route,
                        template_resource(
                            ResourceKind::Route,
                            json!({
                                "RouteTableId": reference(&table),
                                "DestinationCidrBlock": DEFAULT_ROUTE,
                                "NatGatewayId": reference(nat),
                            }),
                        ),
                    ));
                }
            }
            RoutingClass::Isolated => {}
        }
    }

    Ok(entries)
}

/// Subnet, its route table and the association between them
fn subnet_entries(network: &Network, subnet: &Subnet) -> TopologyResult<Vec<TemplateEntry>> {
    let table = subnet.id.child("RouteTable")?;
    let association = subnet.id.child("RouteTableAssociation")?;

    Ok(vec![
        (
            subnet.id.clone(),
            template_resource(
                ResourceKind::Subnet,
                json!({
                    "VpcId": reference(&network.id),
                    "CidrBlock": subnet.cidr.to_string(),
                    "AvailabilityZone": availability_zone(subnet.zone),
                    "MapPublicIpOnLaunch": subnet.routing == RoutingClass::Public,
                    "Tags": [
                        { "Key": "Name", "Value": subnet.id.as_str() },
                        { "Key": "SubnetRole", "Value": subnet.role.as_str() },
                        { "Key": "SubnetRouting", "Value": subnet.routing.as_str() },
                    ],
                }),
            ),
        ),
        (
            table.clone(),
            template_resource(
                ResourceKind::RouteTable,
                json!({
                    "VpcId": reference(&network.id),
                    "Tags": name_tag(&subnet.id),
                }),
            ),
        ),
        (
            association,
            template_resource(
                ResourceKind::SubnetRouteTableAssociation,
                json!({
                    "RouteTableId": reference(&table),
                    "SubnetId": reference(&subnet.id),
                }),
            ),
        ),
    ])
}
