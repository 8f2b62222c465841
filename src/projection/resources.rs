// Copyright (c) 2025 - Cowboy AI, Inc.
//! Entity renderers for everything but networks

use serde_json::{json, Value};

use super::{availability_zone, reference, template_resource, TemplateEntry};
use crate::domain::{
    AllowRule, ComputeNode, EndpointService, IdentityRole, InterfaceEndpoint, Listener,
    ListenerAction, LoadBalancer, LogicalId, Resource, ResourceKind, ResourceRef, SecurityPolicy,
    Subnet, SubnetSelector, TargetGroup, ValidationError,
};
use crate::errors::{TopologyError, TopologyResult};
use crate::graph::ResourceGraph;

/// Concrete subnets an entity's selector resolves to
fn selected_subnets<'g>(
    graph: &'g ResourceGraph,
    from: &LogicalId,
    network: &ResourceRef,
    selector: &SubnetSelector,
) -> TopologyResult<Vec<&'g Subnet>> {
    let resolved = graph
        .network(network)
        .ok_or_else(|| TopologyError::UnresolvedReference {
            from: from.clone(),
            target: network.clone(),
        })?;

    let subnets = resolved.select(selector);
    if subnets.is_empty() {
        return Err(ValidationError::EmptySubnetSelection {
            entity: from.to_string(),
            selector: selector.to_string(),
            network: resolved.id.to_string(),
        }
        .into());
    }

    Ok(subnets)
}

fn subnet_refs(subnets: &[&Subnet]) -> Value {
    subnets.iter().map(|s| reference(&s.id)).collect()
}

fn rule(rule: &AllowRule) -> Value {
    let mut body = json!({
        "CidrIp": rule.peer.cidr().to_string(),
        "IpProtocol": rule.ports.protocol(),
    });
    if let Some((from, to)) = rule.ports.port_range() {
        body["FromPort"] = json!(from);
        body["ToPort"] = json!(to);
    }
    if let Some(description) = &rule.description {
        body["Description"] = json!(description);
    }
    body
}

pub(super) fn security_policy(policy: &SecurityPolicy) -> TemplateEntry {
    let description = if policy.description.is_empty() {
        policy.id.as_str()
    } else {
        policy.description.as_str()
    };

    let ingress: Vec<Value> = policy
        .rules_for(crate::domain::Direction::Ingress)
        .map(rule)
        .collect();
    let egress: Vec<Value> = policy.effective_egress().iter().map(rule).collect();

    (
        policy.id.clone(),
        template_resource(
            ResourceKind::SecurityPolicy,
            json!({
                "GroupDescription": description,
                "VpcId": reference(&policy.network.id),
                "SecurityGroupIngress": ingress,
                "SecurityGroupEgress": egress,
            }),
        ),
    )
}

pub(super) fn compute_node(graph: &ResourceGraph, node: &ComputeNode) -> TopologyResult<TemplateEntry> {
    let subnet = selected_subnets(graph, &node.id, &node.network, &node.subnet)?[0];

    let role = graph
        .resolve(&node.role)
        .and_then(Resource::as_identity_role)
        .ok_or_else(|| TopologyError::UnresolvedReference {
            from: node.id.clone(),
            target: node.role.clone(),
        })?;

    let block_devices: Vec<Value> = node
        .block_devices
        .iter()
        .map(|device| {
            json!({
                "DeviceName": device.device_name,
                "Ebs": {
                    "VolumeSize": device.size_gib,
                    "VolumeType": device.volume_type.as_str(),
                },
            })
        })
        .collect();

    let mut properties = json!({
        "ImageId": node.image.image_id(),
        "InstanceType": node.instance_class.as_str(),
        "AvailabilityZone": availability_zone(subnet.zone),
        "SubnetId": reference(&subnet.id),
        "IamInstanceProfile": reference(&role.instance_profile_id()?),
        "BlockDeviceMappings": block_devices,
        "SourceDestCheck": node.source_dest_check,
        "PropagateTagsToVolumeOnCreation": node.propagate_tags_to_volumes,
        "Tags": [{ "Key": "Name", "Value": node.id.as_str() }],
    });
    if let Some(policy) = &node.security_policy {
        properties["SecurityGroupIds"] = json!([{ "Fn::GetAtt": [policy.id.as_str(), "GroupId"] }]);
    }

    Ok((node.id.clone(), template_resource(ResourceKind::ComputeNode, properties)))
}

pub(super) fn load_balancer(graph: &ResourceGraph, lb: &LoadBalancer) -> TopologyResult<TemplateEntry> {
    let subnets = selected_subnets(graph, &lb.id, &lb.network, &lb.subnets)?;

    Ok((
        lb.id.clone(),
        template_resource(
            ResourceKind::LoadBalancer,
            json!({
                "Type": lb.lb_type.as_str(),
                "IpAddressType": lb.address_family.as_str(),
                "Subnets": subnet_refs(&subnets),
            }),
        ),
    ))
}

pub(super) fn target_group(group: &TargetGroup) -> TemplateEntry {
    let targets: Vec<Value> = group
        .targets
        .iter()
        .map(|target| json!({ "Id": reference(&target.id) }))
        .collect();

    (
        group.id.clone(),
        template_resource(
            ResourceKind::TargetGroup,
            json!({
                "HealthCheckPort": group.health_check.port.to_string(),
                "HealthCheckProtocol": group.health_check.protocol.as_str(),
                "Port": group.port,
                "Protocol": group.protocol.as_str(),
                "TargetType": group.target_type.as_str(),
                "Targets": targets,
                "VpcId": reference(&group.network.id),
            }),
        ),
    )
}

pub(super) fn listener(listener: &Listener) -> TemplateEntry {
    let action = match &listener.default_action {
        ListenerAction::Forward { target_group } => json!({
            "Type": "forward",
            "TargetGroupArn": reference(&target_group.id),
        }),
    };

    (
        listener.id.clone(),
        template_resource(
            ResourceKind::Listener,
            json!({
                "DefaultActions": [action],
                "LoadBalancerArn": reference(&listener.load_balancer.id),
            }),
        ),
    )
}

pub(super) fn endpoint_service(service: &EndpointService) -> TemplateEntry {
    (
        service.id.clone(),
        template_resource(
            ResourceKind::EndpointService,
            json!({
                "AcceptanceRequired": service.acceptance_required,
                "GatewayLoadBalancerArns": [reference(&service.load_balancer.id)],
            }),
        ),
    )
}

pub(super) fn interface_endpoint(
    graph: &ResourceGraph,
    endpoint: &InterfaceEndpoint,
) -> TopologyResult<TemplateEntry> {
    let subnets = selected_subnets(graph, &endpoint.id, &endpoint.network, &endpoint.subnets)?;

    Ok((
        endpoint.id.clone(),
        template_resource(
            ResourceKind::InterfaceEndpoint,
            json!({
                "VpcEndpointType": endpoint.endpoint_type.as_str(),
                "VpcId": reference(&endpoint.network.id),
                "SubnetIds": subnet_refs(&subnets),
                "ServiceName": {
                    "Fn::Join": ["", [
                        "com.amazonaws.vpce.",
                        { "Ref": "AWS::Region" },
                        ".",
                        reference(&endpoint.service.id),
                    ]],
                },
            }),
        ),
    ))
}

/// Role plus the instance profile compute nodes attach it through
pub(super) fn identity_role(role: &IdentityRole) -> TopologyResult<Vec<TemplateEntry>> {
    let policies: Vec<Value> = role
        .managed_policies
        .iter()
        .map(|name| {
            json!({
                "Fn::Join": ["", [
                    "arn:",
                    { "Ref": "AWS::Partition" },
                    ":iam::aws:policy/",
                    name,
                ]],
            })
        })
        .collect();

    Ok(vec![
        (
            role.id.clone(),
            template_resource(
                ResourceKind::IdentityRole,
                json!({
                    "AssumeRolePolicyDocument": {
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Action": "sts:AssumeRole",
                            "Effect": "Allow",
                            "Principal": { "Service": role.trust_principal },
                        }],
                    },
                    "ManagedPolicyArns": policies,
                }),
            ),
        ),
        (
            role.instance_profile_id()?,
            template_resource(
                ResourceKind::InstanceProfile,
                json!({ "Roles": [reference(&role.id)] }),
            ),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PeerSelector, PortSelector};

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    #[test]
    fn test_rule_rendering() {
        let all = rule(&AllowRule::ingress(
            PeerSelector::Ipv4("10.10.0.0/24".parse().unwrap()),
            PortSelector::AllTraffic,
        ));
        assert_eq!(all, json!({ "CidrIp": "10.10.0.0/24", "IpProtocol": "-1" }));

        let ssh = rule(
            &AllowRule::ingress(PeerSelector::AnyIpv4, PortSelector::Tcp(22)).described("ssh"),
        );
        assert_eq!(
            ssh,
            json!({
                "CidrIp": "0.0.0.0/0",
                "IpProtocol": "tcp",
                "FromPort": 22,
                "ToPort": 22,
                "Description": "ssh",
            })
        );
    }

    #[test]
    fn test_empty_description_falls_back_to_id() {
        let policy = SecurityPolicy::new(id("Sg"), ResourceRef::network(id("Vpc")), "");
        let (_, body) = security_policy(&policy);

        assert_eq!(body["Properties"]["GroupDescription"], "Sg");
        assert_eq!(body["Properties"]["SecurityGroupEgress"][0]["IpProtocol"], "-1");
    }

    #[test]
    fn test_role_renders_instance_profile() {
        let role = IdentityRole::new(id("Role"), "ec2.amazonaws.com").managed_policy("ReadOnly");
        let entries = identity_role(&role).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].0.as_str(), "RoleInstanceProfile");
        assert_eq!(entries[1].1["Properties"]["Roles"], json!([{ "Ref": "Role" }]));
        assert_eq!(
            entries[0].1["Properties"]["ManagedPolicyArns"][0]["Fn::Join"][1][3],
            "ReadOnly"
        );
    }
}
