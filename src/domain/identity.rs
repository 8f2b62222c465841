// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity Role Entity

use serde::{Deserialize, Serialize};

use super::{LogicalId, LogicalIdError, ResourceRef};

/// Appended to a role id to name its instance profile
pub const INSTANCE_PROFILE_SUFFIX: &str = "InstanceProfile";

/// Role assumed by compute nodes through their instance profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRole {
    pub id: LogicalId,
    /// Service principal trusted to assume the role ("ec2.amazonaws.com")
    pub trust_principal: String,
    /// Provider-managed permission policies by name
    pub managed_policies: Vec<String>,
}

impl IdentityRole {
    pub fn new(id: LogicalId, trust_principal: impl Into<String>) -> Self {
        Self {
            id,
            trust_principal: trust_principal.into(),
            managed_policies: Vec::new(),
        }
    }

    /// Attach a managed policy; attaching twice is a no-op
    pub fn managed_policy(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.managed_policies.contains(&name) {
            self.managed_policies.push(name);
        }
        self
    }

    /// Logical id of the instance profile that carries this role
    pub fn instance_profile_id(&self) -> Result<LogicalId, LogicalIdError> {
        self.id.child(INSTANCE_PROFILE_SUFFIX)
    }

    pub fn references(&self) -> Vec<ResourceRef> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_attachment_is_idempotent() {
        let role = IdentityRole::new(LogicalId::new("SsmIamRole").unwrap(), "ec2.amazonaws.com")
            .managed_policy("AmazonSSMManagedInstanceCore")
            .managed_policy("AmazonSSMManagedInstanceCore");

        assert_eq!(role.managed_policies.len(), 1);
        assert_eq!(role.instance_profile_id().unwrap().as_str(), "SsmIamRoleInstanceProfile");
        assert!(role.references().is_empty());
    }
}
