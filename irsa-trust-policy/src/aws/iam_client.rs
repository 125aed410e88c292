//! AWS IAM client wrapper for role provisioning
//!

use async_trait::async_trait;
use aws_sdk_iam::Client as IamClient;
use log::warn;

use crate::aws::{AwsError, AwsResult};
use crate::permissions::PermissionsPolicy;
use crate::types::TrustPolicyDocument;

/// A role as IAM currently has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRole {
    pub arn: String,
    /// `None` when IAM's document does not fit the single-statement IRSA shape.
    pub trust_policy: Option<TrustPolicyDocument>,
}

/// Operations the binding workflow needs from IAM.
#[async_trait]
pub trait RoleProvisioner: Send + Sync {
    async fn get_role(&self, role_name: &str) -> AwsResult<Option<ExistingRole>>;

    /// Returns the new role's ARN.
    async fn create_role(&self, role_name: &str, trust: &TrustPolicyDocument)
        -> AwsResult<String>;

    async fn update_trust_policy(
        &self,
        role_name: &str,
        trust: &TrustPolicyDocument,
    ) -> AwsResult<()>;

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        permissions: &PermissionsPolicy,
    ) -> AwsResult<()>;

    async fn attach_managed_policy(&self, role_name: &str, policy_arn: &str) -> AwsResult<()>;
}

pub struct AwsIamClient {
    client: IamClient,
}

impl AwsIamClient {
    pub fn new(client: IamClient) -> Self {
        Self { client }
    }
}

fn serialize_trust(trust: &TrustPolicyDocument) -> AwsResult<String> {
    serde_json::to_string(trust)
        .map_err(|e| AwsError::PolicyError(format!("Failed to serialize trust policy: {e}")))
}

/// IAM returns policy documents URL-encoded.
pub fn decode_policy_document(encoded: &str) -> AwsResult<String> {
    percent_encoding::percent_decode_str(encoded)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| AwsError::PolicyError(format!("Failed to URL decode policy document: {e}")))
}

/// Decode the trust policy IAM holds for `role_name`.
///
/// Documents carrying anything beyond the IRSA shape (extra operators,
/// statement fields) yield `None`, so they never compare equal to a plan.
pub fn stored_trust_policy(
    role_name: &str,
    encoded: &str,
) -> AwsResult<Option<TrustPolicyDocument>> {
    let decoded = decode_policy_document(encoded)?;
    match TrustPolicyDocument::from_json(&decoded) {
        Ok(doc) => Ok(Some(doc)),
        Err(e) => {
            warn!("Trust policy of role '{role_name}' is not an IRSA policy: {e}");
            Ok(None)
        }
    }
}

#[async_trait]
impl RoleProvisioner for AwsIamClient {
    async fn get_role(&self, role_name: &str) -> AwsResult<Option<ExistingRole>> {
        let response = match self.client.get_role().role_name(role_name).send().await {
            Ok(response) => response,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_entity_exception() {
                    return Ok(None);
                }
                return Err(AwsError::IamError(format!(
                    "Failed to get role '{role_name}': {service_error:?}"
                )));
            }
        };

        let role = response
            .role()
            .ok_or_else(|| AwsError::IamError(format!("GetRole returned no role for '{role_name}'")))?;

        let trust_policy = match role.assume_role_policy_document() {
            Some(encoded) => stored_trust_policy(role_name, encoded)?,
            None => None,
        };

        Ok(Some(ExistingRole {
            arn: role.arn().to_string(),
            trust_policy,
        }))
    }

    async fn create_role(
        &self,
        role_name: &str,
        trust: &TrustPolicyDocument,
    ) -> AwsResult<String> {
        let response = self
            .client
            .create_role()
            .role_name(role_name)
            .assume_role_policy_document(serialize_trust(trust)?)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!("Failed to create role '{role_name}': {e:?}"))
            })?;

        response
            .role()
            .map(|role| role.arn().to_string())
            .ok_or_else(|| AwsError::IamError(format!("CreateRole returned no role for '{role_name}'")))
    }

    async fn update_trust_policy(
        &self,
        role_name: &str,
        trust: &TrustPolicyDocument,
    ) -> AwsResult<()> {
        self.client
            .update_assume_role_policy()
            .role_name(role_name)
            .policy_document(serialize_trust(trust)?)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to update trust policy of role '{role_name}': {e:?}"
                ))
            })?;
        Ok(())
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        permissions: &PermissionsPolicy,
    ) -> AwsResult<()> {
        self.client
            .put_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .policy_document(permissions.as_str())
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to put role policy '{policy_name}' on role '{role_name}': {e:?}"
                ))
            })?;
        Ok(())
    }

    async fn attach_managed_policy(&self, role_name: &str, policy_arn: &str) -> AwsResult<()> {
        self.client
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "Failed to attach '{policy_arn}' to role '{role_name}': {e:?}"
                ))
            })?;
        Ok(())
    }
}
