//! Plan creation for a service-account-to-role binding

use log::debug;
use serde::Serialize;

use crate::error::{IrsaError, IrsaResult};
use crate::permissions::PermissionsPolicy;
use crate::synthesis::{build_trust_policy, TrustPolicyParams};
use crate::types::TrustPolicyDocument;
use crate::validation::validate_iam_name;

const MAX_ROLE_NAME_LEN: usize = 64;
const MAX_POLICY_NAME_LEN: usize = 128;
const MANAGED_POLICY_PREFIX: &str = "arn:aws:iam::";

/// What the caller wants bound.
#[derive(Debug, Clone)]
pub struct BindingRequest {
    pub role_name: String,
    pub trust: TrustPolicyParams,
    pub permissions: Option<PermissionsPolicy>,
    /// Inline policy name; derived from the role name when absent.
    pub policy_name: Option<String>,
    pub managed_policy_arns: Vec<String>,
}

/// Inline permissions policy to put on the role.
#[derive(Debug, Clone)]
pub struct InlinePolicy {
    pub name: String,
    pub document: PermissionsPolicy,
}

/// Validated binding, ready to apply.
#[derive(Debug, Clone)]
pub struct BindingPlan {
    pub role_name: String,
    pub account_id: String,
    pub trust_policy: TrustPolicyDocument,
    pub inline_policy: Option<InlinePolicy>,
    pub managed_policy_arns: Vec<String>,
}

/// Printable summary of a plan.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlanSummary<'a> {
    pub role_name: &'a str,
    pub trust_policy: &'a TrustPolicyDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_policy_name: Option<&'a str>,
    #[serde(skip_serializing_if = "no_arns")]
    pub managed_policy_arns: &'a [String],
}

fn no_arns(arns: &&[String]) -> bool {
    arns.is_empty()
}

impl BindingPlan {
    pub fn summary(&self) -> PlanSummary<'_> {
        PlanSummary {
            role_name: &self.role_name,
            trust_policy: &self.trust_policy,
            inline_policy_name: self.inline_policy.as_ref().map(|p| p.name.as_str()),
            managed_policy_arns: &self.managed_policy_arns,
        }
    }
}

/// `RoleForX` becomes `PolicyForX`; other names get a `-permissions` suffix.
pub fn default_policy_name(role_name: &str) -> String {
    match role_name.strip_prefix("RoleFor") {
        Some(rest) if !rest.is_empty() => format!("PolicyFor{rest}"),
        _ => format!("{role_name}-permissions"),
    }
}

/// Validate a binding request and synthesize its trust policy.
pub fn plan_binding(request: &BindingRequest) -> IrsaResult<BindingPlan> {
    validate_iam_name("role name", &request.role_name, MAX_ROLE_NAME_LEN)?;

    let trust_policy = build_trust_policy(&request.trust)?;

    let inline_policy = match &request.permissions {
        Some(document) => {
            let name = request
                .policy_name
                .clone()
                .unwrap_or_else(|| default_policy_name(&request.role_name));
            validate_iam_name("policy name", &name, MAX_POLICY_NAME_LEN)?;
            Some(InlinePolicy {
                name,
                document: document.clone(),
            })
        }
        None if request.policy_name.is_some() => {
            return Err(IrsaError::invalid_input(
                "policy name",
                "given without a permissions policy",
            ));
        }
        None => None,
    };

    let mut managed_policy_arns = Vec::new();
    for arn in &request.managed_policy_arns {
        if !arn.starts_with(MANAGED_POLICY_PREFIX) || !arn.contains(":policy/") {
            return Err(IrsaError::invalid_input(
                "managed policy",
                format!("'{arn}' is not an IAM policy ARN"),
            ));
        }
        if !managed_policy_arns.contains(arn) {
            managed_policy_arns.push(arn.clone());
        }
    }

    debug!(
        "Planned binding of role '{}' to {}",
        request.role_name,
        request.trust.service_account.subject()
    );

    Ok(BindingPlan {
        role_name: request.role_name.clone(),
        account_id: request.trust.account_id.clone(),
        trust_policy,
        inline_policy,
        managed_policy_arns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceAccountRef;

    fn request() -> BindingRequest {
        BindingRequest {
            role_name: "RoleForAlbController".to_string(),
            trust: TrustPolicyParams {
                account_id: "123456789012".to_string(),
                region: "ap-southeast-2".to_string(),
                oidc_provider_id: "990D1EA5775D99A9C61E4BFC50C78A8B".to_string(),
                service_account: ServiceAccountRef::new("kube-system", "aws-load-balancer-controller"),
            },
            permissions: Some(
                PermissionsPolicy::from_json_str(r#"{"Version":"2012-10-17","Statement":[]}"#)
                    .unwrap(),
            ),
            policy_name: None,
            managed_policy_arns: vec![],
        }
    }

    #[test]
    fn test_default_policy_name() {
        assert_eq!(default_policy_name("RoleForAlbController"), "PolicyForAlbController");
        assert_eq!(default_policy_name("alb-controller"), "alb-controller-permissions");
        assert_eq!(default_policy_name("RoleFor"), "RoleFor-permissions");
    }

    #[test]
    fn test_plan_binding() {
        let plan = plan_binding(&request()).unwrap();
        assert_eq!(plan.role_name, "RoleForAlbController");
        assert_eq!(plan.account_id, "123456789012");
        assert_eq!(plan.inline_policy.unwrap().name, "PolicyForAlbController");
        assert_eq!(
            plan.trust_policy.issuer_host(),
            Some("oidc.eks.ap-southeast-2.amazonaws.com/id/990D1EA5775D99A9C61E4BFC50C78A8B")
        );
    }

    #[test]
    fn test_plan_rejects_bad_role_name() {
        let mut req = request();
        req.role_name = "role with spaces".to_string();
        assert!(matches!(
            plan_binding(&req),
            Err(IrsaError::InvalidInput { field: "role name", .. })
        ));
    }

    #[test]
    fn test_plan_propagates_trust_errors() {
        let mut req = request();
        req.trust.account_id = "abc".to_string();
        assert!(matches!(plan_binding(&req), Err(IrsaError::InvalidAccountId(_))));
    }

    #[test]
    fn test_policy_name_requires_permissions() {
        let mut req = request();
        req.permissions = None;
        req.policy_name = Some("Orphan".to_string());
        assert!(matches!(
            plan_binding(&req),
            Err(IrsaError::InvalidInput { field: "policy name", .. })
        ));
    }

    #[test]
    fn test_managed_policies_validated_and_deduplicated() {
        let mut req = request();
        let arn = "arn:aws:iam::aws:policy/AmazonEKSClusterPolicy".to_string();
        req.managed_policy_arns = vec![arn.clone(), arn.clone()];
        assert_eq!(plan_binding(&req).unwrap().managed_policy_arns, vec![arn]);

        req.managed_policy_arns = vec!["AmazonEKSClusterPolicy".to_string()];
        assert!(matches!(
            plan_binding(&req),
            Err(IrsaError::InvalidInput { field: "managed policy", .. })
        ));
    }

    #[test]
    fn test_summary_json() {
        let plan = plan_binding(&request()).unwrap();
        let json = serde_json::to_value(plan.summary()).unwrap();
        assert_eq!(json["RoleName"], "RoleForAlbController");
        assert_eq!(json["InlinePolicyName"], "PolicyForAlbController");
        assert_eq!(json["TrustPolicy"]["Version"], "2012-10-17");
        assert!(json.get("ManagedPolicyArns").is_none());
    }
}
