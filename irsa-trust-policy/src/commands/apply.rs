//! Apply logic for a binding plan

use log::{info, warn};
use serde::Serialize;

use crate::aws::iam_client::RoleProvisioner;
use crate::aws::sts::caller_account_id;
use crate::commands::plan::BindingPlan;
use crate::error::{IrsaError, IrsaResult};

/// Outcome of applying a [`BindingPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApplyResult {
    pub role_name: String,
    pub role_arn: String,
    /// The role did not exist before.
    pub created: bool,
    /// The trust policy was written (new role or drifted document).
    pub trust_policy_changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions_policy: Option<String>,
    pub managed_policies: Vec<String>,
}

impl super::service::IrsaService {
    /// Apply a plan with the service's credentials.
    ///
    /// Refuses when the credentials belong to another account than the one the
    /// trust policy federates into.
    pub async fn apply(&self, plan: &BindingPlan) -> IrsaResult<ApplyResult> {
        let caller_account = caller_account_id(&self.sts_client).await?;
        apply_plan(&self.iam_client, &caller_account, plan).await
    }
}

/// Create or converge the role described by `plan`.
pub async fn apply_plan<P: RoleProvisioner + ?Sized>(
    provisioner: &P,
    caller_account: &str,
    plan: &BindingPlan,
) -> IrsaResult<ApplyResult> {
    if caller_account != plan.account_id {
        return Err(IrsaError::AccountMismatch {
            planned: plan.account_id.clone(),
            caller: caller_account.to_string(),
        });
    }

    let role_name = &plan.role_name;
    let (role_arn, created, trust_policy_changed) = match provisioner.get_role(role_name).await? {
        None => {
            let arn = provisioner.create_role(role_name, &plan.trust_policy).await?;
            info!("Created role {arn}");
            (arn, true, true)
        }
        Some(existing) if existing.trust_policy.as_ref() == Some(&plan.trust_policy) => {
            info!("Role {} already trusts the planned subject", existing.arn);
            (existing.arn, false, false)
        }
        Some(existing) => {
            warn!("Trust policy of role {} drifted, replacing it", existing.arn);
            provisioner
                .update_trust_policy(role_name, &plan.trust_policy)
                .await?;
            (existing.arn, false, true)
        }
    };

    let permissions_policy = match &plan.inline_policy {
        Some(policy) => {
            provisioner
                .put_role_policy(role_name, &policy.name, &policy.document)
                .await?;
            info!("Put inline policy {} on role {role_name}", policy.name);
            Some(policy.name.clone())
        }
        None => None,
    };

    for arn in &plan.managed_policy_arns {
        provisioner.attach_managed_policy(role_name, arn).await?;
        info!("Attached {arn} to role {role_name}");
    }

    Ok(ApplyResult {
        role_name: role_name.clone(),
        role_arn,
        created,
        trust_policy_changed,
        permissions_policy,
        managed_policies: plan.managed_policy_arns.clone(),
    })
}
