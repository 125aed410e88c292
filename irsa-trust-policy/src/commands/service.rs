//! IRSA service layer
//!
//! Holds the AWS clients used to provision a planned binding. Planning itself
//! needs no clients; see [`crate::commands::plan_binding`].

use aws_sdk_iam::Client as IamClient;
use aws_sdk_sts::Client as StsClient;

use crate::aws::iam_client::AwsIamClient;
use crate::aws::AwsError;
use crate::error::IrsaResult;

pub struct IrsaService {
    pub(crate) iam_client: AwsIamClient,
    pub(crate) sts_client: StsClient,
}

impl IrsaService {
    /// Create a new service instance with AWS clients
    ///
    /// The configuration is loaded using the default credential provider chain.
    ///
    /// # Errors
    ///
    /// Returns an error if no AWS region can be resolved.
    pub async fn new() -> IrsaResult<Self> {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;

        if config.region().is_none() {
            return Err(AwsError::ConfigError(
                "no AWS region configured (set AWS_REGION or a profile region)".to_string(),
            )
            .into());
        }

        Ok(Self {
            iam_client: AwsIamClient::new(IamClient::new(&config)),
            sts_client: StsClient::new(&config),
        })
    }
}
