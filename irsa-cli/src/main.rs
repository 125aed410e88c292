//! Command-line interface for building IRSA trust policies and binding
//! Kubernetes service accounts to IAM roles.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, LevelFilter};

use irsa_trust_policy::{
    build_service_trust_policy, build_trust_policy, plan_binding, BindingPlan, BindingRequest,
    IdentityProviderRef, IrsaError, IrsaService, PermissionsPolicy, ServiceAccountRef,
    TrustPolicyDocument, TrustPolicyParams,
};

/// Exit code for caller errors (bad flags, bad input files).
const EXIT_INVALID_INPUT: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "irsa", version, about = "Build and provision IAM Roles for Service Accounts")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the OIDC trust policy binding a service account to a role
    TrustPolicy {
        #[command(flatten)]
        trust: TrustArgs,

        /// Pretty-print the JSON document
        #[arg(long)]
        pretty: bool,
    },

    /// Print a trust policy for an AWS service principal
    ServiceTrustPolicy {
        /// Service principal, e.g. eks.amazonaws.com or eks-fargate-pods.amazonaws.com
        #[arg(long)]
        service: String,

        #[arg(long)]
        pretty: bool,
    },

    /// Create or update the IAM role for a service account
    Bind {
        #[command(flatten)]
        trust: TrustArgs,

        /// Name of the IAM role to create or update
        #[arg(long)]
        role_name: String,

        /// JSON permissions policy attached to the role as an inline policy
        #[arg(long)]
        permissions_file: Option<std::path::PathBuf>,

        /// Inline policy name (defaults to one derived from the role name)
        #[arg(long)]
        policy_name: Option<String>,

        /// Managed policy ARN to attach; may be repeated
        #[arg(long = "managed-policy")]
        managed_policies: Vec<String>,

        /// Apply without asking for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct TrustArgs {
    /// AWS account that owns the OIDC provider
    #[arg(long, env = "AWS_ACCOUNT_ID")]
    account_id: String,

    /// Cluster OIDC issuer URL (replaces --region and --oidc-provider-id)
    #[arg(long, conflicts_with_all = ["region", "oidc_provider_id"])]
    issuer_url: Option<String>,

    /// Region of the EKS cluster
    #[arg(long, required_unless_present = "issuer_url")]
    region: Option<String>,

    /// OIDC provider id (the segment after /id/ in the issuer URL)
    #[arg(long, required_unless_present = "issuer_url")]
    oidc_provider_id: Option<String>,

    /// Namespace of the service account
    #[arg(long, default_value = "kube-system")]
    namespace: String,

    /// Name of the service account
    #[arg(long)]
    service_account: String,
}

impl TrustArgs {
    fn into_params(self) -> Result<TrustPolicyParams, IrsaError> {
        let (region, oidc_provider_id) = match self.issuer_url {
            Some(url) => {
                let idp = IdentityProviderRef::from_issuer_url(&url)?;
                (idp.region().to_string(), idp.provider_id().to_string())
            }
            None => (
                self.region.unwrap_or_default(),
                self.oidc_provider_id.unwrap_or_default(),
            ),
        };

        Ok(TrustPolicyParams {
            account_id: self.account_id,
            region,
            oidc_provider_id,
            service_account: ServiceAccountRef::new(self.namespace, self.service_account),
        })
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn render(doc: &TrustPolicyDocument, pretty: bool) -> Result<String, IrsaError> {
    if pretty {
        doc.to_json_pretty()
    } else {
        doc.to_json()
    }
}

fn print_plan(plan: &BindingPlan) -> Result<()> {
    let summary =
        serde_json::to_string_pretty(&plan.summary()).context("Failed to serialize plan")?;
    eprintln!("Planned binding:\n{summary}");
    Ok(())
}

/// Ask on stderr/stdin; only called when stdin is a TTY.
fn confirm(role_name: &str) -> Result<bool> {
    eprint!("Apply changes to role '{role_name}'? [y/N] ");
    io::stderr().flush().context("Failed to flush stderr")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::TrustPolicy { trust, pretty } => {
            let params = trust.into_params()?;
            let doc = build_trust_policy(&params)?;
            println!("{}", render(&doc, pretty)?);
        }
        Command::ServiceTrustPolicy { service, pretty } => {
            let doc = build_service_trust_policy(&service)?;
            println!("{}", render(&doc, pretty)?);
        }
        Command::Bind {
            trust,
            role_name,
            permissions_file,
            policy_name,
            managed_policies,
            yes,
        } => {
            let permissions = match permissions_file {
                Some(path) => Some(PermissionsPolicy::from_file(path).await?),
                None => None,
            };
            let plan = plan_binding(&BindingRequest {
                role_name,
                trust: trust.into_params()?,
                permissions,
                policy_name,
                managed_policy_arns: managed_policies,
            })?;
            print_plan(&plan)?;

            if !yes {
                if !atty::is(atty::Stream::Stdin) {
                    eprintln!("Not applying: pass --yes or run interactively in a TTY to confirm.");
                    return Ok(());
                }
                if !confirm(&plan.role_name)? {
                    eprintln!("Aborted.");
                    return Ok(());
                }
            }

            let service = IrsaService::new()
                .await
                .context("Failed to initialize service")?;
            let result = service.apply(&plan).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&result).context("Failed to serialize result")?
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!("Parsed arguments: {cli:?}");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let invalid_input = e
                .downcast_ref::<IrsaError>()
                .is_some_and(IrsaError::is_validation);
            if invalid_input {
                ExitCode::from(EXIT_INVALID_INPUT)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
