//! Commands module - service layer for planning and applying role bindings

mod apply;
mod plan;
pub(crate) mod service;

pub use apply::{apply_plan, ApplyResult};
pub use plan::{
    default_policy_name, plan_binding, BindingPlan, BindingRequest, InlinePolicy, PlanSummary,
};
pub use service::IrsaService;
