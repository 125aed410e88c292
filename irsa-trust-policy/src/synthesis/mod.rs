//! Policy synthesis (deterministic JSON generation)

pub mod trust_builder;

pub use trust_builder::{build_service_trust_policy, build_trust_policy, TrustPolicyParams};
