//! Policy gates: call policy, RBAC, keyword guardrails, and SSO token
//! validation (spec.md §4.10). Each gate is an independent middleware —
//! compose the ones a deployment needs.

mod call_policy;
mod guardrail;
mod rbac;
mod sso;

pub use call_policy::{CallPolicyConfig, CallPolicyMiddleware, CallPolicyProvider};
pub use guardrail::{GuardrailConfig, GuardrailMiddleware};
pub use rbac::{ProfileDefinition, RbacConfig, RbacMiddleware};
pub use sso::{ResolvedIdentity, SsoGateConfig, SsoGateMiddleware, SsoValidator};
