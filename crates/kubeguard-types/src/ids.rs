//! Stable identifiers for controls, violation codes, and allowlist inputs.
//!
//! Control ids follow the benchmark numbering. `code` is a short snake_case discriminator.

// Controls: eks-cis catalog
pub const CONTROL_EKS_CIS_4_1_6_PODS: &str = "eks-cis-4.1.6-pods";
pub const CONTROL_EKS_CIS_4_1_6_SERVICE_ACCOUNTS: &str = "eks-cis-4.1.6-service-accounts";
pub const CONTROL_EKS_CIS_4_2_7: &str = "eks-cis-4.2.7";

// Codes: evaluation
pub const CODE_NON_COMPLIANT_VALUE: &str = "non_compliant_value";
pub const CODE_NO_COMPLIANT_RESOURCE: &str = "no_compliant_resource";

// Codes: execution
pub const CODE_QUERY_FAILED: &str = "query_failed";
pub const CODE_PARSE_FAILED: &str = "parse_failed";

// Allowlist inputs
pub const INPUT_ALLOWLIST_PODS: &str = "allowlist_pods";
pub const INPUT_ALLOWLIST_SERVICE_ACCOUNTS: &str = "allowlist_service_accounts";

// Tool-level
pub const CONTROL_TOOL_RUNTIME: &str = "tool.runtime";
pub const CODE_RUNTIME_ERROR: &str = "runtime_error";
