//! Explain registry for controls and codes.
//!
//! Maps control IDs and codes to human-readable explanations with rationale and remediation
//! guidance.

use crate::ids;

/// Explanation entry for a control or code.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Short description of the control/code.
    pub title: &'static str,
    /// What the control checks and why it exists.
    pub description: &'static str,
    /// How to fix violations.
    pub remediation: &'static str,
    /// Before/after manifest examples.
    pub examples: ExamplePair,
}

/// Before and after manifest examples.
#[derive(Debug, Clone)]
pub struct ExamplePair {
    /// Manifest that would produce a violation.
    pub before: &'static str,
    /// Manifest that passes the control.
    pub after: &'static str,
}

/// Look up an explanation by control_id or code.
///
/// Returns `None` if the identifier is not recognized.
pub fn lookup_explanation(identifier: &str) -> Option<Explanation> {
    match identifier {
        // Controls
        ids::CONTROL_EKS_CIS_4_1_6_PODS => Some(explain_pods_automount()),
        ids::CONTROL_EKS_CIS_4_1_6_SERVICE_ACCOUNTS => Some(explain_service_accounts_automount()),
        ids::CONTROL_EKS_CIS_4_2_7 => Some(explain_added_capabilities()),

        // Codes
        ids::CODE_NON_COMPLIANT_VALUE => Some(explain_non_compliant_value()),
        ids::CODE_NO_COMPLIANT_RESOURCE => Some(explain_no_compliant_resource()),
        ids::CODE_QUERY_FAILED => Some(explain_query_failed()),
        ids::CODE_PARSE_FAILED => Some(explain_parse_failed()),

        _ => None,
    }
}

/// List all known control IDs.
pub fn all_control_ids() -> &'static [&'static str] {
    &[
        ids::CONTROL_EKS_CIS_4_1_6_PODS,
        ids::CONTROL_EKS_CIS_4_1_6_SERVICE_ACCOUNTS,
        ids::CONTROL_EKS_CIS_4_2_7,
    ]
}

/// List all known codes.
pub fn all_codes() -> &'static [&'static str] {
    &[
        ids::CODE_NON_COMPLIANT_VALUE,
        ids::CODE_NO_COMPLIANT_RESOURCE,
        ids::CODE_QUERY_FAILED,
        ids::CODE_PARSE_FAILED,
    ]
}

// --- Control-level explanations ---

const AUTOMOUNT_RATIONALE: &str = "\
Service account tokens should not be mounted in pods except where the workload running
in the pod explicitly needs to communicate with the API server.

Mounting service account tokens inside pods can provide an avenue for privilege
escalation attacks where an attacker is able to compromise a single pod in the cluster.
Avoiding mounting these tokens removes this attack avenue.";

const AUTOMOUNT_REMEDIATION: &str = "\
Modify the definition of pods and service accounts which do not need to mount service
account tokens to disable it:

    automountServiceAccountToken: false

Workloads that genuinely need API access can be exempted through the
`allowlist_pods` (regular expressions) or `allowlist_service_accounts` (exact names)
inputs.";

fn explain_pods_automount() -> Explanation {
    Explanation {
        title: "Service Account Tokens Only Mounted Where Necessary (Pods)",
        description: AUTOMOUNT_RATIONALE,
        remediation: AUTOMOUNT_REMEDIATION,
        examples: ExamplePair {
            before: r#"apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  containers:
    - name: web
      image: nginx"#,
            after: r#"apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  automountServiceAccountToken: false
  containers:
    - name: web
      image: nginx"#,
        },
    }
}

fn explain_service_accounts_automount() -> Explanation {
    Explanation {
        title: "Service Account Tokens Only Mounted Where Necessary (Service Accounts)",
        description: AUTOMOUNT_RATIONALE,
        remediation: AUTOMOUNT_REMEDIATION,
        examples: ExamplePair {
            before: r#"apiVersion: v1
kind: ServiceAccount
metadata:
  name: build-bot"#,
            after: r#"apiVersion: v1
kind: ServiceAccount
metadata:
  name: build-bot
automountServiceAccountToken: false"#,
        },
    }
}

fn explain_added_capabilities() -> Explanation {
    Explanation {
        title: "Minimize the Admission of Containers with Added Capabilities",
        description: "\
Do not generally permit containers with capabilities assigned beyond the default set.

Containers run with a default set of capabilities as assigned by the container runtime.
Capabilities outside this set can be added to containers which could expose them to
risks of container breakout attacks.

There should be at least one policy defined which prevents containers with capabilities
beyond the default set from launching. The control passes when at least one pod
security policy leaves `allowedCapabilities` unset or empty.",
        remediation: "\
Ensure that allowedCapabilities is not present in policies for the cluster unless it is
set to an empty array.

If you need to run containers with additional capabilities, define them in a separate
policy and check carefully that only limited service accounts and users are given
permission to use that policy.",
        examples: ExamplePair {
            before: r#"apiVersion: policy/v1beta1
kind: PodSecurityPolicy
metadata:
  name: permissive
spec:
  allowedCapabilities:
    - NET_ADMIN"#,
            after: r#"apiVersion: policy/v1beta1
kind: PodSecurityPolicy
metadata:
  name: restricted
spec:
  allowedCapabilities: []"#,
        },
    }
}

// --- Code-level explanations ---

fn explain_non_compliant_value() -> Explanation {
    Explanation {
        title: "Non-compliant Attribute Value",
        description: "\
A resource returned by the control's query has an attribute value that does not satisfy
the control's condition, and the resource is not covered by the control's allowlist.",
        remediation: "\
Change the resource so the attribute satisfies the condition, or, if the resource
legitimately needs the setting, add it to the allowlist input referenced by the control.",
        examples: ExamplePair {
            before: "pod-b  true",
            after: "pod-b  false",
        },
    }
}

fn explain_no_compliant_resource() -> Explanation {
    Explanation {
        title: "No Compliant Resource",
        description: "\
An existential control requires at least one resource that satisfies its condition, and
none was found. This includes the case where no resources of the queried kind exist.",
        remediation: "\
Create (or fix) at least one resource that satisfies the condition, for example a
restrictive policy with an empty capability list.",
        examples: ExamplePair {
            before: r#"spec:
  allowedCapabilities: ["NET_ADMIN"]"#,
            after: r#"spec:
  allowedCapabilities: []"#,
        },
    }
}

fn explain_query_failed() -> Explanation {
    Explanation {
        title: "Query Execution Failed",
        description: "\
The cluster query exited with a non-zero status, timed out, could not reach the API
server, or could not be started. The control is reported as an error and counts as a
failure; queries are never retried.",
        remediation: "\
Check cluster connectivity and credentials (`kubectl cluster-info`), the selected
context/kubeconfig, and whether the resource kind is served by the cluster. Raise
`timeout_secs` for slow API servers.",
        examples: ExamplePair {
            before: "error: the server doesn't have a resource type \"psp\"",
            after: "kubectl get psp -o json  # exits 0",
        },
    }
}

fn explain_parse_failed() -> Explanation {
    Explanation {
        title: "Query Output Could Not Be Parsed",
        description: "\
The query was expected to return a structured (JSON) document but the output could not
be parsed, or did not contain an object or an `items` list.",
        remediation: "\
Run the query by hand and confirm that it prints valid JSON. Plugins or wrappers that
print banners on stdout break structured parsing.",
        examples: ExamplePair {
            before: "Warning: policy/v1beta1 is deprecated\n{\"items\": []}",
            after: "{\"items\": []}",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_control_id() {
        assert!(lookup_explanation(ids::CONTROL_EKS_CIS_4_1_6_PODS).is_some());
        assert!(lookup_explanation(ids::CONTROL_EKS_CIS_4_1_6_SERVICE_ACCOUNTS).is_some());
        assert!(lookup_explanation(ids::CONTROL_EKS_CIS_4_2_7).is_some());
    }

    #[test]
    fn lookup_by_code() {
        assert!(lookup_explanation(ids::CODE_NON_COMPLIANT_VALUE).is_some());
        assert!(lookup_explanation(ids::CODE_NO_COMPLIANT_RESOURCE).is_some());
        assert!(lookup_explanation(ids::CODE_QUERY_FAILED).is_some());
        assert!(lookup_explanation(ids::CODE_PARSE_FAILED).is_some());
    }

    #[test]
    fn lookup_unknown_returns_none() {
        assert!(lookup_explanation("eks-cis-9.9.9").is_none());
        assert!(lookup_explanation("unknown_code").is_none());
    }

    #[test]
    fn registry_lists_are_consistent() {
        for id in all_control_ids().iter().chain(all_codes()) {
            let exp = lookup_explanation(id).expect("listed identifier must resolve");
            assert!(!exp.title.is_empty());
            assert!(!exp.remediation.is_empty());
        }
    }
}
