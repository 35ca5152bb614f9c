//! Stable DTOs and IDs used across the kubeguard workspace.
//!
//! This crate is intentionally boring:
//! - data types for the emitted control results and report
//! - stable string IDs and codes
//! - explain registry for rationale and remediation guidance

#![forbid(unsafe_code)]

pub mod explain;
pub mod ids;
pub mod receipt;

pub use explain::{ExamplePair, Explanation, lookup_explanation};
pub use receipt::{
    ControlResult, ControlStatus, ControlTags, KubeguardData, KubeguardReport, ReportEnvelope,
    SCHEMA_REPORT_V1, Severity, ToolMeta, Verdict, Violation,
};
