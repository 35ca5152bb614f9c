//! Use case orchestration for kubeguard.
//!
//! This crate provides the application layer: use cases that coordinate the settings, query,
//! domain, and render layers. It is intentionally thin and delegates heavy lifting to the
//! appropriate layers.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod check;
mod explain;
mod list;
mod render;
mod report;

pub use check::{CheckInput, CheckOutput, load_config, run_check, verdict_exit_code};
pub use explain::{
    ControlFacts, ExplainEntry, ExplainOutput, format_explanation, format_not_found, run_explain,
};
pub use list::{ControlSummary, format_list, run_list};
pub use render::{render_annotations, render_markdown};
pub use report::{parse_report_json, runtime_error_report, serialize_report, to_renderable};
