//! Pure control evaluation (no IO).
//!
//! Input: resolved controls plus the raw output (or failure) of each control's query.
//! Output: per-control results + verdict + summary data.

#![forbid(unsafe_code)]

pub mod allowlist;
pub mod condition;
pub mod model;
pub mod parse;
pub mod policy;
pub mod report;

mod engine;
mod fingerprint;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use engine::{evaluate_control, evaluate_records, summarize, Evaluation};
