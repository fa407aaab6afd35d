//! Integration tests for Dissim
//!
//! These tests drive complete runs through the public API of `dissim-core`
//! and `dissim-sim` and check the recorded logs and rendered reports.

#[path = "integration/determinism.rs"]
mod determinism;
#[path = "integration/end_to_end.rs"]
mod end_to_end;
#[path = "integration/optimizer_runs.rs"]
mod optimizer_runs;
#[path = "integration/planner_properties.rs"]
mod planner_properties;
#[path = "integration/report_files.rs"]
mod report_files;
