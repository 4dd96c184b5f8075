//! Application modules for the organization explorer.
//!
//! - [`explorer`] - dual-pane navigation over organization resource trees

pub mod explorer;
