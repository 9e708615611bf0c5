//! Core pipeline orchestration for specsync.
//!
//! Ties fetching, markdown transformation, and output writing into the
//! end-to-end `sync` workflow, plus the link auditor that keeps an already
//! written tree clean.

pub mod audit;
pub mod pipeline;
pub mod sidebar;
pub mod templates;
pub mod writer;
