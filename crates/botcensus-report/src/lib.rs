//! botcensus-report: loaders, orchestration, exports, and charts for the
//! infection-report pipeline.
//!
//! The binary loads the Mirai table and the Censys catalog once, hands both
//! to `report::generate_report` (and optionally `report::device_report`),
//! and every output lands under the configured directory as
//! `<base>_<suffix>.{csv,png}`.

pub mod censys;
pub mod chart;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod mirai;
pub mod report;

pub use error::{ReportError, Result};
