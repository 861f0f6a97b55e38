//! botcensus-core: record types, filtering, matching, and aggregation for
//! infection reports.
//!
//! The pipeline core is pure set logic over two loaded datasets:
//! - candidate selection over the Mirai scan table (`filter`)
//! - intersection with the Censys telnet-eligible set (`matcher`)
//! - destructive at-most-once counting plus non-destructive grouping
//!   (`aggregate`, `banner`, `duration`, `devices`)
//!
//! All I/O lives in the report crate; everything here is deterministic and
//! side-effect free.

pub mod aggregate;
pub mod banner;
pub mod devices;
pub mod duration;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod types;

pub use error::Malformed;
