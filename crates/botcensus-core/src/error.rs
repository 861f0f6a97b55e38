use thiserror::Error;

use crate::types::SkipTally;

/// Why a single input record was rejected.
///
/// Malformed records never abort a batch; loaders log the reason and tally
/// it through [`SkipTally::record`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),

    #[error("row truncated to {0} columns")]
    TruncatedRow(usize),

    #[error("missing or unparsable seen timestamp for {0}")]
    BadTimestamp(String),

    #[error("undecodable record: {0}")]
    BadRecord(String),
}

impl SkipTally {
    /// Count a rejected record under its category.
    pub fn record(&mut self, reason: &Malformed) {
        match reason {
            Malformed::InvalidIdentifier(_) => self.invalid_identifier += 1,
            Malformed::TruncatedRow(_) => self.truncated_row += 1,
            Malformed::BadTimestamp(_) => self.bad_timestamp += 1,
            Malformed::BadRecord(_) => self.bad_record += 1,
        }
    }
}
