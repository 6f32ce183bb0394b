use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{activity::ActivityId, entry::EntryId};

pub type InsightResult<T> = std::result::Result<T, InsightError>;

/// Errors produced by the analytics engine. Most of them describe a caller breaking a contract
/// (feeding unfinished entries, unordered history, etc.) rather than a recoverable condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InsightError {
    #[error("entry {0} has no end time")]
    UnfinishedEntry(EntryId),

    #[error("entry {0} ends before it starts")]
    EndBeforeStart(EntryId),

    #[error("statistical datum can't be averaged over 0 periods")]
    DivideByZero,

    #[error("statistic {0} can't be a sub statistic of itself")]
    SelfReference(String),

    #[error("invalid interval {0:?}, expected a positive count followed by d, w or m")]
    InvalidInterval(String),

    #[error("minimum duration of a goal can't be negative")]
    NegativeMinDuration,

    #[error("activity {0} can't be a parent of itself")]
    SelfParent(ActivityId),

    #[error("unknown activity {0}")]
    UnknownActivity(ActivityId),

    #[error("activity hierarchy contains a cycle through {0}")]
    ActivityCycle(ActivityId),

    #[error("qualifying entry in bucket {latest} is later than reference bucket {reference}")]
    EntryAfterReference {
        latest: NaiveDate,
        reference: NaiveDate,
    },

    #[error("entry in bucket {bucket} arrived after an entry in older bucket {earliest}")]
    UnorderedHistory {
        bucket: NaiveDate,
        earliest: NaiveDate,
    },
}
