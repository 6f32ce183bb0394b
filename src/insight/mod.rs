//! Analytics over logged time.
//!  - [statistic::Statistic] is a tree of accumulated [datum::StatisticalDatum]s. [breakdown]
//!    builds the activity and people trees out of entries.
//!  - [streak] tracks goal streaks over [bucket::BucketStrategy] buckets.
//!  - [points] scores a day.

pub mod breakdown;
pub mod bucket;
pub mod datum;
pub mod points;
pub mod statistic;
pub mod streak;
