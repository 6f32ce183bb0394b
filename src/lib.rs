//! Analytics over a personal time log: time spent per activity and with people, goal streaks and
//! daily points. The journal is read from an application directory and explored through a
//! terminal.
//!

pub mod cli;
pub mod error;
pub mod insight;
pub mod model;
pub mod preferences;
pub mod storage;
pub mod utils;
