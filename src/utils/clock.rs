use chrono::{Local, NaiveDateTime};

/// Represents an entity responsible for providing the current wall clock time across
/// application. This allows freezing time in tests.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
