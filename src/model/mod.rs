//! Domain values the analytics work on. Everything here is immutable once built, edits go through
//! builder-style methods returning new values.

pub mod activity;
pub mod entry;
pub mod goal;
pub mod person;
