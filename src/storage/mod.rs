//!  Storage is read only and organized through [journal::Journal].
//!  The basic idea is:
//!   - There is a journal directory with one JSON-lines file per record kind.
//!   - Lines are deserialized into [entities] and converted into the domain model.
//!   - Entries are served to the analytics through [entry_source::EntrySource].

pub mod entities;
pub mod entry_source;
pub mod journal;
