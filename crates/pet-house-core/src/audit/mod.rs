//! Append-only audit trail of status transitions.
//!
//! Each event stores the SHA-256 of its predecessor's hash concatenated with
//! its own canonical JSON, so editing or dropping a row breaks every later
//! link. Rejection reasons are kept here since neither status table has a
//! column for them.

mod chain;

pub use chain::*;
