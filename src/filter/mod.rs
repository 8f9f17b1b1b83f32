//! DNS query filtering module.
//!
//! Only domains present in the allow-list are resolved; everything else
//! is answered locally.

mod allowlist;

pub use allowlist::Allowlist;
