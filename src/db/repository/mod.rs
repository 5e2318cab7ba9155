//! Repository layer: typed operations over raw store documents.
//!
//! Functions here do no authorization; callers outside the data access
//! layer go through `crate::profiles::ProfileDirectory`.

mod profile;

pub use profile::*;
