//! API endpoint handlers, grouped by resource.

pub mod advisory;
pub mod health;
pub mod profiles;
pub mod roster;
pub mod session;
pub mod vitals;
