//! HTTP endpoint modules.

pub mod status;
pub mod trigger;
