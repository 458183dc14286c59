//! Core recipe engine — snapshot types, loading, scaling, cook-mode sessions.

pub mod parser;
pub mod scaling;
pub mod session;
pub mod ticker;
pub mod timer;
pub mod types;
