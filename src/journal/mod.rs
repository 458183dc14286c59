//! Journal — append-only session event log and recipe snapshot fingerprints.

pub mod eventlog;
pub mod hasher;
