//! Recette — recipe execution engine.
//!
//! Proportional ingredient scaling by baker's ratio, and a guided cook-mode
//! stepper with per-step countdown timers. Pure in-memory state machines over
//! an immutable recipe snapshot.

pub mod cli;
pub mod core;
pub mod journal;
