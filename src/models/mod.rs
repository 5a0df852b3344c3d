//! Domain model module declarations.

pub mod event;
pub mod habit;
pub mod intent;
pub mod item;
pub mod triage;
pub mod xp;
