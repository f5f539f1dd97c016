//! Domain model for vocabulary, per-user word state and local preferences.
//!
//! # Responsibility
//! - Define canonical data structures shared by repositories and services.
//! - Keep JLPT level ordering and exclusion-window math in one place.
//!
//! # Invariants
//! - Words are immutable reference data identified by a stable `WordId`.
//! - Exclusion is derived from `checked_at` on every read, never stored.

pub mod deck;
pub mod lyric;
pub mod profile;
pub mod user_state;
pub mod word;
