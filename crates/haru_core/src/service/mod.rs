//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and preference calls into use-case level APIs.
//! - Own startup composition so front ends never see a failed open.

pub mod deck_service;
pub mod startup;
pub mod word_service;

pub use deck_service::{DeckService, TodayDeck};
pub use startup::{open_preference_store, open_repository, HaruCore, OpenedRepositories};
pub use word_service::{RelatedWords, WordDetailView, WordListing, WordService};
