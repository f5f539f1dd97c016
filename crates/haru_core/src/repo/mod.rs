//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for words, user word
//!   state and lyrics.
//! - Isolate SQLite query details from service orchestration.
//! - Provide non-functional fallbacks so callers can render an error state
//!   when the store cannot be opened.
//!
//! # Invariants
//! - `None`/empty results mean "no match", never failure.
//! - Read paths reject invalid persisted values instead of masking them.

pub mod dictionary_repo;
pub mod fallback;
pub mod lyric_repo;

pub use dictionary_repo::{
    DictionaryRepository, Page, RepoError, RepoResult, SqliteDictionaryRepository,
    RANDOM_SAMPLE_MAX_ATTEMPTS,
};
pub use fallback::{StubDictionaryRepository, UnavailableDictionaryRepository};
pub use lyric_repo::{LyricRepository, SqliteLyricRepository, StubLyricRepository};
