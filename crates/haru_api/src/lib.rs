//! Front-end facing use-case API for Haru.

pub mod api;

pub use api::HaruApi;
