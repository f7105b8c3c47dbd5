//! # Blind Check Common Library
//!
//! Shared code for the Blind Check service and tools including:
//! - Form document model and client projections
//! - Inscription text matching
//! - 3x3 marker grid
//! - Document stores (SQLite and read-only folder)
//! - Configuration loading
//! - Database initialization and migrations

pub mod config;
pub mod db;
pub mod error;
pub mod grid;
pub mod matching;
pub mod models;
pub mod report;
pub mod seed;
pub mod store;
pub mod view;

pub use error::{Error, Result};
pub use matching::{MatchOutcome, MatchPolicy, TextMatcher};
pub use models::BlindCheckForm;
pub use store::FormStore;
