//! Index building, caching, and search for wikisift.
//!
//! This crate ties together fetching and line annotation into a flat line
//! index (`index`), keeps it in a time-limited cache (`cache`), and answers
//! queries against it (`search`).

pub mod cache;
pub mod index;
pub mod search;
