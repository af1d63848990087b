//! Model catalog access.
//!
//! Fetches candidate lists from an OpenRouter-compatible `/models` endpoint
//! and caches them per catalog with at most one in-flight fetch per key.

pub mod cache;
pub mod client;

pub use cache::CatalogCache;
pub use client::CatalogClient;
