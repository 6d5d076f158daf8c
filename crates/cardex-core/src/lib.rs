//! Core types and the card repository for Cardex.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::BlobStore`]; everything else (the REST API, the
//! CLI, the exporters) depends on the types defined here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod card;
pub mod error;
pub mod memory;
pub mod query;
pub mod repository;
pub mod stats;
pub mod store;

pub use card::{Card, CardFields, CardId, NewCard, Tag};
pub use error::{Error, Result};
pub use repository::{CardRepository, Listing};
