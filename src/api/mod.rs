//! Typed binding to the chat platform's REST API.
//!
//! `Transport` is the wire seam, `ApiClient` owns the retry/backoff/pacing
//! ladder and the typed endpoints the purge pipeline needs.

pub mod client;
pub mod models;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiClient, SEARCH_PAGE_SIZE, SearchQuery, SearchScope};
pub use models::{Channel, Guild, Message, SearchResult, User};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
