//! AI Dex - Client Library
//!
//! Client core of the AI Dex monster catalog: a session layer that owns the
//! access token and transparently refreshes it, and a query cache that
//! deduplicates, caches and invalidates reads of the catalog API.
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types and pure helpers
//!   - Monster and user payloads, the type enumeration
//!   - Rarity tiers and pagination math
//!   - Form validation, configuration, error types
//!
//! - **`client`** - Everything that talks to the server
//!   - `SessionManager`: bearer injection, refresh-and-retry on 401
//!   - `QueryCache`: keyed reads, dedup, staleness, invalidation
//!   - Resource queries and mutations, application state
//!
//! # Usage
//!
//! ```rust,no_run
//! use aidex::client::{AppState, Config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut state = AppState::new(Config::from_env()?)?;
//! state.start().await;
//! let page = state.load_gallery().await?;
//! println!("{} monsters", page.pagination.total_items);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - `shared::error::SharedError` for validation and parsing
//! - `shared::config::ConfigError` for configuration
//! - `client::error::ApiError` for every network-facing operation

/// Shared types and data structures
pub mod shared;

/// Session, query cache and application state
pub mod client;
