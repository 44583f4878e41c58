//! Client Module
//!
//! Session handling and the query cache for the catalog API, plus the
//! application state a front end drives.
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── mod.rs        - Module exports
//! ├── main.rs       - Command-line front end (binary)
//! ├── config.rs     - Configuration and endpoint URLs
//! ├── error.rs      - ApiError
//! ├── http.rs       - Transport and replayable requests
//! ├── session.rs    - Token ownership, refresh-and-retry
//! ├── query/        - Query keys and the cache
//! ├── resources/    - Endpoint fetchers, queries and mutations
//! ├── filter.rs     - Type filter
//! ├── debounce.rs   - Debounced search input
//! ├── messages.rs   - User-facing error text
//! ├── notify.rs     - Notification buffer
//! ├── types.rs      - Views and route guards
//! └── state/        - Application state
//! ```

pub mod config;
pub mod debounce;
pub mod error;
pub mod filter;
pub mod http;
pub mod messages;
pub mod notify;
pub mod query;
pub mod resources;
pub mod session;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::ApiError;
pub use filter::TypeFilter;
pub use http::{ApiRequest, ApiResponse, HttpClient};
pub use notify::{Notification, NotificationLevel, NotificationSource, Notifier};
pub use query::{Mutation, QueryCache, QueryKey, QueryOptions};
pub use resources::{monster_keys, user_keys, MonsterListParams};
pub use session::{RefreshState, SessionManager};
pub use state::AppState;
pub use types::AppView;
