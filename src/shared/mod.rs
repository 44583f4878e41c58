//! Shared Module
//!
//! Platform-agnostic data model of the monster catalog: wire types, the
//! derived-view helpers (rarity, pagination), form validation and
//! configuration. Nothing in here performs I/O except loading a config file.

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Monster read model and type enumeration
pub mod monster;

/// User and authentication payloads
pub mod user;

/// Rarity tiers
pub mod rarity;

/// Pagination math
pub mod pagination;

/// Client-side form validation
pub mod validation;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::SharedError;
pub use monster::{Monster, MonsterType, MonstersResponse, Pagination, Stats};
pub use pagination::{total_pages, visible_pages, PageItem};
pub use rarity::{calculate_rarity, Rarity};
pub use user::User;
