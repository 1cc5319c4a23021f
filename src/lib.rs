// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # apiary
//!
//! A request broker for REST APIs and SQL backends. Connectors share one way
//! of resolving proxies, credentials and transport options, and one way of
//! dispatching, retrying and closing.
//!
//! ## Features
//!
//! - **Config resolution**: proxies from mounts, an explicit URL, env files or
//!   the process environment, in a fixed precedence order
//! - **Two flavors**: a blocking [`Broker`] and an [`AsyncBroker`] with the
//!   same verb methods
//! - **Retry**: exponential backoff on 429 / 5xx and transport failures
//! - **Scoped lifecycle**: connectors close on `scope` exit and on drop
//! - **SQL**: PostgreSQL, MySQL, SQLite and DuckDB through DuckDB
//! - **Cassettes**: recorded exchanges with secrets scrubbed before saving
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use apiary::{BrokerOptions, Broker, RequestOptions, Result};
//!
//! fn main() -> Result<()> {
//!     let options = BrokerOptions::builder("https://api.example.com")
//!         .proxy("http://proxy.internal:3128")
//!         .enable_backoff()
//!         .build();
//!
//!     let status = Broker::new(options)?.scope(|broker| {
//!         broker
//!             .get("/v1/status", RequestOptions::new().query("verbose", "1"))
//!             .map(|r| r.status())
//!     })?;
//!     println!("{status}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │   api::DomainToolsConnector   api::IpqsConnector   cli       │
//! └───────────────────────────────┬───────────────────────────────┘
//!                                 │ Call
//! ┌───────────────┬───────────────┴───────────────┬───────────────┐
//! │    config     │            broker             │   cassette    │
//! ├───────────────┼───────────────────────────────┼───────────────┤
//! │ env / .env    │ Broker (blocking)             │ recorder      │
//! │ credentials   │ AsyncBroker                   │ scrub on save │
//! │ proxy rules   │ RetryPolicy, Lifecycle        │               │
//! └───────────────┴───────────────────────────────┴───────────────┘
//!         database::SqlConnector (DuckDB: postgres, mysql, sqlite)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Request authentication
pub mod auth;

/// Secret scrubbing for logs and cassettes
pub mod redact;

/// Configuration, environment and proxy resolution
pub mod config;

/// Blocking and async request brokers
pub mod broker;

/// Recorded HTTP exchanges
pub mod cassette;

/// Typed third-party API connectors
pub mod api;

/// SQL connectors via DuckDB
pub mod database;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use auth::Auth;
pub use broker::{ApiResponse, AsyncBroker, Broker, Call, Lifecycle, RequestOptions, RetryPolicy};
pub use config::{BrokerOptions, ProxyConfig, ProxySource, ResolvedConfig, TransportOptions};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
