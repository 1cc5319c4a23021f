//! SQL connectors backed by DuckDB
//!
//! DuckDB reaches PostgreSQL, MySQL and SQLite through its scanner
//! extensions. Query, insert and update semantics are the driver's own, and
//! driver errors surface unchanged as [`Error::Database`](crate::Error::Database).

mod connector;

pub use connector::{Pages, SqlConnector, SqlEngine, SqlOptions};

#[cfg(test)]
mod tests;
