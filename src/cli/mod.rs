//! CLI module
//!
//! Command-line interface over the brokers and connectors.
//!
//! # Commands
//!
//! - `resolve` - Print the resolved configuration
//! - `request` - Send one request through a broker
//! - `domaintools` - DomainTools lookups
//! - `ipqs` - IPQualityScore URL scan
//! - `sql` - Query a database through DuckDB

mod commands;
mod runner;

pub use commands::{Cli, Commands, DomainToolsCommand, OutputFormat};
pub use runner::Runner;
