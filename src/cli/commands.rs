//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Request broker for REST APIs and SQL backends
#[derive(Parser, Debug)]
#[command(name = "apiary")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Proxy URL for every scheme
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Per-scheme proxy as SCHEME=URL (http, https or all); blocking only
    #[arg(long = "mount", value_name = "SCHEME=URL", global = true)]
    pub mounts: Vec<String>,

    /// Read credentials and proxies from the environment and env file
    #[arg(long, global = true)]
    pub load_env: bool,

    /// Env file consulted with --load-env (default: .env)
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Ignore the transport's own proxy environment handling
    #[arg(long, global = true)]
    pub no_trust_env: bool,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Retry 429 and 5xx responses with exponential backoff
    #[arg(long, global = true)]
    pub retry: bool,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "10")]
    pub timeout: u64,

    /// Resolve and send `request` calls on the blocking broker
    #[arg(long, global = true)]
    pub blocking: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output (request logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the resolved configuration without sending anything
    Resolve {
        /// Base URL to resolve against
        #[arg(default_value = "")]
        base_url: String,
    },

    /// Send a single request
    Request {
        /// HTTP method
        method: String,

        /// Absolute URL
        url: String,

        /// Header as NAME:VALUE
        #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
        headers: Vec<String>,

        /// Query parameter as KEY=VALUE
        #[arg(short, long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,

        /// JSON request body
        #[arg(long)]
        json: Option<String>,
    },

    /// DomainTools lookups
    Domaintools {
        /// API key (default: DOMAINTOOLS_API_KEY with --load-env)
        #[arg(long)]
        api_key: Option<String>,

        /// Override the API base URL
        #[arg(long)]
        base_url: Option<String>,

        #[command(subcommand)]
        command: DomainToolsCommand,
    },

    /// IPQualityScore malicious URL scan
    Ipqs {
        /// URL to scan
        url: String,

        /// Extra form field as KEY=VALUE (e.g. strictness=1)
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// API key (default: IPQS_API_KEY with --load-env)
        #[arg(long)]
        api_key: Option<String>,

        /// Override the API base URL
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Run a SQL query through DuckDB
    Sql {
        /// Engine: postgres, mysql, sqlite or duckdb
        engine: String,

        /// Connection string or database path (":memory:" for in-memory)
        connection: String,

        /// Query to run
        query: String,

        /// Bind parameter (JSON literal, or plain text)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Fetch the result in pages of this size
        #[arg(long)]
        page_size: Option<usize>,

        /// Open the source read-only
        #[arg(long)]
        read_only: bool,
    },
}

/// DomainTools operations
#[derive(Subcommand, Debug)]
pub enum DomainToolsCommand {
    /// Parsed WHOIS record
    Whois { query: String },

    /// Domains on the same IP
    ReverseIp { query: String },

    /// Domains sharing a name server
    ReverseNs { query: String },

    /// Iris Investigate search
    Iris {
        /// Search field as KEY=VALUE
        #[arg(short, long = "param", value_name = "KEY=VALUE", required = true)]
        params: Vec<String>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON on one line
    Json,
    /// Indented JSON
    Pretty,
}
