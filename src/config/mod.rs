//! Configuration resolution
//!
//! Turns constructor arguments ([`BrokerOptions`]) into the immutable
//! [`ResolvedConfig`] a broker is built from. Both broker flavors share this
//! module; only client construction differs between them.
//!
//! # Proxy precedence
//!
//! 1. Per-scheme `mounts` argument
//! 2. Single `proxy` argument
//! 3. Env file + process environment (when `load_env_vars` is set)
//! 4. The transport's own environment handling (when `trust_env` is set)
//! 5. No proxy

mod env;
mod options;
mod proxy;
mod resolver;

pub use env::{Credentials, EnvSource, DEFAULT_ENV_FILE};
pub use options::{BrokerOptions, BrokerOptionsBuilder, TransportOptions, DEFAULT_TIMEOUT};
pub use proxy::{Mounts, ProxyConfig, ProxySource, ResolvedProxy, Scheme};
pub use resolver::ResolvedConfig;

pub(crate) use options::PassThrough;
