//! Constructor arguments for brokers and connectors

use super::env::{Credentials, EnvSource, DEFAULT_ENV_FILE};
use crate::auth::Auth;
use crate::broker::RetryPolicy;
use crate::cassette::CassetteRecorder;
use crate::error::{Error, Result};
use crate::types::{Flavor, HttpVersion, JsonValue, StringMap};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport settings, applied to the whole client or to a single call.
///
/// The named fields are the options the broker understands. `extra` is a
/// residual bag forwarded to the HTTP client as-is; see [`PassThrough`] for
/// the keys it accepts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportOptions {
    /// Verify TLS certificates (`Some(false)` accepts invalid certificates)
    pub verify_tls: Option<bool>,
    /// Protocol version to use
    pub http_version: Option<HttpVersion>,
    /// Total request timeout
    pub timeout: Option<Duration>,
    /// Connect timeout
    pub connect_timeout: Option<Duration>,
    /// Pass-through client options
    pub extra: BTreeMap<String, JsonValue>,
}

impl TransportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = Some(verify);
        self
    }

    #[must_use]
    pub fn http_version(mut self, version: HttpVersion) -> Self {
        self.http_version = Some(version);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Add a pass-through option
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Layer `other` on top of `self`; set fields in `other` win
    pub fn overlay(&self, other: &TransportOptions) -> TransportOptions {
        let mut extra = self.extra.clone();
        extra.extend(other.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        TransportOptions {
            verify_tls: other.verify_tls.or(self.verify_tls),
            http_version: other.http_version.or(self.http_version),
            timeout: other.timeout.or(self.timeout),
            connect_timeout: other.connect_timeout.or(self.connect_timeout),
            extra,
        }
    }

    /// Whether applying these options per call needs its own client.
    ///
    /// Timeout and protocol version can be set on a single request; the rest
    /// are client-level settings.
    pub fn needs_dedicated_client(&self) -> bool {
        self.verify_tls.is_some() || self.connect_timeout.is_some() || !self.extra.is_empty()
    }

    /// Check the pass-through bag
    pub fn validate(&self) -> Result<()> {
        PassThrough::parse(&self.extra).map(|_| ())
    }
}

/// Typed view of [`TransportOptions::extra`]
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PassThrough {
    pub user_agent: Option<String>,
    pub pool_max_idle_per_host: Option<usize>,
    pub pool_idle_timeout: Option<Duration>,
    pub tcp_nodelay: Option<bool>,
    pub https_only: Option<bool>,
    pub max_redirects: Option<usize>,
    pub referer: Option<bool>,
}

impl PassThrough {
    /// Parse the residual bag. Unknown keys and ill-typed values are errors.
    pub fn parse(extra: &BTreeMap<String, JsonValue>) -> Result<Self> {
        let mut parsed = Self::default();
        for (key, value) in extra {
            match key.as_str() {
                "user_agent" => parsed.user_agent = Some(expect_str(key, value)?),
                "pool_max_idle_per_host" => {
                    parsed.pool_max_idle_per_host = Some(expect_uint(key, value)? as usize);
                }
                "pool_idle_timeout_secs" => {
                    parsed.pool_idle_timeout =
                        Some(Duration::from_secs(expect_uint(key, value)?));
                }
                "tcp_nodelay" => parsed.tcp_nodelay = Some(expect_bool(key, value)?),
                "https_only" => parsed.https_only = Some(expect_bool(key, value)?),
                "max_redirects" => parsed.max_redirects = Some(expect_uint(key, value)? as usize),
                "referer" => parsed.referer = Some(expect_bool(key, value)?),
                other => {
                    return Err(Error::config(format!(
                        "unsupported transport option '{other}'"
                    )))
                }
            }
        }
        Ok(parsed)
    }
}

fn expect_str(key: &str, value: &JsonValue) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| type_error(key, "a string"))
}

fn expect_uint(key: &str, value: &JsonValue) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| type_error(key, "a non-negative integer"))
}

fn expect_bool(key: &str, value: &JsonValue) -> Result<bool> {
    value.as_bool().ok_or_else(|| type_error(key, "a boolean"))
}

fn type_error(key: &str, expected: &str) -> Error {
    Error::config(format!("transport option '{key}' expects {expected}"))
}

/// Constructor arguments shared by every broker and connector
#[derive(Debug, Clone)]
pub struct BrokerOptions {
    /// Base URL that relative targets are joined onto
    pub base_url: String,
    /// Default headers for every request
    pub headers: StringMap,
    /// Emit a log record per request
    pub enable_logging: bool,
    /// Retry policy; `None` disables retries
    pub retry: Option<RetryPolicy>,
    /// Request timeout
    pub timeout: Duration,
    /// Read proxies and credentials from the env file and process environment
    pub load_env_vars: bool,
    /// Env file path (defaults to `.env`)
    pub env_file: Option<PathBuf>,
    /// Pre-loaded environment used instead of reading the file and process
    pub env: Option<EnvSource>,
    /// Let the transport honor ambient proxy variables
    pub trust_env: bool,
    /// One proxy for all schemes
    pub proxy: Option<String>,
    /// Per-scheme proxies, keyed by `http`, `https` or `all`
    pub mounts: BTreeMap<String, String>,
    /// Authentication applied to every request
    pub auth: Option<Auth>,
    /// Client-level transport settings
    pub transport: TransportOptions,
    /// Credentials passed as arguments
    pub credentials: Credentials,
    /// Cassette recorder that receives every exchange
    pub recorder: Option<CassetteRecorder>,
}

impl Default for BrokerOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            headers: StringMap::new(),
            enable_logging: false,
            retry: None,
            timeout: DEFAULT_TIMEOUT,
            load_env_vars: false,
            env_file: None,
            env: None,
            trust_env: true,
            proxy: None,
            mounts: BTreeMap::new(),
            auth: None,
            transport: TransportOptions::default(),
            credentials: Credentials::default(),
            recorder: None,
        }
    }
}

impl BrokerOptions {
    /// Create a new options builder
    pub fn builder(base_url: impl Into<String>) -> BrokerOptionsBuilder {
        BrokerOptionsBuilder {
            options: BrokerOptions {
                base_url: base_url.into(),
                ..BrokerOptions::default()
            },
        }
    }

    /// Checks that need no environment; run first so they fail fast
    pub fn validate(&self, flavor: Flavor) -> Result<()> {
        if flavor == Flavor::Async && !self.mounts.is_empty() {
            return Err(Error::config(
                "the 'mounts' option is not supported by the async broker; \
                 use 'proxy', or 'trust_env' with HTTP_PROXY / HTTPS_PROXY in the environment",
            ));
        }
        if !self.base_url.is_empty() {
            url::Url::parse(&self.base_url)?;
        }
        self.transport.validate()
    }

    /// The environment this configuration resolves against.
    ///
    /// Empty unless `load_env_vars` is set.
    pub fn load_environment(&self) -> Result<EnvSource> {
        if !self.load_env_vars {
            return Ok(EnvSource::empty());
        }
        if let Some(env) = &self.env {
            return Ok(env.clone());
        }
        let path = self
            .env_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE));
        EnvSource::load(path)
    }
}

/// Builder for [`BrokerOptions`]
#[derive(Debug, Clone)]
pub struct BrokerOptionsBuilder {
    options: BrokerOptions,
}

impl BrokerOptionsBuilder {
    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.insert(key.into(), value.into());
        self
    }

    /// Enable per-request log records
    pub fn logging(mut self, enabled: bool) -> Self {
        self.options.enable_logging = enabled;
        self
    }

    /// Retry transient failures with the default policy
    pub fn enable_backoff(mut self) -> Self {
        self.options.retry = Some(RetryPolicy::default());
        self
    }

    /// Retry transient failures with a custom policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.options.retry = Some(policy);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Read proxies and credentials from the environment
    pub fn load_env_vars(mut self, load: bool) -> Self {
        self.options.load_env_vars = load;
        self
    }

    /// Read this env file instead of `.env`
    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Use a pre-loaded environment
    pub fn env_source(mut self, env: EnvSource) -> Self {
        self.options.env = Some(env);
        self
    }

    /// Allow or forbid ambient proxy variables
    pub fn trust_env(mut self, trust: bool) -> Self {
        self.options.trust_env = trust;
        self
    }

    /// Route every scheme through one proxy
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.options.proxy = Some(url.into());
        self
    }

    /// Route one scheme through a proxy
    pub fn mount(mut self, scheme: impl Into<String>, url: impl Into<String>) -> Self {
        self.options.mounts.insert(scheme.into(), url.into());
        self
    }

    /// Authenticate every request
    pub fn auth(mut self, auth: Auth) -> Self {
        self.options.auth = Some(auth);
        self
    }

    /// Client-level transport settings
    pub fn transport(mut self, transport: TransportOptions) -> Self {
        self.options.transport = transport;
        self
    }

    /// Supply a credential as an argument
    pub fn credential(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.credentials.insert(name, value);
        self
    }

    /// Record every exchange into a cassette
    pub fn recorder(mut self, recorder: CassetteRecorder) -> Self {
        self.options.recorder = Some(recorder);
        self
    }

    /// Build the options
    pub fn build(self) -> BrokerOptions {
        self.options
    }
}
