//! Final, immutable broker configuration

use super::env::{Credentials, EnvSource};
use super::options::{BrokerOptions, TransportOptions};
use super::proxy::{resolve_proxy, ResolvedProxy};
use crate::error::Result;
use crate::redact;
use crate::types::{Flavor, StringMap};
use secrecy::SecretString;
use serde_json::json;
use std::time::Duration;

/// Everything a broker needs to build its transport.
///
/// Built once at construction; a broker never changes it afterwards.
#[derive(Clone)]
pub struct ResolvedConfig {
    flavor: Flavor,
    base_url: String,
    headers: StringMap,
    proxy: ResolvedProxy,
    transport: TransportOptions,
    timeout: Duration,
    trust_env: bool,
    credentials: Credentials,
    env: EnvSource,
}

impl ResolvedConfig {
    /// Resolve options for a broker flavor
    pub fn resolve(options: &BrokerOptions, flavor: Flavor) -> Result<Self> {
        options.validate(flavor)?;

        let env = options.load_environment()?;
        let proxy = resolve_proxy(
            &options.mounts,
            options.proxy.as_deref(),
            options.load_env_vars,
            options.trust_env,
            &env,
        )?;
        proxy.validate_for(flavor)?;

        Ok(Self {
            flavor,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            headers: options.headers.clone(),
            proxy,
            transport: options.transport.clone(),
            timeout: options.transport.timeout.unwrap_or(options.timeout),
            trust_env: options.trust_env,
            credentials: options.credentials.clone(),
            env,
        })
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Default headers
    pub fn headers(&self) -> &StringMap {
        &self.headers
    }

    pub fn proxy(&self) -> &ResolvedProxy {
        &self.proxy
    }

    /// Client-level transport settings
    pub fn transport(&self) -> &TransportOptions {
        &self.transport
    }

    /// Effective request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn trust_env(&self) -> bool {
        self.trust_env
    }

    /// The environment snapshot used during resolution
    pub fn env(&self) -> &EnvSource {
        &self.env
    }

    /// Resolve a credential: argument, then process env, then env file
    pub fn credential(&self, name: &str) -> Option<SecretString> {
        self.credentials.resolve(name, &self.env)
    }

    /// Like [`ResolvedConfig::credential`], failing when nothing supplies it
    pub fn require_credential(&self, name: &str) -> Result<SecretString> {
        self.credentials.require(name, &self.env)
    }

    /// JSON description for diagnostics. Proxy URLs have credentials
    /// masked and secret values are never included.
    pub fn summary(&self) -> serde_json::Value {
        let mut proxy = serde_json::to_value(&self.proxy).unwrap_or_default();
        redact::scrub_proxy_urls(&mut proxy);
        let mut headers: Vec<&String> = self.headers.keys().collect();
        headers.sort();
        let mut credentials: Vec<&str> = self.credentials.names().collect();
        credentials.sort_unstable();

        json!({
            "flavor": self.flavor,
            "base_url": self.base_url,
            "proxy": proxy,
            "trust_env": self.trust_env,
            "timeout_ms": self.timeout.as_millis() as u64,
            "verify_tls": self.transport.verify_tls.unwrap_or(true),
            "default_headers": headers,
            "credentials": credentials,
            "env_file": self.env.file_path().map(|p| p.display().to_string()),
        })
    }
}

impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut proxy = serde_json::to_value(&self.proxy).unwrap_or_default();
        redact::scrub_proxy_urls(&mut proxy);
        let mut headers: Vec<&String> = self.headers.keys().collect();
        headers.sort();

        f.debug_struct("ResolvedConfig")
            .field("flavor", &self.flavor)
            .field("base_url", &self.base_url)
            .field("headers", &headers)
            .field("proxy", &proxy)
            .field("timeout", &self.timeout)
            .field("trust_env", &self.trust_env)
            .field("credentials", &self.credentials)
            .field("env", &self.env)
            .finish()
    }
}
