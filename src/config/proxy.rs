//! Proxy configuration and precedence

use super::env::EnvSource;
use crate::error::{Error, Result};
use crate::types::Flavor;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// URL scheme a mount applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
    /// Fallback for any scheme without its own mount
    All,
}

impl Scheme {
    /// Lower-case scheme name
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::All => "all",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = Error;

    /// Accepts `http`, `https`, `all`, with or without a trailing `://`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_end_matches("://").to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            "all" => Ok(Scheme::All),
            other => Err(Error::config(format!(
                "unsupported mount scheme '{other}' (expected http, https or all)"
            ))),
        }
    }
}

/// Per-scheme proxy routing table
pub type Mounts = BTreeMap<Scheme, String>;

/// Proxy settings the transport is built with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProxyConfig {
    /// Never use a proxy, ignoring the process environment
    Disabled,
    /// One proxy for every scheme
    Single {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        no_proxy: Option<String>,
    },
    /// A proxy per scheme
    PerScheme {
        mounts: Mounts,
        #[serde(skip_serializing_if = "Option::is_none")]
        no_proxy: Option<String>,
    },
    /// Let the transport read proxy variables from the process environment
    Ambient,
}

impl ProxyConfig {
    /// Proxy used for requests with the given scheme
    pub fn url_for(&self, scheme: Scheme) -> Option<&str> {
        match self {
            ProxyConfig::Single { url, .. } => Some(url),
            ProxyConfig::PerScheme { mounts, .. } => mounts
                .get(&scheme)
                .or_else(|| mounts.get(&Scheme::All))
                .map(String::as_str),
            ProxyConfig::Disabled | ProxyConfig::Ambient => None,
        }
    }

    pub fn is_per_scheme(&self) -> bool {
        matches!(self, ProxyConfig::PerScheme { .. })
    }
}

/// Where the resolved proxy came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxySource {
    MountsArgument,
    ProxyArgument,
    Environment,
    Ambient,
    Disabled,
}

/// Proxy configuration after precedence has been applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedProxy {
    pub config: ProxyConfig,
    pub source: ProxySource,
}

impl ResolvedProxy {
    fn new(config: ProxyConfig, source: ProxySource) -> Self {
        Self { config, source }
    }

    /// Fail when the flavor's transport cannot express this configuration
    pub fn validate_for(&self, flavor: Flavor) -> Result<()> {
        if flavor == Flavor::Async && self.config.is_per_scheme() {
            return Err(Error::config(
                "per-scheme proxies are not supported by the async broker; \
                 use a single proxy, or set HTTP_PROXY and HTTPS_PROXY to the same value",
            ));
        }
        Ok(())
    }
}

/// Parse the raw `mounts` argument
pub(crate) fn parse_mounts(raw: &BTreeMap<String, String>) -> Result<Mounts> {
    raw.iter()
        .map(|(scheme, url)| {
            let scheme: Scheme = scheme.parse()?;
            validate_proxy_url(url)?;
            Ok((scheme, url.clone()))
        })
        .collect()
}

fn validate_proxy_url(url: &str) -> Result<()> {
    Url::parse(url)?;
    Ok(())
}

/// Apply the proxy precedence chain
pub(crate) fn resolve_proxy(
    mounts: &BTreeMap<String, String>,
    proxy: Option<&str>,
    load_env_vars: bool,
    trust_env: bool,
    env: &EnvSource,
) -> Result<ResolvedProxy> {
    if !mounts.is_empty() {
        let mounts = parse_mounts(mounts)?;
        return Ok(ResolvedProxy::new(
            ProxyConfig::PerScheme {
                mounts,
                no_proxy: None,
            },
            ProxySource::MountsArgument,
        ));
    }

    if let Some(url) = proxy {
        validate_proxy_url(url)?;
        return Ok(ResolvedProxy::new(
            ProxyConfig::Single {
                url: url.to_string(),
                no_proxy: None,
            },
            ProxySource::ProxyArgument,
        ));
    }

    if load_env_vars {
        if let Some(config) = proxy_from_env(env)? {
            return Ok(ResolvedProxy::new(config, ProxySource::Environment));
        }
    }

    if trust_env {
        Ok(ResolvedProxy::new(ProxyConfig::Ambient, ProxySource::Ambient))
    } else {
        Ok(ResolvedProxy::new(
            ProxyConfig::Disabled,
            ProxySource::Disabled,
        ))
    }
}

/// Read proxy variables from a loaded environment.
///
/// Distinct `HTTP_PROXY` / `HTTPS_PROXY` values become a per-scheme table;
/// otherwise the first of `ALL_PROXY`, `HTTPS_PROXY`, `HTTP_PROXY` applies to
/// every scheme.
pub(crate) fn proxy_from_env(env: &EnvSource) -> Result<Option<ProxyConfig>> {
    let all = env.get("ALL_PROXY");
    let http = env.get("HTTP_PROXY");
    let https = env.get("HTTPS_PROXY");
    let no_proxy = env.get("NO_PROXY").map(str::to_string);

    if let (Some(http), Some(https)) = (http, https) {
        if http != https {
            validate_proxy_url(http)?;
            validate_proxy_url(https)?;
            let mut mounts = Mounts::new();
            mounts.insert(Scheme::Http, http.to_string());
            mounts.insert(Scheme::Https, https.to_string());
            return Ok(Some(ProxyConfig::PerScheme { mounts, no_proxy }));
        }
    }

    match all.or(https).or(http) {
        Some(url) => {
            validate_proxy_url(url)?;
            Ok(Some(ProxyConfig::Single {
                url: url.to_string(),
                no_proxy,
            }))
        }
        None => Ok(None),
    }
}
