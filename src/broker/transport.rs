//! One surface over the blocking and async reqwest builders
//!
//! reqwest's blocking and async clients expose the same builder methods on
//! distinct types. These traits let client configuration and request
//! assembly be written once and used by both broker flavors.

use super::request::{Body, PreparedRequest};
use crate::config::{PassThrough, ProxyConfig, Scheme, TransportOptions};
use crate::error::{Error, Result};
use crate::redact;
use crate::types::{HttpVersion, JsonValue};
use reqwest::{NoProxy, Proxy};
use std::time::Duration;

/// Client builder operations used by the brokers
pub(crate) trait ClientBuilderExt: Sized {
    fn with_timeout(self, timeout: Duration) -> Self;
    fn with_connect_timeout(self, timeout: Duration) -> Self;
    fn with_invalid_certs(self, accept: bool) -> Self;
    fn with_http1_only(self) -> Self;
    fn with_http2_prior_knowledge(self) -> Self;
    fn with_proxy(self, proxy: Proxy) -> Self;
    fn without_proxy(self) -> Self;
    fn with_user_agent(self, agent: String) -> Self;
    fn with_pool_max_idle_per_host(self, max: usize) -> Self;
    fn with_pool_idle_timeout(self, timeout: Duration) -> Self;
    fn with_tcp_nodelay(self, enabled: bool) -> Self;
    fn with_https_only(self, enabled: bool) -> Self;
    fn with_max_redirects(self, max: usize) -> Self;
    fn with_referer(self, enabled: bool) -> Self;
}

/// Request builder operations used by the brokers
pub(crate) trait RequestBuilderExt: Sized {
    fn with_header(self, name: &str, value: &str) -> Self;
    fn with_query(self, pairs: &[(String, String)]) -> Self;
    fn with_json(self, body: &JsonValue) -> Self;
    fn with_form(self, fields: &[(String, String)]) -> Self;
    fn with_text(self, body: String) -> Self;
    fn with_basic_auth(self, username: &str, password: &str) -> Self;
    fn with_bearer(self, token: &str) -> Self;
    fn with_timeout(self, timeout: Duration) -> Self;
    fn with_version(self, version: reqwest::Version) -> Self;
}

macro_rules! impl_client_builder {
    ($ty:ty) => {
        impl ClientBuilderExt for $ty {
            fn with_timeout(self, timeout: Duration) -> Self {
                self.timeout(timeout)
            }
            fn with_connect_timeout(self, timeout: Duration) -> Self {
                self.connect_timeout(timeout)
            }
            fn with_invalid_certs(self, accept: bool) -> Self {
                self.danger_accept_invalid_certs(accept)
            }
            fn with_http1_only(self) -> Self {
                self.http1_only()
            }
            fn with_http2_prior_knowledge(self) -> Self {
                self.http2_prior_knowledge()
            }
            fn with_proxy(self, proxy: Proxy) -> Self {
                self.proxy(proxy)
            }
            fn without_proxy(self) -> Self {
                self.no_proxy()
            }
            fn with_user_agent(self, agent: String) -> Self {
                self.user_agent(agent)
            }
            fn with_pool_max_idle_per_host(self, max: usize) -> Self {
                self.pool_max_idle_per_host(max)
            }
            fn with_pool_idle_timeout(self, timeout: Duration) -> Self {
                self.pool_idle_timeout(timeout)
            }
            fn with_tcp_nodelay(self, enabled: bool) -> Self {
                self.tcp_nodelay(enabled)
            }
            fn with_https_only(self, enabled: bool) -> Self {
                self.https_only(enabled)
            }
            fn with_max_redirects(self, max: usize) -> Self {
                self.redirect(reqwest::redirect::Policy::limited(max))
            }
            fn with_referer(self, enabled: bool) -> Self {
                self.referer(enabled)
            }
        }
    };
}

macro_rules! impl_request_builder {
    ($ty:ty) => {
        impl RequestBuilderExt for $ty {
            fn with_header(self, name: &str, value: &str) -> Self {
                self.header(name, value)
            }
            fn with_query(self, pairs: &[(String, String)]) -> Self {
                self.query(pairs)
            }
            fn with_json(self, body: &JsonValue) -> Self {
                self.json(body)
            }
            fn with_form(self, fields: &[(String, String)]) -> Self {
                self.form(fields)
            }
            fn with_text(self, body: String) -> Self {
                self.body(body)
            }
            fn with_basic_auth(self, username: &str, password: &str) -> Self {
                self.basic_auth(username, Some(password))
            }
            fn with_bearer(self, token: &str) -> Self {
                self.bearer_auth(token)
            }
            fn with_timeout(self, timeout: Duration) -> Self {
                self.timeout(timeout)
            }
            fn with_version(self, version: reqwest::Version) -> Self {
                self.version(version)
            }
        }
    };
}

impl_client_builder!(reqwest::ClientBuilder);
impl_client_builder!(reqwest::blocking::ClientBuilder);
impl_request_builder!(reqwest::RequestBuilder);
impl_request_builder!(reqwest::blocking::RequestBuilder);

/// Apply timeouts, TLS, protocol, pass-through options and proxies
pub(crate) fn configure_client<B: ClientBuilderExt>(
    mut builder: B,
    timeout: Duration,
    transport: &TransportOptions,
    proxy: &ProxyConfig,
) -> Result<B> {
    builder = builder.with_timeout(transport.timeout.unwrap_or(timeout));

    if let Some(connect_timeout) = transport.connect_timeout {
        builder = builder.with_connect_timeout(connect_timeout);
    }
    if transport.verify_tls == Some(false) {
        builder = builder.with_invalid_certs(true);
    }
    match transport.http_version {
        Some(HttpVersion::Http1) => builder = builder.with_http1_only(),
        Some(HttpVersion::Http2) => builder = builder.with_http2_prior_knowledge(),
        None => {}
    }

    let extra = PassThrough::parse(&transport.extra)?;
    if let Some(agent) = extra.user_agent {
        builder = builder.with_user_agent(agent);
    }
    if let Some(max) = extra.pool_max_idle_per_host {
        builder = builder.with_pool_max_idle_per_host(max);
    }
    if let Some(idle) = extra.pool_idle_timeout {
        builder = builder.with_pool_idle_timeout(idle);
    }
    if let Some(nodelay) = extra.tcp_nodelay {
        builder = builder.with_tcp_nodelay(nodelay);
    }
    if let Some(https_only) = extra.https_only {
        builder = builder.with_https_only(https_only);
    }
    if let Some(max) = extra.max_redirects {
        builder = builder.with_max_redirects(max);
    }
    if let Some(referer) = extra.referer {
        builder = builder.with_referer(referer);
    }

    match proxy {
        ProxyConfig::Disabled => Ok(builder.without_proxy()),
        // reqwest reads HTTP_PROXY / HTTPS_PROXY / NO_PROXY itself when no
        // proxy is configured explicitly
        ProxyConfig::Ambient => Ok(builder),
        ProxyConfig::Single { url, no_proxy } => {
            let proxy = Proxy::all(url).map_err(|e| proxy_error(url, e))?;
            Ok(builder.with_proxy(with_exclusions(proxy, no_proxy.as_deref())))
        }
        ProxyConfig::PerScheme { mounts, no_proxy } => {
            for (scheme, url) in mounts {
                let proxy = match scheme {
                    Scheme::Http => Proxy::http(url),
                    Scheme::Https => Proxy::https(url),
                    Scheme::All => Proxy::all(url),
                }
                .map_err(|e| proxy_error(url, e))?;
                builder = builder.with_proxy(with_exclusions(proxy, no_proxy.as_deref()));
            }
            Ok(builder)
        }
    }
}

fn with_exclusions(proxy: Proxy, no_proxy: Option<&str>) -> Proxy {
    match no_proxy {
        Some(list) => proxy.no_proxy(NoProxy::from_string(list)),
        None => proxy,
    }
}

fn proxy_error(url: &str, e: reqwest::Error) -> Error {
    let e = e.without_url();
    Error::config(format!("invalid proxy '{}': {e}", redact::scrub_url(url)))
}

/// Put headers, query, auth, body and per-call overrides on a request
pub(crate) fn apply_request<B: RequestBuilderExt>(mut req: B, prepared: &PreparedRequest) -> B {
    for (name, value) in &prepared.headers {
        req = req.with_header(name, value);
    }
    if !prepared.query.is_empty() {
        req = req.with_query(&prepared.query);
    }
    if let Some(auth) = &prepared.auth {
        req = auth.apply(req);
    }
    match &prepared.body {
        Some(Body::Json(value)) => req = req.with_json(value),
        Some(Body::Form(fields)) => req = req.with_form(fields),
        Some(Body::Text(text)) => req = req.with_text(text.clone()),
        None => {}
    }
    if let Some(timeout) = prepared.timeout {
        req = req.with_timeout(timeout);
    }
    if let Some(version) = prepared.version {
        req = req.with_version(version.into());
    }
    req
}
