//! DomainTools connector

use super::{connector_options, log_operation, owned_pairs};
use crate::auth::Auth;
use crate::broker::{ApiResponse, AsyncBroker, Broker, Call, Lifecycle, RequestOptions};
use crate::config::BrokerOptions;
use crate::error::{Error, Result};
use crate::types::Flavor;
use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

/// Default API endpoint
pub const DOMAINTOOLS_BASE_URL: &str = "https://api.domaintools.com";

/// Credential name for the API key
pub const DOMAINTOOLS_API_KEY: &str = "DOMAINTOOLS_API_KEY";

const API_KEY_HEADER: &str = "X-API-KEY";

/// Search and filter fields accepted by Iris Investigate
pub const IRIS_INVESTIGATE_PARAMS: &[&str] = &[
    "active",
    "adsense",
    "baidu_analytics",
    "contact_name",
    "contact_phone",
    "contact_street",
    "create_date",
    "domain",
    "email",
    "email_dns_soa",
    "email_domain",
    "expiration_date",
    "facebook",
    "first_seen_since",
    "first_seen_within",
    "google_analytics",
    "google_analytics_4",
    "google_tag_manager",
    "historical_email",
    "historical_free_text",
    "historical_registrant",
    "hotjar",
    "iana_id",
    "ip",
    "ip_country_code",
    "mailserver_domain",
    "mailserver_host",
    "mailserver_ip",
    "matomo",
    "nameserver_domain",
    "nameserver_host",
    "nameserver_ip",
    "not_tagged_with_all",
    "not_tagged_with_any",
    "rank",
    "redirect_domain",
    "registrant",
    "registrant_org",
    "registrar",
    "risk_score",
    "search_hash",
    "server_type",
    "ssl_alt_names",
    "ssl_common_name",
    "ssl_duration",
    "ssl_email",
    "ssl_hash",
    "ssl_issuer_common_name",
    "ssl_not_after",
    "ssl_not_before",
    "ssl_org",
    "ssl_subject",
    "statcounter_project",
    "statcounter_security",
    "tagged_with_all",
    "tagged_with_any",
    "tld",
    "website_title",
    "whois",
    "yandex_metrica",
];

static IRIS_ALLOWED: Lazy<HashSet<&'static str>> =
    Lazy::new(|| IRIS_INVESTIGATE_PARAMS.iter().copied().collect());

pub(super) fn validate_iris_params(params: &[(&str, &str)]) -> Result<()> {
    if params.is_empty() {
        return Err(Error::invalid_parameter(
            "At least one Iris Investigate parameter is required",
        ));
    }

    let mut invalid: Vec<&str> = params
        .iter()
        .map(|(k, _)| *k)
        .filter(|k| !IRIS_ALLOWED.contains(k))
        .collect();
    if invalid.is_empty() {
        return Ok(());
    }
    invalid.sort_unstable();
    invalid.dedup();
    Err(Error::invalid_parameter(format!(
        "Invalid Iris Investigate parameters: {}",
        invalid.join(", ")
    )))
}

// Request shapes shared by both connector flavors

fn iris_investigate_call(params: &[(&str, &str)]) -> Result<Call> {
    validate_iris_params(params)?;
    Ok(Call::get("/v1/iris-investigate")
        .with_options(RequestOptions::new().queries(owned_pairs(params))))
}

fn parsed_whois_call(query: &str, options: RequestOptions) -> Call {
    Call::get(format!("v1/{query}/whois/parsed")).with_options(options)
}

fn reverse_ip_call(query: &str, options: RequestOptions) -> Call {
    Call::get(format!("v1/{query}/reverse-ip")).with_options(options)
}

fn reverse_nameserver_call(query: &str, options: RequestOptions) -> Call {
    Call::get(format!("v1/{query}/name-server-domains")).with_options(options)
}

fn build_options(
    api_key: Option<String>,
    options: BrokerOptions,
    flavor: Flavor,
) -> Result<(BrokerOptions, SecretString)> {
    let (mut options, key) = connector_options(
        options,
        DOMAINTOOLS_BASE_URL,
        DOMAINTOOLS_API_KEY,
        api_key,
        flavor,
    )?;
    options.auth = Some(Auth::api_key_header(API_KEY_HEADER, key.expose_secret()));
    Ok((options, key))
}

/// DomainTools API on the blocking broker
#[derive(Debug)]
pub struct DomainToolsConnector {
    broker: Broker,
    api_key: SecretString,
    enable_logging: bool,
}

impl DomainToolsConnector {
    /// Create a connector. `api_key` wins over `DOMAINTOOLS_API_KEY` from the
    /// environment; a non-empty `options.base_url` replaces the default endpoint.
    pub fn new(api_key: Option<String>, options: BrokerOptions) -> Result<Self> {
        let (options, api_key) = build_options(api_key, options, Flavor::Blocking)?;
        let enable_logging = options.enable_logging;
        Ok(Self {
            broker: Broker::new(options)?,
            api_key,
            enable_logging,
        })
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// The underlying broker, for endpoints without a typed method
    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    /// Reverse search across domain records on one or more Iris fields
    pub fn iris_investigate(&self, params: &[(&str, &str)]) -> Result<ApiResponse> {
        log_operation(self.enable_logging, "iris_investigate", None, params);
        self.broker.send(iris_investigate_call(params)?)
    }

    /// Parsed WHOIS record for a domain name or IP address
    pub fn parsed_whois(&self, query: &str, options: RequestOptions) -> Result<ApiResponse> {
        log_operation(self.enable_logging, "parsed_whois", Some(query), &[]);
        self.broker.send(parsed_whois_call(query, options))
    }

    /// Domains hosted on the same IP address as `query`
    pub fn reverse_ip(&self, query: &str, options: RequestOptions) -> Result<ApiResponse> {
        log_operation(self.enable_logging, "reverse_ip", Some(query), &[]);
        self.broker.send(reverse_ip_call(query, options))
    }

    /// Domains that share the name server `query`
    pub fn reverse_nameserver(&self, query: &str, options: RequestOptions) -> Result<ApiResponse> {
        log_operation(self.enable_logging, "reverse_nameserver", Some(query), &[]);
        self.broker.send(reverse_nameserver_call(query, options))
    }

    /// Run `f` with this connector, then close it
    pub fn scope<T>(mut self, f: impl FnOnce(&Self) -> T) -> T {
        let out = f(&self);
        self.close();
        out
    }
}

impl Lifecycle for DomainToolsConnector {
    fn close(&mut self) {
        self.broker.close();
    }

    fn is_closed(&self) -> bool {
        self.broker.is_closed()
    }
}

/// DomainTools API on the async broker
#[derive(Debug)]
pub struct AsyncDomainToolsConnector {
    broker: AsyncBroker,
    api_key: SecretString,
    enable_logging: bool,
}

impl AsyncDomainToolsConnector {
    /// Create a connector. `api_key` wins over `DOMAINTOOLS_API_KEY` from the
    /// environment; a non-empty `options.base_url` replaces the default endpoint.
    pub fn new(api_key: Option<String>, options: BrokerOptions) -> Result<Self> {
        let (options, api_key) = build_options(api_key, options, Flavor::Async)?;
        let enable_logging = options.enable_logging;
        Ok(Self {
            broker: AsyncBroker::new(options)?,
            api_key,
            enable_logging,
        })
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// The underlying broker, for endpoints without a typed method
    pub fn broker(&self) -> &AsyncBroker {
        &self.broker
    }

    /// Reverse search across domain records on one or more Iris fields
    pub async fn iris_investigate(&self, params: &[(&str, &str)]) -> Result<ApiResponse> {
        log_operation(self.enable_logging, "iris_investigate", None, params);
        self.broker.send(iris_investigate_call(params)?).await
    }

    /// Parsed WHOIS record for a domain name or IP address
    pub async fn parsed_whois(&self, query: &str, options: RequestOptions) -> Result<ApiResponse> {
        log_operation(self.enable_logging, "parsed_whois", Some(query), &[]);
        self.broker.send(parsed_whois_call(query, options)).await
    }

    /// Domains hosted on the same IP address as `query`
    pub async fn reverse_ip(&self, query: &str, options: RequestOptions) -> Result<ApiResponse> {
        log_operation(self.enable_logging, "reverse_ip", Some(query), &[]);
        self.broker.send(reverse_ip_call(query, options)).await
    }

    /// Domains that share the name server `query`
    pub async fn reverse_nameserver(
        &self,
        query: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        log_operation(self.enable_logging, "reverse_nameserver", Some(query), &[]);
        self.broker.send(reverse_nameserver_call(query, options)).await
    }

    /// Run `f` with this connector, then close it
    pub async fn scope<T, F>(mut self, f: F) -> T
    where
        F: for<'a> FnOnce(&'a Self) -> Pin<Box<dyn Future<Output = T> + 'a>>,
    {
        let out = f(&self).await;
        self.close();
        out
    }
}

impl Lifecycle for AsyncDomainToolsConnector {
    fn close(&mut self) {
        self.broker.close();
    }

    fn is_closed(&self) -> bool {
        self.broker.is_closed()
    }
}
