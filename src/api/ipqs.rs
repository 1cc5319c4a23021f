//! IPQualityScore connector

use super::{connector_options, log_operation};
use crate::broker::{ApiResponse, AsyncBroker, Broker, Call, Lifecycle, RequestOptions};
use crate::config::BrokerOptions;
use crate::error::Result;
use crate::types::Flavor;
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use std::pin::Pin;

/// Default API endpoint
pub const IPQS_BASE_URL: &str = "https://ipqualityscore.com/api/json";

/// Credential name for the API key
pub const IPQS_API_KEY: &str = "IPQS_API_KEY";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// the key travels in the form body, not in a header
fn malicious_url_call(query: &str, api_key: &SecretString, params: &[(&str, &str)]) -> Call {
    let mut fields = vec![
        ("url".to_string(), query.to_string()),
        ("key".to_string(), api_key.expose_secret().to_string()),
    ];
    fields.extend(
        params
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
    );
    Call::post("/url/").with_options(RequestOptions::new().form(fields))
}

fn build_options(
    api_key: Option<String>,
    options: BrokerOptions,
    flavor: Flavor,
) -> Result<(BrokerOptions, SecretString)> {
    let (mut options, key) =
        connector_options(options, IPQS_BASE_URL, IPQS_API_KEY, api_key, flavor)?;
    options
        .headers
        .insert("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string());
    Ok((options, key))
}

/// IPQualityScore malicious URL scanner on the blocking broker
#[derive(Debug)]
pub struct IpqsConnector {
    broker: Broker,
    api_key: SecretString,
    enable_logging: bool,
}

impl IpqsConnector {
    /// Create a connector. `api_key` wins over `IPQS_API_KEY` from the
    /// environment.
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

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    /// Scan a URL. Extra fields such as `strictness` or `fast` are sent
    /// alongside it.
    pub fn malicious_url(&self, query: &str, params: &[(&str, &str)]) -> Result<ApiResponse> {
        log_operation(self.enable_logging, "malicious_url", Some(query), params);
        self.broker
            .send(malicious_url_call(query, &self.api_key, params))
    }

    /// Run `f` with this connector, then close it
    pub fn scope<T>(mut self, f: impl FnOnce(&Self) -> T) -> T {
        let out = f(&self);
        self.close();
        out
    }
}

impl Lifecycle for IpqsConnector {
    fn close(&mut self) {
        self.broker.close();
    }

    fn is_closed(&self) -> bool {
        self.broker.is_closed()
    }
}

/// IPQualityScore malicious URL scanner on the async broker
#[derive(Debug)]
pub struct AsyncIpqsConnector {
    broker: AsyncBroker,
    api_key: SecretString,
    enable_logging: bool,
}

impl AsyncIpqsConnector {
    /// Create a connector. `api_key` wins over `IPQS_API_KEY` from the
    /// environment.
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

    pub fn broker(&self) -> &AsyncBroker {
        &self.broker
    }

    /// Scan a URL. Extra fields such as `strictness` or `fast` are sent
    /// alongside it.
    pub async fn malicious_url(&self, query: &str, params: &[(&str, &str)]) -> Result<ApiResponse> {
        log_operation(self.enable_logging, "malicious_url", Some(query), params);
        self.broker
            .send(malicious_url_call(query, &self.api_key, params))
            .await
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

impl Lifecycle for AsyncIpqsConnector {
    fn close(&mut self) {
        self.broker.close();
    }

    fn is_closed(&self) -> bool {
        self.broker.is_closed()
    }
}
