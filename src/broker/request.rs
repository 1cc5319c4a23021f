//! Per-call request description

use super::retry::RetryPolicy;
use crate::auth::Auth;
use crate::config::TransportOptions;
use crate::types::{HttpVersion, JsonValue, Method, StringMap};
use std::time::Duration;

/// Request body
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Serialized as JSON
    Json(JsonValue),
    /// Serialized as `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// Sent as-is
    Text(String),
}

/// Per-call parameters, merged with the broker defaults at dispatch.
///
/// Nothing here ever changes the broker itself.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// Request headers; these win over broker defaults of the same name
    pub headers: StringMap,
    /// Request body
    pub body: Option<Body>,
    /// Replaces the broker-level auth for this call
    pub auth: Option<Auth>,
    /// Replaces the broker retry policy for this call
    pub retry: Option<RetryPolicy>,
    /// Transport overrides for this call only
    pub transport: Option<TransportOptions>,
}

impl RequestOptions {
    /// Create a new request options set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add several query parameters
    #[must_use]
    pub fn queries<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    /// Set form body
    #[must_use]
    pub fn form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.body = Some(Body::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    /// Set raw text body
    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Body::Text(body.into()));
        self
    }

    /// Authenticate this call differently
    #[must_use]
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Override the retry policy
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Override transport settings
    #[must_use]
    pub fn transport(mut self, transport: TransportOptions) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let transport = self.transport.take().unwrap_or_default();
        self.transport = Some(transport.timeout(timeout));
        self
    }
}

/// A request that either broker flavor can send.
///
/// Connectors build `Call`s once and hand them to whichever broker they own.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    /// Absolute URL, or a path joined onto the broker base URL
    pub target: String,
    pub options: RequestOptions,
}

impl Call {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::POST, target)
    }

    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// A call merged with broker defaults, ready to be turned into a request
#[derive(Debug, Clone)]
pub(crate) struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Body>,
    pub auth: Option<Auth>,
    pub timeout: Option<Duration>,
    pub version: Option<HttpVersion>,
    pub retry: Option<RetryPolicy>,
    /// Full transport settings for a one-off client, when the call needs one
    pub dedicated_transport: Option<TransportOptions>,
}
