//! State and request preparation shared by both broker flavors

use super::request::{Call, PreparedRequest};
use super::response::ApiResponse;
use super::retry::RetryPolicy;
use crate::auth::Auth;
use crate::cassette::{CassetteRecorder, RecordedRequest, RecordedResponse};
use crate::config::{BrokerOptions, ResolvedConfig};
use crate::error::{Error, Result};
use crate::redact;
use crate::types::{Flavor, Method};
use std::time::Duration;
use tracing::{info, warn};

pub(crate) struct BrokerCore {
    config: ResolvedConfig,
    auth: Option<Auth>,
    retry: Option<RetryPolicy>,
    enable_logging: bool,
    recorder: Option<CassetteRecorder>,
}

impl BrokerCore {
    pub fn new(options: &BrokerOptions, flavor: Flavor) -> Result<Self> {
        let config = ResolvedConfig::resolve(options, flavor)?;
        Ok(Self {
            config,
            auth: options.auth.clone(),
            retry: options.retry.clone(),
            enable_logging: options.enable_logging,
            recorder: options.recorder.clone(),
        })
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    pub fn recorder(&self) -> Option<&CassetteRecorder> {
        self.recorder.as_ref()
    }

    /// Absolute targets pass through; anything else is joined onto the base URL
    pub fn build_url(&self, target: &str) -> Result<String> {
        if target.starts_with("http://") || target.starts_with("https://") {
            return Ok(target.to_string());
        }

        let base = self.config.base_url();
        if base.is_empty() {
            return Err(Error::invalid_parameter(format!(
                "relative target '{target}' needs a base URL"
            )));
        }
        let path = target.trim_start_matches('/');
        if path.is_empty() {
            return Ok(base.to_string());
        }
        Ok(format!("{base}/{path}"))
    }

    /// Merge a call with the broker defaults
    pub fn prepare(&self, call: Call) -> Result<PreparedRequest> {
        let Call {
            method,
            target,
            options,
        } = call;

        let url = self.build_url(&target)?;

        let mut headers: Vec<(String, String)> = self
            .config
            .headers()
            .iter()
            .filter(|(name, _)| !contains_header(options.headers.keys(), name))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        headers.extend(options.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

        // an explicit header of the same name beats broker-level auth
        let auth = match options.auth {
            Some(auth) => Some(auth),
            None => self.auth.clone().filter(|auth| {
                auth.header_name()
                    .map_or(true, |name| !contains_header(options.headers.keys(), name))
            }),
        };

        let (timeout, version, dedicated_transport) = match &options.transport {
            Some(transport) => {
                transport.validate()?;
                let dedicated = transport
                    .needs_dedicated_client()
                    .then(|| self.config.transport().overlay(transport));
                (transport.timeout, transport.http_version, dedicated)
            }
            None => (None, None, None),
        };

        Ok(PreparedRequest {
            method,
            url,
            headers,
            query: options.query,
            body: options.body,
            auth,
            timeout,
            version,
            retry: options.retry,
            dedicated_transport,
        })
    }

    /// The call's policy, else the broker's, else a single attempt
    pub fn retry_policy(&self, prepared: &PreparedRequest) -> RetryPolicy {
        prepared
            .retry
            .clone()
            .or_else(|| self.retry.clone())
            .unwrap_or_else(RetryPolicy::none)
    }

    /// Timeout in force for a prepared request
    pub fn effective_timeout(&self, prepared: &PreparedRequest) -> Duration {
        prepared.timeout.unwrap_or_else(|| self.config.timeout())
    }

    /// Map transport failures, turning timeouts into [`Error::Timeout`]
    pub fn transport_error(&self, prepared: &PreparedRequest, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            return Error::Timeout {
                timeout_ms: self.effective_timeout(prepared).as_millis() as u64,
            };
        }
        Error::from(error)
    }

    pub fn log_attempt(
        &self,
        method: Method,
        url: &str,
        status: Option<u16>,
        elapsed: Duration,
        attempt: u32,
    ) {
        if !self.enable_logging {
            return;
        }
        info!(
            method = %method,
            target = %redact::scrub_url(url),
            status,
            duration_ms = elapsed.as_millis() as u64,
            attempt,
            "API request"
        );
    }

    pub fn log_retry(&self, method: Method, url: &str, error: &Error, attempt: u32, delay: Duration) {
        if !self.enable_logging {
            return;
        }
        warn!(
            method = %method,
            target = %redact::scrub_url(url),
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Retrying request"
        );
    }

    pub fn log_failure(&self, method: Method, url: &str, error: &Error, attempts: u32) {
        if !self.enable_logging {
            return;
        }
        warn!(
            method = %method,
            target = %redact::scrub_url(url),
            attempts,
            error = %error,
            "Request failed"
        );
    }

    /// Hand an exchange to the recorder, if any
    pub fn record(&self, request: Option<RecordedRequest>, response: &ApiResponse) {
        if let (Some(recorder), Some(request)) = (&self.recorder, request) {
            recorder.record(
                request,
                RecordedResponse::capture(response.status(), response.headers(), response.bytes()),
            );
        }
    }
}

fn contains_header<'a>(mut names: impl Iterator<Item = &'a String>, name: &str) -> bool {
    names.any(|candidate| candidate.eq_ignore_ascii_case(name))
}

impl std::fmt::Debug for BrokerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerCore")
            .field("config", &self.config)
            .field("has_auth", &self.auth.is_some())
            .field("retry", &self.retry)
            .field("enable_logging", &self.enable_logging)
            .field("recording", &self.recorder.is_some())
            .finish()
    }
}
