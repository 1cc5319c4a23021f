//! Blocking broker

use super::lifecycle::Lifecycle;
use super::shared::BrokerCore;
use super::request::{Call, PreparedRequest, RequestOptions};
use super::response::ApiResponse;
use super::transport::{apply_request, configure_client};
use crate::cassette::RecordedRequest;
use crate::config::{BrokerOptions, ResolvedConfig, TransportOptions};
use crate::error::{Error, Result};
use crate::types::{Flavor, Method};
use reqwest::blocking::Client;
use std::time::Instant;
use tracing::debug;

/// Request broker on a blocking HTTP session.
///
/// Calls block the calling thread, including during retry backoff. Do not
/// create or drop a `Broker` from inside an async runtime; use
/// [`AsyncBroker`](super::AsyncBroker) there.
#[derive(Debug)]
pub struct Broker {
    core: BrokerCore,
    session: Option<Client>,
}

impl Broker {
    /// Resolve `options` and open the session
    pub fn new(options: BrokerOptions) -> Result<Self> {
        let core = BrokerCore::new(&options, Flavor::Blocking)?;
        let session = build_client(&core, core.config().transport())?;
        debug!(base_url = %core.config().base_url(), "Opened blocking broker session");
        Ok(Self {
            core,
            session: Some(session),
        })
    }

    /// The configuration resolved at construction
    pub fn config(&self) -> &ResolvedConfig {
        self.core.config()
    }

    pub fn get(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::GET, target, options)
    }

    pub fn post(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::POST, target, options)
    }

    pub fn put(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::PUT, target, options)
    }

    pub fn patch(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::PATCH, target, options)
    }

    pub fn delete(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::DELETE, target, options)
    }

    pub fn head(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::HEAD, target, options)
    }

    /// Send a request with any method
    pub fn request(
        &self,
        method: Method,
        target: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.send(Call::new(method, target).with_options(options))
    }

    /// Send a prepared call, retrying transient failures under the policy in force
    pub fn send(&self, call: Call) -> Result<ApiResponse> {
        let session = self.session.as_ref().ok_or(Error::Closed)?;
        let prepared = self.core.prepare(call)?;

        let dedicated = match &prepared.dedicated_transport {
            Some(transport) => Some(build_client(&self.core, transport)?),
            None => None,
        };
        let client = dedicated.as_ref().unwrap_or(session);

        let policy = self.core.retry_policy(&prepared);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match self.attempt(client, &prepared, attempt) {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            match policy.should_retry(&error, attempt) {
                Some(delay) => {
                    self.core
                        .log_retry(prepared.method, &prepared.url, &error, attempt, delay);
                    std::thread::sleep(delay);
                }
                None => {
                    self.core
                        .log_failure(prepared.method, &prepared.url, &error, attempt);
                    return Err(error);
                }
            }
        }
    }

    /// Run `f` with this broker, then close it
    pub fn scope<T>(mut self, f: impl FnOnce(&Self) -> T) -> T {
        let out = f(&self);
        self.close();
        out
    }

    fn attempt(
        &self,
        client: &Client,
        prepared: &PreparedRequest,
        attempt: u32,
    ) -> Result<ApiResponse> {
        let request = apply_request(
            client.request(prepared.method.into(), &prepared.url),
            prepared,
        )
        .build()?;

        let recorded = self.core.recorder().map(|_| {
            RecordedRequest::capture(
                request.method(),
                request.url(),
                request.headers(),
                request.body().and_then(|b| b.as_bytes()),
            )
        });

        let started = Instant::now();
        let response = match client.execute(request) {
            Ok(response) => response,
            Err(e) => {
                self.core
                    .log_attempt(prepared.method, &prepared.url, None, started.elapsed(), attempt);
                return Err(self.core.transport_error(prepared, e));
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response
            .bytes()
            .map_err(|e| self.core.transport_error(prepared, e))?;
        let response = ApiResponse::new(status, headers, url, body, started.elapsed());

        self.core.log_attempt(
            prepared.method,
            &prepared.url,
            Some(response.status()),
            response.elapsed(),
            attempt,
        );
        self.core.record(recorded, &response);

        response.error_for_status()
    }
}

impl Lifecycle for Broker {
    fn close(&mut self) {
        if self.session.take().is_some() {
            debug!(base_url = %self.core.config().base_url(), "Closed blocking broker session");
        }
    }

    fn is_closed(&self) -> bool {
        self.session.is_none()
    }
}

impl Drop for Broker {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_client(core: &BrokerCore, transport: &TransportOptions) -> Result<Client> {
    let builder = configure_client(
        Client::builder(),
        core.config().timeout(),
        transport,
        &core.config().proxy().config,
    )?;
    Ok(builder.build()?)
}
