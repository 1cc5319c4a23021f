//! Async broker

use super::lifecycle::Lifecycle;
use super::shared::BrokerCore;
use super::request::{Call, PreparedRequest, RequestOptions};
use super::response::ApiResponse;
use super::transport::{apply_request, configure_client};
use crate::cassette::RecordedRequest;
use crate::config::{BrokerOptions, ResolvedConfig, TransportOptions};
use crate::error::{Error, Result};
use crate::types::{Flavor, Method};
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::debug;

/// Request broker on an async HTTP session.
///
/// Calls suspend on transport I/O and during retry backoff. Per-scheme proxy
/// mounts are not available on this flavor.
#[derive(Debug)]
pub struct AsyncBroker {
    core: BrokerCore,
    session: Option<Client>,
}

impl AsyncBroker {
    /// Resolve `options` and open the session
    pub fn new(options: BrokerOptions) -> Result<Self> {
        let core = BrokerCore::new(&options, Flavor::Async)?;
        let session = build_client(&core, core.config().transport())?;
        debug!(base_url = %core.config().base_url(), "Opened async broker session");
        Ok(Self {
            core,
            session: Some(session),
        })
    }

    /// The configuration resolved at construction
    pub fn config(&self) -> &ResolvedConfig {
        self.core.config()
    }

    pub async fn get(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::GET, target, options).await
    }

    pub async fn post(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::POST, target, options).await
    }

    pub async fn put(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::PUT, target, options).await
    }

    pub async fn patch(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::PATCH, target, options).await
    }

    pub async fn delete(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::DELETE, target, options).await
    }

    pub async fn head(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::HEAD, target, options).await
    }

    /// Send a request with any method
    pub async fn request(
        &self,
        method: Method,
        target: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.send(Call::new(method, target).with_options(options))
            .await
    }

    /// Send a prepared call, retrying transient failures under the policy in force
    pub async fn send(&self, call: Call) -> Result<ApiResponse> {
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
            let error = match self.attempt(client, &prepared, attempt).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            match policy.should_retry(&error, attempt) {
                Some(delay) => {
                    self.core
                        .log_retry(prepared.method, &prepared.url, &error, attempt, delay);
                    tokio::time::sleep(delay).await;
                }
                None => {
                    self.core
                        .log_failure(prepared.method, &prepared.url, &error, attempt);
                    return Err(error);
                }
            }
        }
    }

    /// Run `f` with this broker, then close it.
    ///
    /// ```rust,ignore
    /// let status = broker
    ///     .scope(|b| Box::pin(async move { b.get("/ping", RequestOptions::new()).await }))
    ///     .await?;
    /// ```
    pub async fn scope<T, F>(mut self, f: F) -> T
    where
        F: for<'a> FnOnce(&'a Self) -> Pin<Box<dyn Future<Output = T> + 'a>>,
    {
        let out = f(&self).await;
        self.close();
        out
    }

    async fn attempt(
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
                request.body().and_then(reqwest::Body::as_bytes),
            )
        });

        let started = Instant::now();
        let response = match client.execute(request).await {
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
            .await
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

impl Lifecycle for AsyncBroker {
    fn close(&mut self) {
        if self.session.take().is_some() {
            debug!(base_url = %self.core.config().base_url(), "Closed async broker session");
        }
    }

    fn is_closed(&self) -> bool {
        self.session.is_none()
    }
}

impl Drop for AsyncBroker {
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
