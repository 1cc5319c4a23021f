//! Request brokers
//!
//! A broker owns one HTTP session, built once from a [`BrokerOptions`] and
//! never reconfigured. Two flavors share every piece of request assembly:
//!
//! - [`Broker`] blocks the calling thread
//! - [`AsyncBroker`] suspends on I/O and backoff
//!
//! Each call merges its [`RequestOptions`] with the broker defaults, sends,
//! buffers the response, and retries transient failures under the
//! [`RetryPolicy`] in force. Non-success statuses come back as
//! [`Error::HttpStatus`](crate::Error::HttpStatus).
//!
//! [`BrokerOptions`]: crate::config::BrokerOptions

mod asynchronous;
mod blocking;
mod lifecycle;
mod request;
mod response;
mod retry;
mod shared;
mod transport;

pub use asynchronous::AsyncBroker;
pub use blocking::Broker;
pub use lifecycle::Lifecycle;
pub use request::{Body, Call, RequestOptions};
pub use response::ApiResponse;
pub use retry::RetryPolicy;

pub(crate) use transport::RequestBuilderExt;
