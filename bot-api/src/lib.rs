//! # bot-api
//!
//! Bot API client. Every call made through [`ApiClient`] flows through an ordered stack of
//! [`Transformer`]s and ends at a [`Transport`]:
//!
//! ```text
//! ApiClient::call -> transformer[0] -> transformer[1] -> ... -> Transport::send
//! ```
//!
//! [`AutoRetry`] is the transformer that resubmits failed requests. Transformers installed after it sit
//! closer to the transport and therefore observe every attempt, retries included.

mod client;
mod payloads;
mod request;
mod retry;
mod transformer;
mod transport;

pub use client::ApiClient;
pub use payloads::{GetUpdates, InputFile, SendMessage, SendPhoto};
pub use request::Request;
pub use retry::{AutoRetry, RetryConfig, RetryConfigBuilder, RetryConfigError, RetryState};
pub use transformer::{Next, TraceRequests, Transformer};
pub use transport::{mask_token, HttpTransport, Transport, DEFAULT_API_URL};

pub use bot_core::{ApiError, ApiResult, ErrorKind};
