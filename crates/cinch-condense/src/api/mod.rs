//! LLM transport layer: the seam the condenser calls through, plus retry.
//!
//! - [`SummaryTransport`]: object-safe trait for "send this request, give me
//!   the raw reply text". [`OpenRouterClient`](crate::OpenRouterClient)
//!   implements it; tests and embedding runtimes supply their own.
//! - [`retry`]: transient error detection (429, 5xx, network timeouts) with
//!   exponential backoff. Never retries 400/401 errors.

pub mod retry;

pub use retry::RetryConfig;

use crate::{ChatRequest, OpenRouterClient};
use std::future::Future;
use std::pin::Pin;
use tracing::warn;

/// Boxed future returned by [`SummaryTransport::complete`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>>;

/// Anything that can turn a chat request into raw reply text.
///
/// Cancellation and timeouts are the transport's business: a cancelled or
/// timed-out call simply returns `Err`.
///
/// # Example
///
/// ```ignore
/// struct Canned(String);
///
/// impl SummaryTransport for Canned {
///     fn complete<'a>(&'a self, _request: &'a ChatRequest) -> TransportFuture<'a> {
///         Box::pin(async move { Ok(self.0.clone()) })
///     }
/// }
/// ```
pub trait SummaryTransport: Send + Sync {
    /// Uses a boxed future so that the trait is dyn-compatible (object-safe).
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> TransportFuture<'a>;
}

impl SummaryTransport for OpenRouterClient {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> TransportFuture<'a> {
        Box::pin(self.chat(request))
    }
}

impl<T: SummaryTransport + ?Sized> SummaryTransport for &T {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> TransportFuture<'a> {
        (**self).complete(request)
    }
}

/// Call the transport, retrying transient failures per `retry`.
pub async fn complete_with_retry<T: SummaryTransport + ?Sized>(
    transport: &T,
    request: &ChatRequest,
    retry: &RetryConfig,
) -> Result<String, String> {
    let mut attempt = 0;
    loop {
        match transport.complete(request).await {
            Ok(text) => return Ok(text),
            Err(e) if attempt < retry.max_retries && retry::is_transient_error(&e) => {
                let delay = retry.delay_for_attempt(attempt);
                attempt += 1;
                warn!(
                    "Transient summarization error: {e}. Retrying in {:.1}s ({attempt}/{})",
                    delay.as_secs_f64(),
                    retry.max_retries
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
