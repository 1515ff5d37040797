//! Ordered, lazy provider fallback.
//!
//! An adapter describes each provider as an [`Attempt`]: a name plus a future
//! that has not been polled yet. [`first_available`] drives them one at a
//! time; the first success wins and the remaining futures are dropped without
//! ever being polled, so no request is issued for them.

use std::future::Future;

use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, warn};

/// One provider attempt within a feed.
pub struct Attempt<'a, T> {
    pub provider: String,
    future: BoxFuture<'a, Result<T>>,
}

impl<'a, T> Attempt<'a, T> {
    pub fn new(
        provider: impl Into<String>,
        future: impl Future<Output = Result<T>> + Send + 'a,
    ) -> Self {
        Self {
            provider: provider.into(),
            future: future.boxed(),
        }
    }
}

/// A value together with the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub provider: String,
}

/// Run `attempts` strictly in order and return the first success.
///
/// Each failure is logged at `warn` with the feed and provider name. Returns
/// `None` once every attempt has failed (or if there were none).
pub async fn first_available<T>(feed: &str, attempts: Vec<Attempt<'_, T>>) -> Option<Sourced<T>> {
    let total = attempts.len();

    for (i, attempt) in attempts.into_iter().enumerate() {
        let Attempt { provider, future } = attempt;
        match future.await {
            Ok(value) => {
                debug!(feed, provider = %provider, attempt = i + 1, total, "provider succeeded");
                return Some(Sourced { value, provider });
            }
            Err(e) => {
                warn!(
                    feed,
                    provider = %provider,
                    attempt = i + 1,
                    total,
                    error = %format!("{e:#}"),
                    "provider failed, trying next"
                );
            }
        }
    }

    warn!(feed, total, "all providers failed");
    None
}
