//! Wait-until-reset retry for throttled GitHub calls.
//!
//! Every fetch goes through a small state machine: `Fetching` issues the request,
//! a throttling response moves to `Waiting` until the reset time, and a
//! successful response ends in `Done`. A retried fetch starts from scratch.

use chrono::{DateTime, Utc};
use log::warn;
use std::future::Future;
use std::time::Duration;

use crate::error::ApiError;

#[derive(Debug)]
enum FetchState<T> {
    Fetching,
    Waiting(Duration),
    Done(T),
}

/// How long to wait for a rate limit that resets at `reset_at`.
pub fn backoff_delay(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (reset_at - now).to_std().unwrap_or(Duration::ZERO)
}

/// Run `fetch` until it succeeds or fails with something other than throttling.
///
/// There is no retry limit: a permanently throttled API stalls here.
pub async fn with_backoff<T, F, Fut>(what: &str, mut fetch: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut state = FetchState::Fetching;
    loop {
        state = match state {
            FetchState::Fetching => match fetch().await {
                Ok(value) => FetchState::Done(value),
                Err(ApiError::RateLimited { reset_at }) => {
                    let delay = backoff_delay(reset_at, Utc::now());
                    warn!(
                        "Rate limited while fetching {}, waiting {}s until {}",
                        what,
                        delay.as_secs(),
                        reset_at
                    );
                    FetchState::Waiting(delay)
                }
                Err(e) => return Err(e),
            },
            FetchState::Waiting(delay) => {
                tokio::time::sleep(delay).await;
                FetchState::Fetching
            }
            FetchState::Done(value) => return Ok(value),
        };
    }
}
