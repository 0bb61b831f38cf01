use std::time::Duration;

use async_trait::async_trait;
use flashloop_core::action::QUOTE_FAILED;
use tracing::warn;

use crate::error::ActionProcessingError;
use crate::provider::SwapQuoteProvider;
use crate::quote::{QuoteRequest, SwapQuote};

/// Clock used between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
  async fn sleep(&self, duration: Duration);
}

/// Wall-clock sleeper backed by the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
  async fn sleep(&self, duration: Duration) {
    tokio::time::sleep(duration).await;
  }
}

/// Fixed-delay retry settings for quote requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts before giving up.
  pub max_retries: u32,
  /// Pause between consecutive attempts.
  pub delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    RetryPolicy {
      max_retries: 5,
      delay: Duration::from_millis(1500),
    }
  }
}

/// Requests a quote, retrying with a fixed delay. A permanent provider
/// rejection ends the loop at once.
///
/// # Errors
/// * [`ActionProcessingError`] carrying [`QUOTE_FAILED`] and the last attempt's
///   error once `max_retries` attempts have failed or the provider rejected the
///   request outright
pub async fn get_swap_quote_with_retry<P, S>(
  provider: &P,
  sleeper: &S,
  request: &QuoteRequest,
  policy: RetryPolicy,
) -> Result<SwapQuote, ActionProcessingError>
where
  P: SwapQuoteProvider + ?Sized,
  S: Sleeper + ?Sized,
{
  let attempts = policy.max_retries.max(1);
  let mut last_error = None;
  for attempt in 1..=attempts {
    match provider.quote(request).await {
      Ok(quote) => return Ok(quote),
      Err(err) => {
        warn!(
          attempt,
          max_retries = attempts,
          max_accounts = ?request.max_accounts,
          error = %err,
          "swap quote attempt failed"
        );
        if err.is_permanent() {
          return Err(ActionProcessingError::new(QUOTE_FAILED, Some(err)));
        }
        last_error = Some(err);
      }
    }
    if attempt < attempts {
      sleeper.sleep(policy.delay).await;
    }
  }
  Err(ActionProcessingError::new(QUOTE_FAILED, last_error))
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Mutex;

  use anchor_lang::prelude::Pubkey;

  use super::*;
  use crate::error::{QuoteError, ROUTE_PLAN_DOES_NOT_CONSUME_ALL_THE_AMOUNT};
  use crate::quote::SwapInstructions;

  /// Fails the first `failures` calls, then answers with `quote`.
  struct FlakyProvider {
    failures: u32,
    calls: AtomicU32,
    quote: Option<SwapQuote>,
    status: u16,
  }

  impl FlakyProvider {
    fn new(failures: u32, quote: Option<SwapQuote>) -> Self {
      FlakyProvider {
        failures,
        calls: AtomicU32::new(0),
        quote,
        status: 503,
      }
    }
  }

  #[async_trait]
  impl SwapQuoteProvider for FlakyProvider {
    async fn quote(
      &self,
      _request: &QuoteRequest,
    ) -> Result<SwapQuote, QuoteError> {
      let call = self.calls.fetch_add(1, Ordering::SeqCst);
      match &self.quote {
        Some(quote) if call >= self.failures => Ok(quote.clone()),
        _ => Err(QuoteError::Provider {
          status: self.status,
          error_code: Some(ROUTE_PLAN_DOES_NOT_CONSUME_ALL_THE_AMOUNT.into()),
          message: format!("attempt {call}"),
        }),
      }
    }

    async fn swap_instructions(
      &self,
      _quote: &SwapQuote,
      _user: Pubkey,
    ) -> Result<SwapInstructions, QuoteError> {
      Err(QuoteError::Decode("unused".to_string()))
    }
  }

  #[derive(Default)]
  struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
  }

  #[async_trait]
  impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
      if let Ok(mut slept) = self.slept.lock() {
        slept.push(duration);
      }
    }
  }

  fn sample_quote() -> SwapQuote {
    serde_json::from_value(serde_json::json!({
      "inputMint": Pubkey::new_unique().to_string(),
      "inAmount": "1000",
      "outputMint": Pubkey::new_unique().to_string(),
      "outAmount": "990",
      "otherAmountThreshold": "985",
      "swapMode": "ExactIn",
      "slippageBps": 50,
      "priceImpactPct": "0",
      "routePlan": [{"percent": 100}],
    }))
    .unwrap()
  }

  fn request() -> QuoteRequest {
    QuoteRequest::exact_in(Pubkey::new_unique(), Pubkey::new_unique(), 1000)
  }

  #[test]
  fn exhausts_exactly_max_retries() {
    let provider = FlakyProvider::new(u32::MAX, None);
    let sleeper = RecordingSleeper::default();
    let policy = RetryPolicy::default();
    let out = tokio_test::block_on(get_swap_quote_with_retry(
      &provider,
      &sleeper,
      &request(),
      policy,
    ));
    let err = out.unwrap_err();
    assert_eq!(err.action, QUOTE_FAILED);
    assert!(err.is_route_overflow());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
    let slept = sleeper.slept.lock().unwrap().clone();
    assert_eq!(slept, vec![Duration::from_millis(1500); 4]);
  }

  #[test]
  fn recovers_after_transient_failures() {
    let provider = FlakyProvider::new(2, Some(sample_quote()));
    let sleeper = RecordingSleeper::default();
    let policy = RetryPolicy {
      max_retries: 3,
      delay: Duration::from_millis(10),
    };
    let out = tokio_test::block_on(get_swap_quote_with_retry(
      &provider,
      &sleeper,
      &request(),
      policy,
    ));
    assert_eq!(out.unwrap().out_amount, 990);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    assert_eq!(sleeper.slept.lock().unwrap().len(), 2);
  }

  #[test]
  fn permanent_rejection_stops_retrying() {
    let provider = FlakyProvider {
      status: 400,
      ..FlakyProvider::new(u32::MAX, Some(sample_quote()))
    };
    let sleeper = RecordingSleeper::default();
    let out = tokio_test::block_on(get_swap_quote_with_retry(
      &provider,
      &sleeper,
      &request(),
      RetryPolicy::default(),
    ));
    let err = out.unwrap_err();
    assert_eq!(err.action, QUOTE_FAILED);
    assert!(err.is_route_overflow());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert!(sleeper.slept.lock().unwrap().is_empty());
  }

  #[test]
  fn zero_retries_still_attempts_once() {
    let provider = FlakyProvider::new(0, Some(sample_quote()));
    let policy = RetryPolicy {
      max_retries: 0,
      delay: Duration::ZERO,
    };
    let out = tokio_test::block_on(get_swap_quote_with_retry(
      &provider,
      &TokioSleeper,
      &request(),
      policy,
    ));
    assert!(out.is_ok());
  }
}
