use flashloop_core::action::ActionMessage;
use thiserror::Error;

/// Router code for a route that cannot absorb the full input amount.
pub const ROUTE_PLAN_DOES_NOT_CONSUME_ALL_THE_AMOUNT: &str =
  "ROUTE_PLAN_DOES_NOT_CONSUME_ALL_THE_AMOUNT";

/// Failure of a single quote or swap-instructions call.
#[derive(Debug, Error)]
pub enum QuoteError {
  #[error("quote transport failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("quote provider returned {status}: {message}")]
  Provider {
    status: u16,
    error_code: Option<String>,
    message: String,
  },
  #[error("malformed quote response: {0}")]
  Decode(String),
}

impl QuoteError {
  /// Machine readable code sent by the provider, if any.
  #[must_use]
  pub fn error_code(&self) -> Option<&str> {
    match self {
      QuoteError::Provider { error_code, .. } => error_code.as_deref(),
      _ => None,
    }
  }

  /// Client errors with a provider code answer the same on every attempt.
  #[must_use]
  pub fn is_permanent(&self) -> bool {
    matches!(
      self,
      QuoteError::Provider { status: 400..=499, error_code: Some(_), .. }
    )
  }
}

/// Raised once the gateway has exhausted its retries.
#[derive(Debug, Error)]
#[error("{action}")]
pub struct ActionProcessingError {
  pub action: ActionMessage,
  #[source]
  pub last_error: Option<QuoteError>,
}

impl ActionProcessingError {
  #[must_use]
  pub fn new(action: ActionMessage, last_error: Option<QuoteError>) -> Self {
    ActionProcessingError { action, last_error }
  }

  /// Provider code of the last failed attempt.
  #[must_use]
  pub fn error_code(&self) -> Option<&str> {
    self.last_error.as_ref().and_then(QuoteError::error_code)
  }

  #[must_use]
  pub fn is_route_overflow(&self) -> bool {
    self.error_code() == Some(ROUTE_PLAN_DOES_NOT_CONSUME_ALL_THE_AMOUNT)
  }
}
