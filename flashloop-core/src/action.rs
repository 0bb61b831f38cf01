//! User-facing outcomes of a failed or constrained action.

use serde::Serialize;

/// Severity of an [`ActionMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionMethod {
  Warning,
  Error,
  Info,
}

impl ActionMethod {
  #[must_use]
  pub const fn as_str(&self) -> &'static str {
    match self {
      ActionMethod::Warning => "WARNING",
      ActionMethod::Error => "ERROR",
      ActionMethod::Info => "INFO",
    }
  }

  /// Informational messages do not block the action.
  #[must_use]
  pub const fn is_blocking(&self) -> bool {
    !matches!(self, ActionMethod::Info)
  }
}

impl std::fmt::Display for ActionMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Terminal value handed to the caller when an action cannot proceed as
/// requested.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{action_method}: {description}")]
pub struct ActionMessage {
  pub is_enabled: bool,
  pub action_method: ActionMethod,
  pub description: &'static str,
  pub retryable: bool,
  pub code: &'static str,
}

pub const QUOTE_FAILED: ActionMessage = ActionMessage {
  is_enabled: true,
  action_method: ActionMethod::Warning,
  description: "Unable to retrieve a swap quote. Please try again.",
  retryable: true,
  code: "QUOTE_FAILED",
};

pub const TX_SIZE_EXCEEDED: ActionMessage = ActionMessage {
  is_enabled: true,
  action_method: ActionMethod::Warning,
  description: "This swap causes the transaction to fail due to size \
                restrictions. Please try reducing the amount or pick a \
                different token.",
  retryable: true,
  code: "TX_SIZE_EXCEEDED",
};

pub const TOO_MANY_KEYS: ActionMessage = ActionMessage {
  is_enabled: true,
  action_method: ActionMethod::Warning,
  description: "This swap touches too many accounts to fit in one \
                transaction. Please try reducing the amount or pick a \
                different token.",
  retryable: true,
  code: "TOO_MANY_KEYS",
};

pub const FLASHLOAN_FAILED: ActionMessage = ActionMessage {
  is_enabled: true,
  action_method: ActionMethod::Error,
  description: "Failed to build the flashloan transaction. Please try again.",
  retryable: true,
  code: "FLASHLOAN_FAILED",
};

pub const MAX_REPAY_CEILING: ActionMessage = ActionMessage {
  is_enabled: true,
  action_method: ActionMethod::Info,
  description: "Repayment with collateral is limited to $250,000 per \
                transaction.",
  retryable: false,
  code: "MAX_REPAY_CEILING",
};

pub const INVALID_POSITION: ActionMessage = ActionMessage {
  is_enabled: false,
  action_method: ActionMethod::Error,
  description: "Both banks need an active position.",
  retryable: false,
  code: "INVALID_POSITION",
};

pub const INVALID_AMOUNT: ActionMessage = ActionMessage {
  is_enabled: false,
  action_method: ActionMethod::Warning,
  description: "Amount or leverage is out of range.",
  retryable: false,
  code: "INVALID_AMOUNT",
};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn info_does_not_block() {
    assert!(!MAX_REPAY_CEILING.action_method.is_blocking());
    assert!(TX_SIZE_EXCEEDED.action_method.is_blocking());
  }

  #[test]
  fn display_includes_severity() {
    let text = QUOTE_FAILED.to_string();
    assert!(text.starts_with("WARNING: "));
  }
}
