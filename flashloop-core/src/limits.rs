use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Hard cap on a serialized Solana transaction, signatures included.
pub const MAX_TRANSACTION_SIZE: usize = 1232;

/// Space left for the fee payer signature appended after measurement.
pub const SIGNATURE_RESERVATION: usize = 64;

/// Unique account keys a transaction may lock.
pub const MAX_ACCOUNT_KEYS: usize = 64;

/// Notional above which collateral repay swaps are clamped.
pub const MAX_REPAY_NOTIONAL_USD: Decimal = dec!(250000);

/// Protocol-fixed limits the engine checks against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
  pub max_message_size: usize,
  pub max_account_keys: usize,
  pub max_repay_notional_usd: Decimal,
}

impl Default for Limits {
  fn default() -> Self {
    Limits {
      max_message_size: MAX_TRANSACTION_SIZE - SIGNATURE_RESERVATION,
      max_account_keys: MAX_ACCOUNT_KEYS,
      max_repay_notional_usd: MAX_REPAY_NOTIONAL_USD,
    }
  }
}

/// Cap on the accounts a swap route may touch. `None` lets the router choose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AccountLimitTier {
  pub max_accounts: Option<u32>,
  /// Setup instructions go into their own transaction.
  pub is_txn_split: bool,
}

impl AccountLimitTier {
  #[must_use]
  pub const fn unconstrained() -> AccountLimitTier {
    AccountLimitTier {
      max_accounts: None,
      is_txn_split: false,
    }
  }

  #[must_use]
  pub const fn capped(max_accounts: u32) -> AccountLimitTier {
    AccountLimitTier {
      max_accounts: Some(max_accounts),
      is_txn_split: false,
    }
  }

  #[must_use]
  pub const fn split(self) -> AccountLimitTier {
    AccountLimitTier {
      max_accounts: self.max_accounts,
      is_txn_split: true,
    }
  }

  #[must_use]
  pub const fn is_unconstrained(&self) -> bool {
    self.max_accounts.is_none()
  }
}

impl std::fmt::Display for AccountLimitTier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self.max_accounts {
      Some(max) if self.is_txn_split => write!(f, "{max} (split)"),
      Some(max) => write!(f, "{max}"),
      None => f.write_str("unconstrained"),
    }
  }
}

/// Tiers tried in order, most permissive first.
pub const DEFAULT_TIERS: [AccountLimitTier; 4] = [
  AccountLimitTier::unconstrained(),
  AccountLimitTier::capped(50),
  AccountLimitTier::capped(40),
  AccountLimitTier::capped(30).split(),
];
