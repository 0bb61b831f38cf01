//! Classifies compiled flashloan transactions against the chain's hard size
//! and account limits.

use anchor_client::solana_sdk::address_lookup_table::AddressLookupTableAccount;
use anchor_client::solana_sdk::message::VersionedMessage;
use anchor_client::solana_sdk::transaction::VersionedTransaction;
use flashloop_core::action::{ActionMessage, TOO_MANY_KEYS, TX_SIZE_EXCEEDED};
use flashloop_core::limits::Limits;

/// Measured footprint of one compiled message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeCheck {
  /// Serialized message length in bytes, signatures excluded.
  pub message_size: usize,
  /// Static keys plus keys loaded through lookup tables.
  pub account_keys: usize,
}

impl SizeCheck {
  #[must_use]
  pub fn measure(message: &VersionedMessage) -> SizeCheck {
    let loaded = message.address_table_lookups().map_or(0, |lookups| {
      lookups
        .iter()
        .map(|lookup| lookup.writable_indexes.len() + lookup.readonly_indexes.len())
        .sum()
    });
    SizeCheck {
      message_size: message.serialize().len(),
      account_keys: message.static_account_keys().len() + loaded,
    }
  }

  /// Key overflow is reported before size overflow.
  #[must_use]
  pub fn verdict(&self, limits: &Limits) -> SizeVerdict {
    if self.account_keys > limits.max_account_keys {
      SizeVerdict::TooManyKeys
    } else if self.message_size > limits.max_message_size {
      SizeVerdict::TooLarge
    } else {
      SizeVerdict::Fits
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeVerdict {
  Fits,
  TooLarge,
  TooManyKeys,
}

/// Transactions produced for one tier that fit the limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltTransactions {
  /// Token account and route setup, sent ahead of the flashloan in split
  /// mode.
  pub setup_txn: Option<VersionedTransaction>,
  pub transaction: VersionedTransaction,
  pub bundle_tip_txn: Option<VersionedTransaction>,
  pub lookup_tables: Vec<AddressLookupTableAccount>,
  pub size: SizeCheck,
}

/// Outcome of assembling one tier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildResult {
  Fits(Box<BuiltTransactions>),
  TooLarge(SizeCheck),
  TooManyKeys(SizeCheck),
}

impl BuildResult {
  /// User-facing message for a size failure.
  #[must_use]
  pub fn failure(&self) -> Option<ActionMessage> {
    match self {
      BuildResult::Fits(_) => None,
      BuildResult::TooLarge(_) => Some(TX_SIZE_EXCEEDED),
      BuildResult::TooManyKeys(_) => Some(TOO_MANY_KEYS),
    }
  }

  #[must_use]
  pub fn size(&self) -> SizeCheck {
    match self {
      BuildResult::Fits(built) => built.size,
      BuildResult::TooLarge(size) | BuildResult::TooManyKeys(size) => *size,
    }
  }
}

/// Measures `transaction` and wraps it as a [`BuildResult`]. Oversized
/// transactions are reported, never repaired.
#[must_use]
pub fn verify(
  transaction: VersionedTransaction,
  lookup_tables: Vec<AddressLookupTableAccount>,
  limits: &Limits,
) -> BuildResult {
  let size = SizeCheck::measure(&transaction.message);
  match size.verdict(limits) {
    SizeVerdict::TooManyKeys => BuildResult::TooManyKeys(size),
    SizeVerdict::TooLarge => BuildResult::TooLarge(size),
    SizeVerdict::Fits => BuildResult::Fits(Box::new(BuiltTransactions {
      setup_txn: None,
      transaction,
      bundle_tip_txn: None,
      lookup_tables,
      size,
    })),
  }
}
