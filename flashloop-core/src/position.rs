use anchor_lang::prelude::Pubkey;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::conversion::{usd_value, validate_price};

/// Bank-scoped balance held by the user's lending account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
  pub is_active: bool,
  /// UI units of the bank's mint.
  pub amount: Decimal,
  /// `true` for a deposit, `false` for a borrow.
  pub is_lending: bool,
}

impl Position {
  #[must_use]
  pub fn lending(amount: Decimal) -> Position {
    Position {
      is_active: true,
      amount,
      is_lending: true,
    }
  }

  #[must_use]
  pub fn borrowing(amount: Decimal) -> Position {
    Position {
      is_active: true,
      amount,
      is_lending: false,
    }
  }
}

/// Oracle price for one bank, fixed for the duration of a calculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
  pub price: Decimal,
}

impl PriceQuote {
  #[must_use]
  pub fn new(price: Decimal) -> PriceQuote {
    PriceQuote { price }
  }
}

/// Read-only view of a bank and the user's position in it, supplied by the
/// caller at call time.
#[derive(Clone, Debug, PartialEq)]
pub struct BankSnapshot {
  pub address: Pubkey,
  pub mint: Pubkey,
  pub mint_decimals: u8,
  pub token_program: Pubkey,
  pub price: PriceQuote,
  pub position: Option<Position>,
}

impl BankSnapshot {
  /// Position if one exists and is active.
  #[must_use]
  pub fn active_position(&self) -> Option<&Position> {
    self.position.as_ref().filter(|position| position.is_active)
  }

  /// Validated oracle price.
  pub fn price(&self) -> anchor_lang::Result<Decimal> {
    validate_price(self.price.price)
  }

  /// USD value of an amount of this bank's mint.
  pub fn usd_value(&self, amount: Decimal) -> anchor_lang::Result<Decimal> {
    usd_value(amount, self.price()?)
  }
}
