use crate::error::CoreError::SlippageArithmetic;

use anchor_lang::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Basis points in one whole.
pub const BPS_DENOMINATOR: Decimal = dec!(10000);

/// Client specified slippage, either a fixed tolerance or the router's own
/// dynamic estimate capped at `slippage_bps`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlippageConfig {
  pub slippage_bps: u16,
  pub dynamic: bool,
}

impl SlippageConfig {
  #[must_use]
  pub fn fixed(slippage_bps: u16) -> SlippageConfig {
    SlippageConfig {
      slippage_bps,
      dynamic: false,
    }
  }

  #[must_use]
  pub fn dynamic(max_slippage_bps: u16) -> SlippageConfig {
    SlippageConfig {
      slippage_bps: max_slippage_bps,
      dynamic: true,
    }
  }

  /// Picks the slippage actually applied to a quote: the router's computed
  /// value in dynamic mode, the quote's fixed tolerance otherwise.
  #[must_use]
  pub fn observed_bps(
    &self,
    quote_slippage_bps: u16,
    computed_auto_slippage: Option<u16>,
  ) -> u16 {
    if self.dynamic {
      computed_auto_slippage.unwrap_or(quote_slippage_bps)
    } else {
      quote_slippage_bps
    }
  }
}

/// Basis points as a decimal fraction.
#[must_use]
pub fn bps_fraction(bps: u16) -> Decimal {
  Decimal::from(bps) / BPS_DENOMINATOR
}

/// Grows an amount by a slippage tolerance.
///   `AMOUNT * (1 + BPS / 10000)`
pub fn inflate_by_slippage(amount: Decimal, slippage_bps: u16) -> Result<Decimal> {
  Decimal::ONE
    .checked_add(bps_fraction(slippage_bps))
    .and_then(|factor| amount.checked_mul(factor))
    .ok_or(SlippageArithmetic.into())
}
