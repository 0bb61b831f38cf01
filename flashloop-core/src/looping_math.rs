use crate::conversion::{native_to_ui, validate_price};
use crate::error::CoreError::{
  LeverageTooLow, LoopingArithmetic, PrincipalNotPositive,
  SlippageBufferExhausted,
};
use crate::slippage_config::bps_fraction;

use anchor_lang::prelude::*;
use rust_decimal::Decimal;

/// Borrow and resulting deposit for a leveraged position, in UI units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopingAmounts {
  pub borrow_amount: Decimal,
  pub total_deposit_amount: Decimal,
}

/// Position formula of the lending protocol.
pub trait PositionMath: Send + Sync {
  /// Amounts that take `principal` of the deposit asset to `leverage` times
  /// exposure by borrowing the borrow asset.
  fn looping_amounts(
    &self,
    principal: Decimal,
    leverage: Decimal,
    deposit_price: Decimal,
    borrow_price: Decimal,
  ) -> Result<LoopingAmounts>;
}

/// Plain notional leverage.
///   `DEPOSIT = PRINCIPAL * LEVERAGE`
///   `BORROW = (DEPOSIT - PRINCIPAL) * P_DEPOSIT / P_BORROW`
#[derive(Clone, Copy, Debug, Default)]
pub struct LeverageFormula;

impl PositionMath for LeverageFormula {
  fn looping_amounts(
    &self,
    principal: Decimal,
    leverage: Decimal,
    deposit_price: Decimal,
    borrow_price: Decimal,
  ) -> Result<LoopingAmounts> {
    let deposit_price = validate_price(deposit_price)?;
    let borrow_price = validate_price(borrow_price)?;
    let total_deposit_amount = principal
      .checked_mul(leverage)
      .ok_or(LoopingArithmetic)?;
    let borrow_amount = total_deposit_amount
      .checked_sub(principal)
      .and_then(|extra| extra.checked_mul(deposit_price))
      .and_then(|usd| usd.checked_div(borrow_price))
      .ok_or(LoopingArithmetic)?;
    Ok(LoopingAmounts {
      borrow_amount,
      total_deposit_amount,
    })
  }
}

/// Shrinks the principal so swap slippage cannot push the final position
/// above the authorized leverage.
///   `PRINCIPAL * (1 - LEVERAGE * BPS / 10000)`
pub fn buffered_principal(
  principal: Decimal,
  leverage: Decimal,
  slippage_bps: u16,
) -> Result<Decimal> {
  if leverage <= Decimal::ONE {
    return Err(LeverageTooLow.into());
  }
  if principal <= Decimal::ZERO {
    return Err(PrincipalNotPositive.into());
  }
  let factor = leverage
    .checked_mul(bps_fraction(slippage_bps))
    .and_then(|haircut| Decimal::ONE.checked_sub(haircut))
    .ok_or(LoopingArithmetic)?;
  if factor <= Decimal::ZERO {
    return Err(SlippageBufferExhausted.into());
  }
  principal.checked_mul(factor).ok_or(LoopingArithmetic.into())
}

/// Deposit the flashloan can commit to once a swap quote is known. Only the
/// quote's guaranteed minimum output is trusted.
///   `THRESHOLD / 10^DECIMALS + PRINCIPAL`
pub fn realized_deposit(
  other_amount_threshold: u64,
  deposit_decimals: u8,
  principal: Decimal,
) -> Result<Decimal> {
  native_to_ui(other_amount_threshold, deposit_decimals)?
    .checked_add(principal)
    .ok_or(LoopingArithmetic.into())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::proptest::*;
  use proptest::prelude::*;
  use rust_decimal_macros::dec;

  #[test]
  fn buffered_principal_example() -> Result<()> {
    let buffered = buffered_principal(dec!(100), dec!(3), 50)?;
    assert_eq!(buffered, dec!(98.5));
    Ok(())
  }

  #[test]
  fn leverage_formula_example() -> Result<()> {
    let amounts =
      LeverageFormula.looping_amounts(dec!(98.5), dec!(3), dec!(1), dec!(1))?;
    assert_eq!(amounts.borrow_amount, dec!(197));
    assert_eq!(amounts.total_deposit_amount, dec!(295.5));
    Ok(())
  }

  #[test]
  fn leverage_formula_cross_price() -> Result<()> {
    // 10 SOL at $150 looped 2x against USDC
    let amounts =
      LeverageFormula.looping_amounts(dec!(10), dec!(2), dec!(150), dec!(1))?;
    assert_eq!(amounts.borrow_amount, dec!(1500));
    assert_eq!(amounts.total_deposit_amount, dec!(20));
    Ok(())
  }

  #[test]
  fn leverage_at_one_rejected() {
    let out = buffered_principal(dec!(100), Decimal::ONE, 50);
    assert_eq!(out, Err(LeverageTooLow.into()));
  }

  #[test]
  fn zero_principal_rejected() {
    let out = buffered_principal(Decimal::ZERO, dec!(2), 50);
    assert_eq!(out, Err(PrincipalNotPositive.into()));
  }

  #[test]
  fn exhausted_buffer_rejected() {
    let out = buffered_principal(dec!(100), dec!(10), 1000);
    assert_eq!(out, Err(SlippageBufferExhausted.into()));
  }

  #[test]
  fn realized_deposit_uses_threshold() -> Result<()> {
    let deposit = realized_deposit(195_500_000, 6, dec!(100))?;
    assert_eq!(deposit, dec!(295.5));
    Ok(())
  }

  proptest! {
    #[test]
    fn buffer_strictly_shrinks(
      principal in ui_amount(),
      leverage in leverage(),
      bps in slippage_bps(),
    ) {
      let buffered = buffered_principal(principal, leverage, bps)?;
      prop_assert!(buffered < principal);
    }

    #[test]
    fn buffer_monotone_in_leverage(
      principal in ui_amount(),
      leverage in leverage(),
      bps in slippage_bps(),
    ) {
      let higher = leverage + dec!(0.5);
      let low = buffered_principal(principal, leverage, bps)?;
      let high = buffered_principal(principal, higher, bps)?;
      prop_assert!(high < low);
    }

    #[test]
    fn buffer_monotone_in_slippage(
      principal in ui_amount(),
      leverage in leverage(),
      bps in slippage_bps(),
    ) {
      let low = buffered_principal(principal, leverage, bps)?;
      let high = buffered_principal(principal, leverage, bps + 1)?;
      prop_assert!(high < low);
    }
  }
}
