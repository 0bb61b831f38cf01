use crate::action::{ActionMessage, MAX_REPAY_CEILING};
use crate::error::CoreError::{InactivePosition, RepayArithmetic};
use crate::limits::Limits;
use crate::position::BankSnapshot;
use crate::slippage_config::inflate_by_slippage;

use anchor_lang::prelude::*;
use rust_decimal::Decimal;

/// Collateral amount that can be withdrawn to repay a borrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxRepayable {
  /// UI units of the deposit mint.
  pub amount: Decimal,
  /// Borrow notional was clamped to the repay ceiling.
  pub max_overflow_hit: bool,
}

impl MaxRepayable {
  /// Fail-closed result.
  pub const NONE: MaxRepayable = MaxRepayable {
    amount: Decimal::ZERO,
    max_overflow_hit: false,
  };

  /// Non-blocking notice shown when the ceiling bound.
  #[must_use]
  pub fn notice(&self) -> Option<ActionMessage> {
    self.max_overflow_hit.then_some(MAX_REPAY_CEILING)
  }
}

/// Outcome of the quote-free part of the max repayable calculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepayPlan {
  /// Collateral is worth less than the debt, so all of it can go.
  FullCollateral(MaxRepayable),
  /// A quote for `minimal_required_collateral` decides the final amount.
  Quote(RepayQuotePlan),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepayQuotePlan {
  /// Collateral that covers the (possibly clamped) debt at oracle prices.
  pub minimal_required_collateral: Decimal,
  /// Borrow amount used for the plan, after clamping.
  pub borrow_amount: Decimal,
  pub deposited_amount: Decimal,
  pub max_overflow_hit: bool,
  /// Collateral covering exactly the repay ceiling, capped at the deposit.
  pub ceiling_collateral: Decimal,
}

impl RepayQuotePlan {
  /// Inflates the minimal collateral by observed slippage and caps the result
  /// at what is actually deposited.
  pub fn finalize(&self, observed_slippage_bps: u16) -> Result<MaxRepayable> {
    let inflated =
      inflate_by_slippage(self.minimal_required_collateral, observed_slippage_bps)?;
    Ok(MaxRepayable {
      amount: cap_to_deposit(inflated, self.deposited_amount),
      max_overflow_hit: self.max_overflow_hit,
    })
  }

  /// Result when the router cannot fill the clamped notional. Only a debt
  /// clamped at the ceiling recovers; below it the overflow is a plain failure.
  #[must_use]
  pub fn router_overflow(&self) -> MaxRepayable {
    if !self.max_overflow_hit {
      return MaxRepayable::NONE;
    }
    MaxRepayable {
      amount: self.ceiling_collateral,
      max_overflow_hit: true,
    }
  }
}

/// Borrow amount after applying the notional ceiling, and whether it bound.
///   `min(BORROW, CEILING / P_BORROW)`
pub fn clamp_borrow_to_ceiling(
  borrow_amount: Decimal,
  borrow_price: Decimal,
  ceiling_usd: Decimal,
) -> Result<(Decimal, bool)> {
  let borrowed_usd = borrow_amount
    .checked_mul(borrow_price)
    .ok_or(RepayArithmetic)?;
  if borrowed_usd > ceiling_usd {
    let clamped = ceiling_usd
      .checked_div(borrow_price)
      .ok_or(RepayArithmetic)?;
    Ok((clamped, true))
  } else {
    Ok((borrow_amount, false))
  }
}

#[must_use]
pub fn cap_to_deposit(amount: Decimal, deposited_amount: Decimal) -> Decimal {
  amount.min(deposited_amount)
}

/// Prices both positions and decides whether a quote is needed.
///
/// # Errors
/// * Either bank lacks an active position
/// * Non-positive oracle price
/// * Arithmetic overflow
pub fn plan_max_repayable(
  deposit_bank: &BankSnapshot,
  borrow_bank: &BankSnapshot,
  limits: &Limits,
) -> Result<RepayPlan> {
  let (deposit, borrow) = deposit_bank
    .active_position()
    .zip(borrow_bank.active_position())
    .ok_or(InactivePosition)?;
  let deposit_price = deposit_bank.price()?;
  let borrow_price = borrow_bank.price()?;

  let (borrow_amount, max_overflow_hit) = clamp_borrow_to_ceiling(
    borrow.amount,
    borrow_price,
    limits.max_repay_notional_usd,
  )?;
  let borrowed_usd = borrow_bank.usd_value(borrow_amount)?;
  let deposited_usd = deposit_bank.usd_value(deposit.amount)?;

  if deposited_usd < borrowed_usd {
    return Ok(RepayPlan::FullCollateral(MaxRepayable {
      amount: deposit.amount,
      max_overflow_hit,
    }));
  }

  let minimal_required_collateral = borrowed_usd
    .checked_div(deposit_price)
    .ok_or(RepayArithmetic)?;
  let ceiling_collateral = limits
    .max_repay_notional_usd
    .checked_div(deposit_price)
    .map(|amount| cap_to_deposit(amount, deposit.amount))
    .ok_or(RepayArithmetic)?;

  Ok(RepayPlan::Quote(RepayQuotePlan {
    minimal_required_collateral,
    borrow_amount,
    deposited_amount: deposit.amount,
    max_overflow_hit,
    ceiling_collateral,
  }))
}
