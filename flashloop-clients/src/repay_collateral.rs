//! Repaying a borrow with deposited collateral: withdraw, swap into the
//! borrowed asset, repay, all inside one flashloan.

use anchor_lang::prelude::Pubkey;
use anyhow::anyhow;
use flashloop_core::action::{ActionMessage, INVALID_AMOUNT, INVALID_POSITION};
use flashloop_core::conversion::{native_to_ui, ui_to_native};
use flashloop_core::error::CoreError;
use flashloop_core::limits::AccountLimitTier;
use flashloop_core::position::BankSnapshot;
use flashloop_core::repay_math::{plan_max_repayable, MaxRepayable, RepayPlan};
use flashloop_core::slippage_config::SlippageConfig;
use flashloop_jupiter::{
  get_swap_quote_with_retry, QuoteRequest, Sleeper, SwapMode, SwapQuote,
  SwapQuoteProvider,
};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::assembler::{AssembleRequest, FlashloanAction, TransactionAssembler};
use crate::engine::Flashloop;
use crate::size::BuiltTransactions;
use crate::tiered_search::TierPlanner;

/// Inputs for repaying `borrow_bank` with collateral from `deposit_bank`.
#[derive(Clone, Debug, PartialEq)]
pub struct RepayCollateralArgs {
  pub user: Pubkey,
  pub deposit_bank: BankSnapshot,
  pub borrow_bank: BankSnapshot,
  /// Collateral to sell, UI units of the deposit mint.
  pub withdraw_amount: Decimal,
  pub slippage: SlippageConfig,
  pub platform_fee_bps: Option<u16>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RepayCollateralParams {
  /// UI units of the deposit mint.
  pub withdraw_amount: Decimal,
  /// Repay at the swap's guaranteed minimum, UI units of the borrow mint.
  pub repay_amount: Decimal,
  pub withdraw_all: bool,
  pub repay_all: bool,
  pub tier: AccountLimitTier,
  pub quote: SwapQuote,
  pub first_quote: Option<SwapQuote>,
  pub transactions: BuiltTransactions,
}

/// Repay side derived from a quote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RepayLeg {
  repay_amount: Decimal,
  repay_all: bool,
}

fn repay_leg(
  other_amount_threshold: u64,
  borrow_decimals: u8,
  borrowed: Decimal,
) -> anchor_lang::Result<RepayLeg> {
  let threshold = native_to_ui(other_amount_threshold, borrow_decimals)?;
  Ok(RepayLeg {
    repay_amount: threshold.min(borrowed),
    repay_all: threshold >= borrowed,
  })
}

struct RepayPlanner<'a> {
  args: &'a RepayCollateralArgs,
  withdraw_native: u64,
  withdraw_all: bool,
  borrowed: Decimal,
}

impl TierPlanner for RepayPlanner<'_> {
  fn quote_request(&self, tier: AccountLimitTier) -> QuoteRequest {
    QuoteRequest {
      input_mint: self.args.deposit_bank.mint,
      output_mint: self.args.borrow_bank.mint,
      amount: self.withdraw_native,
      slippage_bps: Some(self.args.slippage.slippage_bps),
      dynamic_slippage: self.args.slippage.dynamic,
      max_accounts: tier.max_accounts,
      swap_mode: SwapMode::ExactIn,
      platform_fee_bps: self.args.platform_fee_bps,
    }
  }

  fn assemble_request(
    &self,
    quote: &SwapQuote,
    tier: AccountLimitTier,
  ) -> anyhow::Result<AssembleRequest> {
    let borrow = &self.args.borrow_bank;
    let leg = repay_leg(quote.other_amount_threshold, borrow.mint_decimals, self.borrowed)
      .map_err(|err| anyhow!("repay amount: {err}"))?;
    let repay_amount = ui_to_native(leg.repay_amount, borrow.mint_decimals)
      .map_err(|err| anyhow!("repay amount: {err}"))?;
    debug!(%tier, repay = %leg.repay_amount, repay_all = leg.repay_all, "recomputed repay");
    Ok(AssembleRequest {
      user: self.args.user,
      quote: quote.clone(),
      action: FlashloanAction::RepayWithCollateral {
        deposit_bank: self.args.deposit_bank.clone(),
        borrow_bank: borrow.clone(),
        withdraw_amount: self.withdraw_native,
        repay_amount,
        withdraw_all: self.withdraw_all,
        repay_all: leg.repay_all,
      },
      tier,
    })
  }
}

impl<Q, A, S> Flashloop<Q, A, S>
where
  Q: SwapQuoteProvider,
  A: TransactionAssembler,
  S: Sleeper,
{
  /// Sells `withdraw_amount` of collateral and repays what the swap is
  /// guaranteed to return, in the first account-limit tier that fits.
  ///
  /// # Errors
  /// * [`INVALID_POSITION`] when either bank lacks an active position
  /// * [`INVALID_AMOUNT`] when the withdraw amount is not positive
  /// * Whatever the tiered search surfaces
  pub async fn calculate_repay_collateral_params(
    &self,
    args: &RepayCollateralArgs,
  ) -> Result<RepayCollateralParams, ActionMessage> {
    let Some((deposit, borrow)) = args
      .deposit_bank
      .active_position()
      .zip(args.borrow_bank.active_position())
    else {
      error!(
        deposit_bank = %args.deposit_bank.address,
        borrow_bank = %args.borrow_bank.address,
        "repay with collateral on inactive position"
      );
      return Err(INVALID_POSITION);
    };
    let withdraw_amount = args.withdraw_amount.min(deposit.amount);
    let withdraw_native =
      ui_to_native(withdraw_amount, args.deposit_bank.mint_decimals)
        .ok()
        .filter(|native| *native > 0)
        .ok_or_else(|| {
          warn!(withdraw = %args.withdraw_amount, "withdraw amount rejected");
          INVALID_AMOUNT
        })?;

    let planner = RepayPlanner {
      args,
      withdraw_native,
      withdraw_all: withdraw_amount >= deposit.amount,
      borrowed: borrow.amount,
    };
    let outcome = self.search().run(&planner).await?;
    let leg = repay_leg(
      outcome.quote.other_amount_threshold,
      args.borrow_bank.mint_decimals,
      borrow.amount,
    )
    .map_err(|_| INVALID_AMOUNT)?;

    Ok(RepayCollateralParams {
      withdraw_amount,
      repay_amount: leg.repay_amount,
      withdraw_all: planner.withdraw_all,
      repay_all: leg.repay_all,
      tier: outcome.tier,
      quote: outcome.quote,
      first_quote: outcome.first_quote,
      transactions: outcome.built,
    })
  }

  /// Largest collateral withdrawal that covers the borrow, with the notional
  /// clamped at the repay ceiling.
  ///
  /// Never fails: anything other than a router overflow at the ceiling
  /// yields [`MaxRepayable::NONE`].
  pub async fn calculate_max_repayable_collateral(
    &self,
    deposit_bank: &BankSnapshot,
    borrow_bank: &BankSnapshot,
    slippage: SlippageConfig,
    platform_fee_bps: Option<u16>,
  ) -> MaxRepayable {
    let plan = match plan_max_repayable(deposit_bank, borrow_bank, &self.config.limits) {
      Ok(RepayPlan::FullCollateral(out)) => {
        debug!(amount = %out.amount, "collateral short of debt, repaying with all of it");
        return out;
      }
      Ok(RepayPlan::Quote(plan)) => plan,
      Err(err) if err == anchor_lang::error::Error::from(CoreError::InactivePosition) => {
        error!(
          deposit_bank = %deposit_bank.address,
          borrow_bank = %borrow_bank.address,
          "max repayable requested for inactive position"
        );
        return MaxRepayable::NONE;
      }
      Err(err) => {
        warn!(error = %err, "max repayable math failed");
        return MaxRepayable::NONE;
      }
    };

    let Ok(amount) =
      ui_to_native(plan.minimal_required_collateral, deposit_bank.mint_decimals)
    else {
      warn!(amount = %plan.minimal_required_collateral, "collateral not representable");
      return MaxRepayable::NONE;
    };
    let request = QuoteRequest {
      slippage_bps: Some(slippage.slippage_bps),
      dynamic_slippage: slippage.dynamic,
      platform_fee_bps,
      ..QuoteRequest::exact_in(deposit_bank.mint, borrow_bank.mint, amount)
    };

    match get_swap_quote_with_retry(&self.gateway, &self.sleeper, &request, self.config.retry)
      .await
    {
      Ok(quote) => {
        let observed =
          slippage.observed_bps(quote.slippage_bps, quote.computed_auto_slippage);
        plan.finalize(observed).unwrap_or_else(|err| {
          warn!(error = %err, observed, "slippage inflation failed");
          MaxRepayable::NONE
        })
      }
      Err(err) if err.is_route_overflow() && plan.max_overflow_hit => {
        info!(
          borrow = %plan.borrow_amount,
          "router cannot fill ceiling notional, using ceiling collateral"
        );
        plan.router_overflow()
      }
      Err(err) => {
        warn!(error = %err, code = ?err.error_code(), "max repayable quote failed");
        MaxRepayable::NONE
      }
    }
  }
}
