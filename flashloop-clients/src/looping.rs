//! Leveraged looping: borrow, swap into the deposit asset, deposit, all inside
//! one flashloan.

use anchor_lang::prelude::Pubkey;
use anyhow::anyhow;
use flashloop_core::action::{ActionMessage, INVALID_AMOUNT};
use flashloop_core::conversion::ui_to_native;
use flashloop_core::limits::AccountLimitTier;
use flashloop_core::looping_math::{buffered_principal, realized_deposit, PositionMath};
use flashloop_core::position::BankSnapshot;
use flashloop_core::slippage_config::SlippageConfig;
use flashloop_jupiter::{QuoteRequest, Sleeper, SwapMode, SwapQuote, SwapQuoteProvider};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::assembler::{AssembleRequest, FlashloanAction, TransactionAssembler};
use crate::engine::Flashloop;
use crate::size::BuiltTransactions;
use crate::tiered_search::TierPlanner;

/// Inputs for opening a leveraged position.
#[derive(Clone, Debug, PartialEq)]
pub struct LoopingArgs {
  pub user: Pubkey,
  pub deposit_bank: BankSnapshot,
  pub borrow_bank: BankSnapshot,
  /// UI units of the deposit mint.
  pub principal: Decimal,
  pub target_leverage: Decimal,
  pub slippage: SlippageConfig,
  pub platform_fee_bps: Option<u16>,
}

/// Amounts and transactions for a looping action.
#[derive(Clone, Debug, PartialEq)]
pub struct LoopingParams {
  pub buffered_principal: Decimal,
  /// UI units of the borrow mint.
  pub borrow_amount: Decimal,
  /// Deposit assuming the swap fills at its guaranteed minimum, UI units.
  pub total_deposit_amount: Decimal,
  pub tier: AccountLimitTier,
  pub quote: SwapQuote,
  pub first_quote: Option<SwapQuote>,
  pub transactions: BuiltTransactions,
}

struct LoopingPlanner<'a> {
  args: &'a LoopingArgs,
  borrow_native: u64,
}

impl TierPlanner for LoopingPlanner<'_> {
  fn quote_request(&self, tier: AccountLimitTier) -> QuoteRequest {
    QuoteRequest {
      input_mint: self.args.borrow_bank.mint,
      output_mint: self.args.deposit_bank.mint,
      amount: self.borrow_native,
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
    let deposit = &self.args.deposit_bank;
    let deposit_ui = realized_deposit(
      quote.other_amount_threshold,
      deposit.mint_decimals,
      self.args.principal,
    )
    .map_err(|err| anyhow!("realized deposit: {err}"))?;
    let deposit_amount = ui_to_native(deposit_ui, deposit.mint_decimals)
      .map_err(|err| anyhow!("deposit amount: {err}"))?;
    debug!(%tier, %deposit_ui, deposit_amount, "recomputed looping deposit");
    Ok(AssembleRequest {
      user: self.args.user,
      quote: quote.clone(),
      action: FlashloanAction::Loop {
        deposit_bank: deposit.clone(),
        borrow_bank: self.args.borrow_bank.clone(),
        deposit_amount,
        borrow_amount: self.borrow_native,
      },
      tier,
    })
  }
}

/// Initial borrow in UI and native units, before any quote.
fn initial_borrow(
  position_math: &dyn PositionMath,
  args: &LoopingArgs,
) -> anchor_lang::Result<(Decimal, Decimal, u64)> {
  let buffered = buffered_principal(
    args.principal,
    args.target_leverage,
    args.slippage.slippage_bps,
  )?;
  let amounts = position_math.looping_amounts(
    buffered,
    args.target_leverage,
    args.deposit_bank.price()?,
    args.borrow_bank.price()?,
  )?;
  let borrow_native =
    ui_to_native(amounts.borrow_amount, args.borrow_bank.mint_decimals)?;
  Ok((buffered, amounts.borrow_amount, borrow_native))
}

impl<Q, A, S> Flashloop<Q, A, S>
where
  Q: SwapQuoteProvider,
  A: TransactionAssembler,
  S: Sleeper,
{
  /// Computes the borrow for `target_leverage`, then finds the first
  /// account-limit tier whose flashloan fits.
  ///
  /// # Errors
  /// * [`INVALID_AMOUNT`] for leverage `<= 1`, non-positive principal,
  ///   slippage that consumes the whole principal, or a zero borrow
  /// * Whatever the tiered search surfaces
  pub async fn calculate_looping_params(
    &self,
    args: &LoopingArgs,
  ) -> Result<LoopingParams, ActionMessage> {
    let (buffered, borrow_amount, borrow_native) =
      initial_borrow(self.position_math.as_ref(), args).map_err(|err| {
        warn!(
          principal = %args.principal,
          leverage = %args.target_leverage,
          error = %err,
          "looping amounts rejected"
        );
        INVALID_AMOUNT
      })?;
    if borrow_native == 0 {
      warn!(%borrow_amount, "looping borrow rounds to zero");
      return Err(INVALID_AMOUNT);
    }
    debug!(%buffered, %borrow_amount, borrow_native, "looping borrow");

    let planner = LoopingPlanner {
      args,
      borrow_native,
    };
    let outcome = self.search().run(&planner).await?;
    let total_deposit_amount = realized_deposit(
      outcome.quote.other_amount_threshold,
      args.deposit_bank.mint_decimals,
      args.principal,
    )
    .map_err(|_| INVALID_AMOUNT)?;

    Ok(LoopingParams {
      buffered_principal: buffered,
      borrow_amount,
      total_deposit_amount,
      tier: outcome.tier,
      quote: outcome.quote,
      first_quote: outcome.first_quote,
      transactions: outcome.built,
    })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;
  use std::time::Duration;

  use anchor_client::solana_sdk::hash::Hash;
  use anchor_client::solana_sdk::message::{v0, VersionedMessage};
  use async_trait::async_trait;
  use flashloop_core::action::TX_SIZE_EXCEEDED;
  use flashloop_core::looping_math::LoopingAmounts;
  use flashloop_core::position::PriceQuote;
  use flashloop_jupiter::{QuoteError, RetryPolicy, SwapInstructions};
  use rust_decimal_macros::dec;

  use super::*;
  use crate::engine::EngineConfig;
  use crate::size::{BuildResult, SizeCheck};
  use crate::util::unsigned_transaction;

  #[derive(Default)]
  struct RecordingGateway {
    requests: Mutex<Vec<QuoteRequest>>,
  }

  #[async_trait]
  impl SwapQuoteProvider for RecordingGateway {
    async fn quote(&self, request: &QuoteRequest) -> Result<SwapQuote, QuoteError> {
      self.requests.lock().unwrap().push(request.clone());
      Ok(
        serde_json::from_value(serde_json::json!({
          "inputMint": request.input_mint.to_string(),
          "inAmount": request.amount.to_string(),
          "outputMint": request.output_mint.to_string(),
          "outAmount": "196000000",
          "otherAmountThreshold": "195000000",
          "swapMode": "ExactIn",
          "slippageBps": 50,
          "priceImpactPct": "0.001",
          "routePlan": [{"percent": 100}],
        }))
        .unwrap(),
      )
    }

    async fn swap_instructions(
      &self,
      _quote: &SwapQuote,
      _user: Pubkey,
    ) -> Result<SwapInstructions, QuoteError> {
      Err(QuoteError::Decode("unused".to_string()))
    }
  }

  /// Fits only once the route is capped at `fits_at` accounts or fewer.
  struct CapAssembler {
    fits_at: u32,
    requests: Mutex<Vec<AssembleRequest>>,
  }

  #[async_trait]
  impl TransactionAssembler for CapAssembler {
    async fn assemble(&self, request: &AssembleRequest) -> anyhow::Result<BuildResult> {
      self.requests.lock().unwrap().push(request.clone());
      let size = SizeCheck {
        message_size: 900,
        account_keys: 40,
      };
      match request.tier.max_accounts {
        Some(cap) if cap <= self.fits_at => {
          let message = v0::Message::try_compile(&request.user, &[], &[], Hash::default())?;
          Ok(BuildResult::Fits(Box::new(BuiltTransactions {
            setup_txn: None,
            transaction: unsigned_transaction(VersionedMessage::V0(message)),
            bundle_tip_txn: None,
            lookup_tables: vec![],
            size,
          })))
        }
        _ => Ok(BuildResult::TooLarge(size)),
      }
    }
  }

  /// Reproduces the worked example: 98.5 principal at 3x borrows 197.
  struct FixedMath;

  impl PositionMath for FixedMath {
    fn looping_amounts(
      &self,
      principal: Decimal,
      _leverage: Decimal,
      _deposit_price: Decimal,
      _borrow_price: Decimal,
    ) -> anchor_lang::Result<LoopingAmounts> {
      assert_eq!(principal, dec!(98.5));
      Ok(LoopingAmounts {
        borrow_amount: dec!(197),
        total_deposit_amount: dec!(295.5),
      })
    }
  }

  fn bank(decimals: u8) -> BankSnapshot {
    BankSnapshot {
      address: Pubkey::new_unique(),
      mint: Pubkey::new_unique(),
      mint_decimals: decimals,
      token_program: anchor_spl::token::ID,
      price: PriceQuote::new(dec!(1)),
      position: None,
    }
  }

  fn args() -> LoopingArgs {
    LoopingArgs {
      user: Pubkey::new_unique(),
      deposit_bank: bank(6),
      borrow_bank: bank(6),
      principal: dec!(100),
      target_leverage: dec!(3),
      slippage: SlippageConfig::fixed(50),
      platform_fee_bps: Some(10),
    }
  }

  struct NoSleep;

  #[async_trait]
  impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
  }

  fn engine(fits_at: u32) -> Flashloop<RecordingGateway, CapAssembler, NoSleep> {
    Flashloop::new(
      RecordingGateway::default(),
      CapAssembler {
        fits_at,
        requests: Mutex::new(vec![]),
      },
    )
    .with_sleeper(NoSleep)
    .with_position_math(std::sync::Arc::new(FixedMath))
    .with_config(EngineConfig {
      retry: RetryPolicy {
        max_retries: 1,
        delay: Duration::ZERO,
      },
      ..EngineConfig::default()
    })
  }

  #[tokio::test]
  async fn worked_example_requests_exact_in_borrow() {
    let engine = engine(40);
    let args = args();
    let params = engine.calculate_looping_params(&args).await.unwrap();

    assert_eq!(params.buffered_principal, dec!(98.5));
    assert_eq!(params.borrow_amount, dec!(197));
    assert_eq!(params.total_deposit_amount, dec!(295));
    assert_eq!(params.tier, AccountLimitTier::capped(40));
    assert!(params.first_quote.is_some());

    let requests = engine.gateway.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 3);
    let first = &requests[0];
    assert_eq!(first.amount, 197_000_000);
    assert_eq!(first.swap_mode, SwapMode::ExactIn);
    assert_eq!(first.input_mint, args.borrow_bank.mint);
    assert_eq!(first.output_mint, args.deposit_bank.mint);
    assert_eq!(first.platform_fee_bps, Some(10));
    assert_eq!(first.max_accounts, None);
  }

  #[tokio::test]
  async fn deposit_trusts_threshold_not_out_amount() {
    let engine = engine(50);
    engine.calculate_looping_params(&args()).await.unwrap();
    let requests = engine.assembler.requests.lock().unwrap().clone();
    let FlashloanAction::Loop {
      deposit_amount,
      borrow_amount,
      ..
    } = &requests.last().unwrap().action
    else {
      panic!("expected loop action");
    };
    assert_eq!(*deposit_amount, 295_000_000);
    assert_eq!(*borrow_amount, 197_000_000);
  }

  #[tokio::test]
  async fn size_failure_on_every_tier() {
    let err = engine(0).calculate_looping_params(&args()).await.unwrap_err();
    assert_eq!(err, TX_SIZE_EXCEEDED);
  }

  #[tokio::test]
  async fn leverage_at_one_rejected_without_quote() {
    let engine = engine(50);
    let args = LoopingArgs {
      target_leverage: dec!(1),
      ..args()
    };
    let err = engine.calculate_looping_params(&args).await.unwrap_err();
    assert_eq!(err, INVALID_AMOUNT);
    assert!(engine.gateway.requests.lock().unwrap().is_empty());
  }
}
