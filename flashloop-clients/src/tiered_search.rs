//! Account-limit backoff around quote and assembly.
//!
//! Tiers are tried in order, most permissive first. The first tier whose
//! transaction fits wins; a size failure moves on to the next tier, anything
//! else ends the search.

use flashloop_core::action::{ActionMessage, FLASHLOAN_FAILED, TX_SIZE_EXCEEDED};
use flashloop_core::limits::AccountLimitTier;
use flashloop_jupiter::{
  get_swap_quote_with_retry, QuoteRequest, RetryPolicy, Sleeper, SwapQuote,
  SwapQuoteProvider,
};
use tracing::{debug, error, info};

use crate::assembler::{AssembleRequest, TransactionAssembler};
use crate::size::{BuildResult, BuiltTransactions};

/// Operation-specific half of the search: what to quote at a tier, and what
/// to build once a quote is in.
pub trait TierPlanner: Send + Sync {
  fn quote_request(&self, tier: AccountLimitTier) -> QuoteRequest;

  /// Recomputes the dependent amount from the quote's guaranteed output.
  ///
  /// # Errors
  /// * The quote yields an amount that cannot be represented
  fn assemble_request(
    &self,
    quote: &SwapQuote,
    tier: AccountLimitTier,
  ) -> anyhow::Result<AssembleRequest>;
}

/// First fitting tier.
#[derive(Clone, Debug, PartialEq)]
pub struct TieredOutcome {
  pub tier: AccountLimitTier,
  pub quote: SwapQuote,
  /// Quote from the unconstrained tier, kept for reference even when a
  /// later tier won.
  pub first_quote: Option<SwapQuote>,
  pub request: AssembleRequest,
  pub built: BuiltTransactions,
}

pub struct SizeTieredQuoteSearch<'a, Q: ?Sized, A: ?Sized, S: ?Sized> {
  pub gateway: &'a Q,
  pub assembler: &'a A,
  pub sleeper: &'a S,
  pub retry: RetryPolicy,
  pub tiers: &'a [AccountLimitTier],
}

impl<Q, A, S> SizeTieredQuoteSearch<'_, Q, A, S>
where
  Q: SwapQuoteProvider + ?Sized,
  A: TransactionAssembler + ?Sized,
  S: Sleeper + ?Sized,
{
  /// Runs the tiers sequentially.
  ///
  /// # Errors
  /// * Quote retries exhausted: the gateway's message
  /// * Last tier still oversized: [`TX_SIZE_EXCEEDED`] or
  ///   [`flashloop_core::action::TOO_MANY_KEYS`]
  /// * Any other failure: [`FLASHLOAN_FAILED`]
  pub async fn run<T: TierPlanner + ?Sized>(
    &self,
    planner: &T,
  ) -> Result<TieredOutcome, ActionMessage> {
    let mut first_quote = None;
    let mut failure = TX_SIZE_EXCEEDED;

    for tier in self.tiers.iter().copied() {
      let request = planner.quote_request(tier);
      let quote = get_swap_quote_with_retry(
        self.gateway,
        self.sleeper,
        &request,
        self.retry,
      )
      .await
      .map_err(|err| {
        error!(%tier, error = %err, code = ?err.error_code(), "swap quote failed");
        err.action
      })?;
      if tier.is_unconstrained() {
        first_quote = Some(quote.clone());
      }

      let assemble = planner.assemble_request(&quote, tier).map_err(|err| {
        error!(%tier, error = %err, "dependent amount failed");
        FLASHLOAN_FAILED
      })?;
      let result = self.assembler.assemble(&assemble).await.map_err(|err| {
        error!(%tier, error = %err, "flashloan assembly failed");
        FLASHLOAN_FAILED
      })?;

      match result {
        BuildResult::Fits(built) => {
          info!(
            %tier,
            message_size = built.size.message_size,
            account_keys = built.size.account_keys,
            "flashloan fits"
          );
          return Ok(TieredOutcome {
            tier,
            quote,
            first_quote,
            request: assemble,
            built: *built,
          });
        }
        oversized => {
          let size = oversized.size();
          debug!(
            %tier,
            message_size = size.message_size,
            account_keys = size.account_keys,
            "flashloan oversized, trying next tier"
          );
          failure = oversized.failure().unwrap_or(TX_SIZE_EXCEEDED);
        }
      }
    }

    info!(code = failure.code, "no account limit tier fits");
    Err(failure)
  }
}
