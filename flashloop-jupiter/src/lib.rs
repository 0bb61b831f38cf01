//! Swap quote gateway for the looping and collateral-repay builders.
//!
//! Wraps Jupiter's v6 HTTP API behind [`SwapQuoteProvider`] and adds a
//! fixed-delay retry loop, [`get_swap_quote_with_retry`], that either yields
//! a fully populated [`SwapQuote`] or a typed [`ActionProcessingError`].
//!
//! ```rust,no_run
//! use flashloop_jupiter::{
//!   get_swap_quote_with_retry, JupiterClient, JupiterConfig, QuoteRequest,
//!   RetryPolicy, TokioSleeper,
//! };
//! use anchor_lang::prelude::Pubkey;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = JupiterClient::new(JupiterConfig::from_env())?;
//! let request =
//!   QuoteRequest::exact_in(Pubkey::new_unique(), Pubkey::new_unique(), 1_000_000);
//! let quote = get_swap_quote_with_retry(
//!   &client,
//!   &TokioSleeper,
//!   &request,
//!   RetryPolicy::default(),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod provider;
pub mod quote;
pub mod retry;
pub mod util;

pub use client::{JupiterClient, JupiterConfig};
pub use error::{
  ActionProcessingError, QuoteError, ROUTE_PLAN_DOES_NOT_CONSUME_ALL_THE_AMOUNT,
};
pub use provider::SwapQuoteProvider;
pub use quote::{QuoteRequest, SwapInstructions, SwapMode, SwapQuote};
pub use retry::{get_swap_quote_with_retry, RetryPolicy, Sleeper, TokioSleeper};
