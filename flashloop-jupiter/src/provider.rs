use std::sync::Arc;

use anchor_lang::prelude::Pubkey;
use async_trait::async_trait;

use crate::error::QuoteError;
use crate::quote::{QuoteRequest, SwapInstructions, SwapQuote};

/// Source of swap quotes and the instructions that execute them.
#[async_trait]
pub trait SwapQuoteProvider: Send + Sync {
  /// Requests one quote.
  ///
  /// # Errors
  /// * Transport, provider, or decoding failure
  async fn quote(&self, request: &QuoteRequest)
    -> Result<SwapQuote, QuoteError>;

  /// Resolves a quote into executable instructions for `user`.
  ///
  /// # Errors
  /// * Transport, provider, or decoding failure
  async fn swap_instructions(
    &self,
    quote: &SwapQuote,
    user: Pubkey,
  ) -> Result<SwapInstructions, QuoteError>;
}

#[async_trait]
impl<P: SwapQuoteProvider + ?Sized> SwapQuoteProvider for Arc<P> {
  async fn quote(
    &self,
    request: &QuoteRequest,
  ) -> Result<SwapQuote, QuoteError> {
    (**self).quote(request).await
  }

  async fn swap_instructions(
    &self,
    quote: &SwapQuote,
    user: Pubkey,
  ) -> Result<SwapInstructions, QuoteError> {
    (**self).swap_instructions(quote, user).await
  }
}
