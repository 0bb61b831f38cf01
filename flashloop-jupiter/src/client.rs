//! HTTP implementation of [`SwapQuoteProvider`] against the Jupiter v6 API.

use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use tracing::debug;

use crate::error::QuoteError;
use crate::provider::SwapQuoteProvider;
use crate::quote::{
  ProviderErrorBody, QuoteRequest, SwapInstructions, SwapInstructionsRequest,
  SwapQuote,
};

pub const DEFAULT_JUPITER_API_URL: &str = "https://quote-api.jup.ag/v6";

/// Connection settings for the quote endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JupiterConfig {
  pub base_url: String,
  pub api_key: Option<String>,
  /// Per-request HTTP timeout.
  pub timeout: Duration,
}

impl Default for JupiterConfig {
  fn default() -> Self {
    JupiterConfig {
      base_url: DEFAULT_JUPITER_API_URL.to_string(),
      api_key: None,
      timeout: Duration::from_secs(10),
    }
  }
}

impl JupiterConfig {
  /// Reads `JUPITER_API_URL` and `JUPITER_API_KEY`, falling back to defaults.
  #[must_use]
  pub fn from_env() -> Self {
    let defaults = JupiterConfig::default();
    JupiterConfig {
      base_url: std::env::var("JUPITER_API_URL").unwrap_or(defaults.base_url),
      api_key: std::env::var("JUPITER_API_KEY").ok(),
      timeout: defaults.timeout,
    }
  }
}

/// Jupiter quote gateway.
#[derive(Clone, Debug)]
pub struct JupiterClient {
  http: reqwest::Client,
  base_url: String,
}

impl JupiterClient {
  /// Builds the HTTP client with the configured timeout and API key header.
  ///
  /// # Errors
  /// * API key is not a valid header value
  /// * TLS backend initialization
  pub fn new(config: JupiterConfig) -> Result<Self, QuoteError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(key) = &config.api_key {
      let value = HeaderValue::from_str(key)
        .map_err(|err| QuoteError::Decode(format!("api key header: {err}")))?;
      headers.insert("x-api-key", value);
    }
    let http = reqwest::Client::builder()
      .timeout(config.timeout)
      .default_headers(headers)
      .build()?;
    Ok(JupiterClient {
      http,
      base_url: config.base_url.trim_end_matches('/').to_string(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/{path}", self.base_url)
  }
}

/// Maps a non-success response to [`QuoteError::Provider`], keeping the
/// provider's `errorCode` when the body carries one.
async fn provider_error(status: StatusCode, response: Response) -> QuoteError {
  let text = response.text().await.unwrap_or_default();
  let body = serde_json::from_str::<ProviderErrorBody>(&text).unwrap_or_default();
  QuoteError::Provider {
    status: status.as_u16(),
    error_code: body.error_code,
    message: body.error.unwrap_or(text),
  }
}

#[async_trait]
impl SwapQuoteProvider for JupiterClient {
  async fn quote(
    &self,
    request: &QuoteRequest,
  ) -> Result<SwapQuote, QuoteError> {
    debug!(
      input_mint = %request.input_mint,
      output_mint = %request.output_mint,
      amount = request.amount,
      max_accounts = ?request.max_accounts,
      "requesting swap quote"
    );
    let response = self
      .http
      .get(self.url("quote"))
      .query(&request.query_pairs())
      .send()
      .await?;
    let status = response.status();
    if !status.is_success() {
      return Err(provider_error(status, response).await);
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice::<SwapQuote>(&bytes)
      .map_err(|err| QuoteError::Decode(err.to_string()))?
      .validate()
  }

  async fn swap_instructions(
    &self,
    quote: &SwapQuote,
    user: Pubkey,
  ) -> Result<SwapInstructions, QuoteError> {
    let body = SwapInstructionsRequest {
      quote_response: quote,
      user_public_key: user.to_string(),
      wrap_and_unwrap_sol: true,
      dynamic_slippage: quote.computed_auto_slippage.map(|_| true),
    };
    let response = self
      .http
      .post(self.url("swap-instructions"))
      .json(&body)
      .send()
      .await?;
    let status = response.status();
    if !status.is_success() {
      return Err(provider_error(status, response).await);
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
      .map_err(|err| QuoteError::Decode(err.to_string()))
  }
}
