//! Wire types for the Jupiter v6 quote and swap-instructions endpoints.

use anchor_lang::prelude::Pubkey;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::QuoteError;
use crate::util::{amount_str, pubkey_str};

/// Which side of the swap is fixed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapMode {
  #[default]
  ExactIn,
  ExactOut,
}

impl SwapMode {
  #[must_use]
  pub const fn as_str(&self) -> &'static str {
    match self {
      SwapMode::ExactIn => "ExactIn",
      SwapMode::ExactOut => "ExactOut",
    }
  }
}

/// One quote request. `amount` is in native units of the fixed side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteRequest {
  pub input_mint: Pubkey,
  pub output_mint: Pubkey,
  pub amount: u64,
  pub slippage_bps: Option<u16>,
  pub dynamic_slippage: bool,
  pub max_accounts: Option<u32>,
  pub swap_mode: SwapMode,
  pub platform_fee_bps: Option<u16>,
}

impl QuoteRequest {
  #[must_use]
  pub fn exact_in(input_mint: Pubkey, output_mint: Pubkey, amount: u64) -> Self {
    QuoteRequest {
      input_mint,
      output_mint,
      amount,
      slippage_bps: None,
      dynamic_slippage: false,
      max_accounts: None,
      swap_mode: SwapMode::ExactIn,
      platform_fee_bps: None,
    }
  }

  /// Query string pairs in the order the endpoint documents them.
  #[must_use]
  pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
      ("inputMint", self.input_mint.to_string()),
      ("outputMint", self.output_mint.to_string()),
      ("amount", self.amount.to_string()),
      ("swapMode", self.swap_mode.as_str().to_string()),
    ];
    if let Some(bps) = self.slippage_bps {
      pairs.push(("slippageBps", bps.to_string()));
    }
    if self.dynamic_slippage {
      pairs.push(("dynamicSlippage", "true".to_string()));
    }
    if let Some(max_accounts) = self.max_accounts {
      pairs.push(("maxAccounts", max_accounts.to_string()));
    }
    if let Some(fee_bps) = self.platform_fee_bps {
      pairs.push(("platformFeeBps", fee_bps.to_string()));
    }
    pairs
  }
}

/// Quote returned by the router. Never mutated; a new request yields a new
/// quote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
  #[serde(with = "pubkey_str")]
  pub input_mint: Pubkey,
  #[serde(with = "amount_str")]
  pub in_amount: u64,
  #[serde(with = "pubkey_str")]
  pub output_mint: Pubkey,
  #[serde(with = "amount_str")]
  pub out_amount: u64,
  /// Guaranteed floor (`ExactIn`) or ceiling (`ExactOut`) after slippage.
  #[serde(with = "amount_str")]
  pub other_amount_threshold: u64,
  pub swap_mode: SwapMode,
  pub slippage_bps: u16,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub computed_auto_slippage: Option<u16>,
  pub price_impact_pct: Decimal,
  /// Opaque, handed back untouched to the swap-instructions endpoint.
  pub route_plan: Vec<Value>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl SwapQuote {
  /// Rejects quotes the router should never have produced.
  ///
  /// # Errors
  /// * Zero input or output amount
  /// * Empty route
  pub fn validate(self) -> Result<SwapQuote, QuoteError> {
    if self.in_amount == 0 || self.out_amount == 0 {
      Err(QuoteError::Decode("quote has zero amount".to_string()))
    } else if self.route_plan.is_empty() {
      Err(QuoteError::Decode("quote has empty route plan".to_string()))
    } else {
      Ok(self)
    }
  }
}

/// Error body returned by the router on non-2xx responses.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderErrorBody {
  #[serde(default)]
  pub error: Option<String>,
  #[serde(default)]
  pub error_code: Option<String>,
}

/// Body of a swap-instructions request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInstructionsRequest<'a> {
  pub quote_response: &'a SwapQuote,
  pub user_public_key: String,
  pub wrap_and_unwrap_sol: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dynamic_slippage: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetaPayload {
  #[serde(with = "pubkey_str")]
  pub pubkey: Pubkey,
  pub is_signer: bool,
  pub is_writable: bool,
}

/// Instruction as the router encodes it, data in base64.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionPayload {
  #[serde(with = "pubkey_str")]
  pub program_id: Pubkey,
  pub accounts: Vec<AccountMetaPayload>,
  pub data: String,
}

/// Instructions that execute a quote, plus the lookup tables the route needs.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInstructions {
  #[serde(default)]
  pub compute_budget_instructions: Vec<InstructionPayload>,
  #[serde(default)]
  pub setup_instructions: Vec<InstructionPayload>,
  pub swap_instruction: InstructionPayload,
  #[serde(default)]
  pub cleanup_instruction: Option<InstructionPayload>,
  #[serde(default, with = "pubkey_str::vec")]
  pub address_lookup_table_addresses: Vec<Pubkey>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  const QUOTE_JSON: &str = r#"{
    "inputMint": "So11111111111111111111111111111111111111112",
    "inAmount": "197000000",
    "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
    "outAmount": "196500000",
    "otherAmountThreshold": "195500000",
    "swapMode": "ExactIn",
    "slippageBps": 50,
    "computedAutoSlippage": 37,
    "priceImpactPct": "0.0012",
    "routePlan": [{"percent": 100, "swapInfo": {"label": "Whirlpool"}}],
    "contextSlot": 301234567,
    "timeTaken": 0.012
  }"#;

  #[test]
  fn decodes_quote() -> serde_json::Result<()> {
    let quote: SwapQuote = serde_json::from_str(QUOTE_JSON)?;
    assert_eq!(quote.in_amount, 197_000_000);
    assert_eq!(quote.other_amount_threshold, 195_500_000);
    assert_eq!(quote.computed_auto_slippage, Some(37));
    assert_eq!(quote.price_impact_pct, dec!(0.0012));
    assert_eq!(quote.extra.get("contextSlot"), Some(&Value::from(301_234_567)));
    Ok(())
  }

  #[test]
  fn reencodes_opaque_fields() -> serde_json::Result<()> {
    let quote: SwapQuote = serde_json::from_str(QUOTE_JSON)?;
    let value = serde_json::to_value(&quote)?;
    assert_eq!(value["inAmount"], Value::from("197000000"));
    assert_eq!(value["routePlan"][0]["swapInfo"]["label"], "Whirlpool");
    assert_eq!(value["timeTaken"], Value::from(0.012));
    Ok(())
  }

  #[test]
  fn query_pairs_skip_unset() {
    let mut request = QuoteRequest::exact_in(
      Pubkey::new_unique(),
      Pubkey::new_unique(),
      1_000,
    );
    assert!(!request.query_pairs().iter().any(|(k, _)| *k == "maxAccounts"));
    request.max_accounts = Some(40);
    request.platform_fee_bps = Some(10);
    let pairs = request.query_pairs();
    assert!(pairs.contains(&("maxAccounts", "40".to_string())));
    assert!(pairs.contains(&("platformFeeBps", "10".to_string())));
  }

  #[test]
  fn zero_out_amount_rejected() -> serde_json::Result<()> {
    let mut quote: SwapQuote = serde_json::from_str(QUOTE_JSON)?;
    quote.out_amount = 0;
    assert!(quote.validate().is_err());
    Ok(())
  }
}
