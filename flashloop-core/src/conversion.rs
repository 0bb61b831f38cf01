use crate::error::CoreError::{NativeToUi, NonPositivePrice, UiToNative, UsdValue};

use anchor_lang::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// `10^decimals` as a decimal scale factor.
fn scale(decimals: u8) -> Option<Decimal> {
  10u64.checked_pow(u32::from(decimals)).map(Decimal::from)
}

/// Converts a UI amount into native token units, rounding toward zero.
///   `floor(AMOUNT * 10^DECIMALS)`
pub fn ui_to_native(amount: Decimal, decimals: u8) -> Result<u64> {
  scale(decimals)
    .and_then(|factor| amount.checked_mul(factor))
    .map(|native| native.floor())
    .and_then(|native| native.to_u64())
    .ok_or(UiToNative.into())
}

/// Converts native token units into a UI amount without loss of precision.
///   `NATIVE / 10^DECIMALS`
pub fn native_to_ui(native: u64, decimals: u8) -> Result<Decimal> {
  Decimal::try_from_i128_with_scale(i128::from(native), u32::from(decimals))
    .map(|ui| ui.normalize())
    .map_err(|_| NativeToUi.into())
}

/// USD value of a UI amount at the given oracle price.
pub fn usd_value(amount: Decimal, price: Decimal) -> Result<Decimal> {
  amount.checked_mul(price).ok_or(UsdValue.into())
}

/// Rejects zero or negative oracle prices before they are used as divisors.
pub fn validate_price(price: Decimal) -> Result<Decimal> {
  if price > Decimal::ZERO {
    Ok(price)
  } else {
    Err(NonPositivePrice.into())
  }
}
