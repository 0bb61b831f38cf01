use anchor_lang::prelude::error_code;

#[error_code]
pub enum CoreError {
  // `conversion`
  #[msg("Arithmetic error while converting UI amount to native units.")]
  UiToNative = 7000,
  #[msg("Arithmetic error while converting native units to UI amount.")]
  NativeToUi,
  #[msg("Overflow while computing USD value of a position.")]
  UsdValue,
  #[msg("Oracle price must be strictly positive.")]
  NonPositivePrice,
  // `looping_math`
  #[msg("Target leverage must be greater than 1.")]
  LeverageTooLow,
  #[msg("Principal amount must be greater than 0.")]
  PrincipalNotPositive,
  #[msg("Slippage buffer consumes the entire principal.")]
  SlippageBufferExhausted,
  #[msg("Arithmetic error while computing looping amounts.")]
  LoopingArithmetic,
  // `repay_math`
  #[msg("Collateral repay requires active deposit and borrow positions.")]
  InactivePosition,
  #[msg("Arithmetic error while computing repayable collateral.")]
  RepayArithmetic,
  // `slippage_config`
  #[msg("Over/underflow while applying slippage to an amount.")]
  SlippageArithmetic,
}
