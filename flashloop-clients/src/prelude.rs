pub use anchor_lang::prelude::Pubkey;
pub use anyhow::Result;
pub use flashloop_core::action::{ActionMessage, ActionMethod};
pub use flashloop_core::limits::{AccountLimitTier, Limits, DEFAULT_TIERS};
pub use flashloop_core::position::{BankSnapshot, Position, PriceQuote};
pub use flashloop_core::repay_math::MaxRepayable;
pub use flashloop_core::slippage_config::SlippageConfig;
pub use flashloop_jupiter::{JupiterClient, JupiterConfig, RetryPolicy};
pub use rust_decimal::Decimal;

pub use crate::assembler::{
  AssembleRequest, FlashloanAction, FlashloanAssembler, TransactionAssembler,
};
pub use crate::engine::{EngineConfig, Flashloop};
pub use crate::instructions::{BundleTip, ComputeBudget, LendingInstructionBuilder};
pub use crate::looping::{LoopingArgs, LoopingParams};
pub use crate::repay_collateral::{RepayCollateralArgs, RepayCollateralParams};
pub use crate::rpc::{RpcProvider, SolanaRpcProvider};
pub use crate::size::{BuildResult, BuiltTransactions, SizeCheck};
