//! Builds the atomic flashloan transaction around a swap quote.

use anchor_client::solana_sdk::address_lookup_table::AddressLookupTableAccount;
use anchor_client::solana_sdk::hash::Hash;
use anchor_client::solana_sdk::message::{v0, VersionedMessage};
use anchor_client::solana_sdk::transaction::VersionedTransaction;
use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::Instruction;
use anyhow::Result;
use async_trait::async_trait;
use flashloop_core::limits::{AccountLimitTier, Limits};
use flashloop_core::position::BankSnapshot;
use flashloop_jupiter::util::{decode_instruction, decode_instructions};
use flashloop_jupiter::{SwapQuote, SwapQuoteProvider};
use itertools::Itertools;
use tracing::debug;

use crate::instructions::{
  create_ata_instruction, BundleTip, ComputeBudget, LendingInstructionBuilder,
};
use crate::rpc::RpcProvider;
use crate::size::{verify, BuildResult, SizeCheck, SizeVerdict};
use crate::util::{load_lookup_tables, unsigned_transaction};

/// Lending legs wrapped around the swap. Amounts are native units.
#[derive(Clone, Debug, PartialEq)]
pub enum FlashloanAction {
  /// Borrow, swap into the deposit asset, deposit.
  Loop {
    deposit_bank: BankSnapshot,
    borrow_bank: BankSnapshot,
    deposit_amount: u64,
    borrow_amount: u64,
  },
  /// Withdraw collateral, swap into the borrowed asset, repay.
  RepayWithCollateral {
    deposit_bank: BankSnapshot,
    borrow_bank: BankSnapshot,
    withdraw_amount: u64,
    repay_amount: u64,
    withdraw_all: bool,
    repay_all: bool,
  },
}

impl FlashloanAction {
  fn banks(&self) -> (&BankSnapshot, &BankSnapshot) {
    match self {
      FlashloanAction::Loop {
        deposit_bank,
        borrow_bank,
        ..
      }
      | FlashloanAction::RepayWithCollateral {
        deposit_bank,
        borrow_bank,
        ..
      } => (deposit_bank, borrow_bank),
    }
  }

  /// Bank receiving the swap output.
  fn output_bank(&self) -> &BankSnapshot {
    match self {
      FlashloanAction::Loop { deposit_bank, .. } => deposit_bank,
      FlashloanAction::RepayWithCollateral { borrow_bank, .. } => borrow_bank,
    }
  }

  /// Lending instructions before and after the swap.
  fn legs<L: LendingInstructionBuilder + ?Sized>(
    &self,
    lending: &L,
    user: Pubkey,
  ) -> Result<(Vec<Instruction>, Vec<Instruction>)> {
    match self {
      FlashloanAction::Loop {
        deposit_bank,
        borrow_bank,
        deposit_amount,
        borrow_amount,
      } => Ok((
        lending.borrow(user, borrow_bank, *borrow_amount)?,
        lending.deposit(user, deposit_bank, *deposit_amount)?,
      )),
      FlashloanAction::RepayWithCollateral {
        deposit_bank,
        borrow_bank,
        withdraw_amount,
        repay_amount,
        withdraw_all,
        repay_all,
      } => Ok((
        lending.withdraw(user, deposit_bank, *withdraw_amount, *withdraw_all)?,
        lending.repay(user, borrow_bank, *repay_amount, *repay_all)?,
      )),
    }
  }
}

/// Everything needed to assemble one tier's candidate transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembleRequest {
  pub user: Pubkey,
  pub quote: SwapQuote,
  pub action: FlashloanAction,
  pub tier: AccountLimitTier,
}

/// Turns a quote and lending action into a size-classified transaction.
#[async_trait]
pub trait TransactionAssembler: Send + Sync {
  /// # Errors
  /// * Swap instruction fetch, lookup table resolution, instruction building
  ///   or message compilation failed. Size overflow is not an error.
  async fn assemble(&self, request: &AssembleRequest) -> Result<BuildResult>;
}

/// Flashloan assembler over a swap router, an RPC node and the lending
/// program's instruction builder.
pub struct FlashloanAssembler<P, R, L> {
  router: P,
  rpc: R,
  lending: L,
  compute_budget: ComputeBudget,
  bundle_tip: Option<BundleTip>,
  limits: Limits,
}

impl<P, R, L> FlashloanAssembler<P, R, L>
where
  P: SwapQuoteProvider,
  R: RpcProvider,
  L: LendingInstructionBuilder,
{
  #[must_use]
  pub fn new(router: P, rpc: R, lending: L) -> Self {
    FlashloanAssembler {
      router,
      rpc,
      lending,
      compute_budget: ComputeBudget::default(),
      bundle_tip: None,
      limits: Limits::default(),
    }
  }

  #[must_use]
  pub fn with_compute_budget(mut self, compute_budget: ComputeBudget) -> Self {
    self.compute_budget = compute_budget;
    self
  }

  #[must_use]
  pub fn with_bundle_tip(mut self, bundle_tip: BundleTip) -> Self {
    self.bundle_tip = Some(bundle_tip);
    self
  }

  #[must_use]
  pub fn with_limits(mut self, limits: Limits) -> Self {
    self.limits = limits;
    self
  }

  fn compile(
    user: &Pubkey,
    instructions: &[Instruction],
    lookup_tables: &[AddressLookupTableAccount],
    blockhash: Hash,
  ) -> Result<VersionedTransaction> {
    let message =
      v0::Message::try_compile(user, instructions, lookup_tables, blockhash)?;
    Ok(unsigned_transaction(VersionedMessage::V0(message)))
  }
}

#[async_trait]
impl<P, R, L> TransactionAssembler for FlashloanAssembler<P, R, L>
where
  P: SwapQuoteProvider,
  R: RpcProvider,
  L: LendingInstructionBuilder,
{
  async fn assemble(&self, request: &AssembleRequest) -> Result<BuildResult> {
    let AssembleRequest {
      user,
      quote,
      action,
      tier,
    } = request;
    let swap = self.router.swap_instructions(quote, *user).await?;

    let table_keys = self
      .lending
      .lookup_tables()
      .iter()
      .chain(&swap.address_lookup_table_addresses)
      .copied()
      .collect_vec();
    let lookup_tables = load_lookup_tables(&self.rpc, &table_keys).await?;

    let output_bank = action.output_bank();
    let mut setup = vec![create_ata_instruction(
      *user,
      output_bank.mint,
      output_bank.token_program,
    )];
    setup.extend(decode_instructions(&swap.setup_instructions)?);

    let (before_swap, after_swap) = action.legs(&self.lending, *user)?;
    let core = before_swap
      .into_iter()
      .chain([decode_instruction(&swap.swap_instruction)?])
      .chain(after_swap)
      .collect_vec();

    let mut instructions = self.compute_budget.instructions(self.bundle_tip.is_some());
    if !tier.is_txn_split {
      instructions.append(&mut setup);
    }
    let end_index = u64::try_from(instructions.len() + 1 + core.len())?;
    let (deposit_bank, borrow_bank) = action.banks();
    instructions.push(self.lending.start_flashloan(*user, end_index)?);
    instructions.extend(core);
    instructions.push(
      self
        .lending
        .end_flashloan(*user, &[deposit_bank.address, borrow_bank.address])?,
    );
    if let Some(cleanup) = &swap.cleanup_instruction {
      instructions.push(decode_instruction(cleanup)?);
    }

    let blockhash = self.rpc.get_latest_blockhash().await?;
    let transaction = Self::compile(user, &instructions, &lookup_tables, blockhash)?;
    let result = verify(transaction, lookup_tables, &self.limits);
    debug!(
      %tier,
      message_size = result.size().message_size,
      account_keys = result.size().account_keys,
      instructions = instructions.len(),
      "assembled flashloan candidate"
    );

    let BuildResult::Fits(mut built) = result else {
      return Ok(result);
    };
    if !setup.is_empty() {
      let setup_txn = Self::compile(user, &setup, &built.lookup_tables, blockhash)?;
      let setup_size = SizeCheck::measure(&setup_txn.message);
      match setup_size.verdict(&self.limits) {
        SizeVerdict::Fits => built.setup_txn = Some(setup_txn),
        SizeVerdict::TooManyKeys => return Ok(BuildResult::TooManyKeys(setup_size)),
        SizeVerdict::TooLarge => return Ok(BuildResult::TooLarge(setup_size)),
      }
    }
    if let Some(tip) = &self.bundle_tip {
      built.bundle_tip_txn =
        Some(Self::compile(user, &[tip.instruction(user)], &[], blockhash)?);
    }
    Ok(BuildResult::Fits(built))
  }
}
