//! Instruction sources for the flashloan transaction.
//!
//! The lending protocol's own instruction encoding lives behind
//! [`LendingInstructionBuilder`]; this module adds the pieces every flashloan
//! needs regardless of protocol: compute budget, token accounts and the
//! optional bundle tip.

use anchor_client::solana_sdk::compute_budget::ComputeBudgetInstruction;
use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_spl::associated_token::spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use anyhow::Result;
use flashloop_core::position::BankSnapshot;
use solana_system_interface::instruction as system_instruction;

/// Instruction encoding of the margin-lending program.
///
/// Amounts are native units of the bank's mint.
pub trait LendingInstructionBuilder: Send + Sync {
  /// Lookup tables the protocol publishes for its own accounts.
  fn lookup_tables(&self) -> &[Pubkey];

  fn deposit(
    &self,
    user: Pubkey,
    bank: &BankSnapshot,
    amount: u64,
  ) -> Result<Vec<Instruction>>;

  fn borrow(
    &self,
    user: Pubkey,
    bank: &BankSnapshot,
    amount: u64,
  ) -> Result<Vec<Instruction>>;

  fn repay(
    &self,
    user: Pubkey,
    bank: &BankSnapshot,
    amount: u64,
    repay_all: bool,
  ) -> Result<Vec<Instruction>>;

  fn withdraw(
    &self,
    user: Pubkey,
    bank: &BankSnapshot,
    amount: u64,
    withdraw_all: bool,
  ) -> Result<Vec<Instruction>>;

  /// Opens the flashloan. `end_index` is the position of the matching
  /// [`Self::end_flashloan`] instruction in the final transaction.
  fn start_flashloan(&self, user: Pubkey, end_index: u64) -> Result<Instruction>;

  /// Closes the flashloan; health is checked against `banks`.
  fn end_flashloan(&self, user: Pubkey, banks: &[Pubkey]) -> Result<Instruction>;
}

/// Compute budget requested by the flashloan transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComputeBudget {
  pub unit_limit: u32,
  /// Priority fee in micro-lamports per compute unit. Zero omits it.
  pub micro_lamports: u64,
}

impl Default for ComputeBudget {
  fn default() -> Self {
    ComputeBudget {
      unit_limit: 1_400_000,
      micro_lamports: 0,
    }
  }
}

impl ComputeBudget {
  /// Compute budget instructions. A bundle pays through its tip, so the
  /// priority fee is dropped when `bundled`.
  #[must_use]
  pub fn instructions(&self, bundled: bool) -> Vec<Instruction> {
    let mut out = vec![ComputeBudgetInstruction::set_compute_unit_limit(
      self.unit_limit,
    )];
    if !bundled && self.micro_lamports > 0 {
      out.push(ComputeBudgetInstruction::set_compute_unit_price(
        self.micro_lamports,
      ));
    }
    out
  }
}

/// Tip paid to a block engine when the transactions ship as a bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BundleTip {
  pub tip_account: Pubkey,
  pub lamports: u64,
}

impl BundleTip {
  #[must_use]
  pub fn instruction(&self, payer: &Pubkey) -> Instruction {
    system_instruction::transfer(payer, &self.tip_account, self.lamports)
  }
}

/// Idempotent ATA creation for `owner`, who also pays.
#[must_use]
pub fn create_ata_instruction(
  owner: Pubkey,
  mint: Pubkey,
  token_program: Pubkey,
) -> Instruction {
  create_associated_token_account_idempotent(&owner, &owner, &mint, &token_program)
}
