//! RPC provider abstraction (enables testing)

use std::sync::Arc;

use anchor_client::solana_sdk::account::Account;
use anchor_client::solana_sdk::hash::Hash;
use anchor_lang::prelude::Pubkey;
use anyhow::Result;
use async_trait::async_trait;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;

/// RPC reads the assembler needs: a blockhash to compile against and raw
/// lookup table accounts.
#[async_trait]
pub trait RpcProvider: Send + Sync {
  /// # Errors
  /// Returns error if RPC call fails.
  async fn get_latest_blockhash(&self) -> Result<Hash>;

  /// # Errors
  /// Returns error if RPC call fails.
  async fn get_multiple_accounts(
    &self,
    pubkeys: &[Pubkey],
  ) -> Result<Vec<Option<Account>>>;
}

/// Real RPC provider wrapping Solana's `RpcClient`
pub struct SolanaRpcProvider {
  client: Arc<RpcClient>,
}

impl SolanaRpcProvider {
  #[must_use]
  pub fn new(client: Arc<RpcClient>) -> Self {
    Self { client }
  }
}

#[async_trait]
impl RpcProvider for SolanaRpcProvider {
  async fn get_latest_blockhash(&self) -> Result<Hash> {
    Ok(self.client.get_latest_blockhash().await?)
  }

  async fn get_multiple_accounts(
    &self,
    pubkeys: &[Pubkey],
  ) -> Result<Vec<Option<Account>>> {
    Ok(self.client.get_multiple_accounts(pubkeys).await?)
  }
}
