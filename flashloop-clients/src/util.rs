use anchor_client::solana_sdk::account::Account;
use anchor_client::solana_sdk::address_lookup_table::state::AddressLookupTable;
use anchor_client::solana_sdk::address_lookup_table::AddressLookupTableAccount;
use anchor_client::solana_sdk::message::VersionedMessage;
use anchor_client::solana_sdk::signature::Signature;
use anchor_client::solana_sdk::transaction::VersionedTransaction;
use anchor_lang::prelude::Pubkey;
use anyhow::{anyhow, Result};
use itertools::Itertools;

use crate::rpc::RpcProvider;

/// Deserializes an account into an address lookup table.
///
/// # Errors
/// - Account data cannot be deserialized
pub fn deserialize_lookup_table(
  key: &Pubkey,
  account: &Account,
) -> Result<AddressLookupTableAccount> {
  let table = AddressLookupTable::deserialize(&account.data)?;
  Ok(AddressLookupTableAccount {
    key: *key,
    addresses: table.addresses.to_vec(),
  })
}

/// Loads address lookup tables at given addresses, skipping duplicates.
///
/// # Errors
/// - Failed to fetch lookup table accounts
/// - A table does not exist or fails to deserialize
pub async fn load_lookup_tables<R: RpcProvider + ?Sized>(
  rpc: &R,
  pubkeys: &[Pubkey],
) -> Result<Vec<AddressLookupTableAccount>> {
  let pubkeys = pubkeys.iter().copied().unique().collect_vec();
  if pubkeys.is_empty() {
    return Ok(vec![]);
  }
  rpc
    .get_multiple_accounts(&pubkeys)
    .await?
    .iter()
    .zip(&pubkeys)
    .map(|(opt, key)| {
      if let Some(account) = opt {
        deserialize_lookup_table(key, account)
      } else {
        Err(anyhow!("No lookup table found at address {key}."))
      }
    })
    .try_collect()
}

/// Wraps a compiled message with placeholder signatures; signing happens in
/// the wallet layer.
#[must_use]
pub fn unsigned_transaction(message: VersionedMessage) -> VersionedTransaction {
  let num_sigs = message.header().num_required_signatures.into();
  VersionedTransaction {
    signatures: vec![Signature::default(); num_sigs],
    message,
  }
}
