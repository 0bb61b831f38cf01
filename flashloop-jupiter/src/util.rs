use anchor_lang::prelude::AccountMeta;
use anchor_lang::solana_program::instruction::Instruction;
use base64::prelude::{Engine, BASE64_STANDARD};

use crate::error::QuoteError;
use crate::quote::InstructionPayload;

/// `u64` amounts encoded as decimal strings.
pub mod amount_str {
  use serde::{de, Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(
    amount: &u64,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    serializer.collect_str(amount)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<u64, D::Error> {
    let text = String::deserialize(deserializer)?;
    text.parse().map_err(de::Error::custom)
  }
}

/// Base58 encoded public keys.
pub mod pubkey_str {
  use std::str::FromStr;

  use anchor_lang::prelude::Pubkey;
  use serde::{de, Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(
    key: &Pubkey,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    serializer.collect_str(key)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Pubkey, D::Error> {
    let text = String::deserialize(deserializer)?;
    Pubkey::from_str(&text).map_err(de::Error::custom)
  }

  pub mod vec {
    use std::str::FromStr;

    use anchor_lang::prelude::Pubkey;
    use serde::ser::SerializeSeq;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
      keys: &[Pubkey],
      serializer: S,
    ) -> Result<S::Ok, S::Error> {
      let mut seq = serializer.serialize_seq(Some(keys.len()))?;
      for key in keys {
        seq.serialize_element(&key.to_string())?;
      }
      seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
      deserializer: D,
    ) -> Result<Vec<Pubkey>, D::Error> {
      Vec::<String>::deserialize(deserializer)?
        .iter()
        .map(|text| Pubkey::from_str(text).map_err(de::Error::custom))
        .collect()
    }
  }
}

/// Decodes a router instruction into a Solana [`Instruction`].
///
/// # Errors
/// * Instruction data is not valid base64
pub fn decode_instruction(
  payload: &InstructionPayload,
) -> Result<Instruction, QuoteError> {
  let data = BASE64_STANDARD
    .decode(&payload.data)
    .map_err(|err| QuoteError::Decode(format!("instruction data: {err}")))?;
  let accounts = payload
    .accounts
    .iter()
    .map(|meta| AccountMeta {
      pubkey: meta.pubkey,
      is_signer: meta.is_signer,
      is_writable: meta.is_writable,
    })
    .collect();
  Ok(Instruction {
    program_id: payload.program_id,
    accounts,
    data,
  })
}

/// Decodes a list of router instructions.
///
/// # Errors
/// * Any instruction fails to decode
pub fn decode_instructions(
  payloads: &[InstructionPayload],
) -> Result<Vec<Instruction>, QuoteError> {
  payloads.iter().map(decode_instruction).collect()
}
