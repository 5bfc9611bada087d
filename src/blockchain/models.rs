// Solana response shapes and conversion into the unified Transaction model.
//
// Direction is a best-effort heuristic: the SOL balance delta at the wallet's
// account index. `to` is only known when a parsed System Program transfer is
// present; full recipient resolution would need every instruction decoded.

use serde::Deserialize;
use solana_client::rpc_response::RpcConfirmedTransactionStatusWithSignature;
use solana_sdk::system_program::ID as SYSTEM_PROGRAM_ID;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, TransactionConfirmationStatus,
    UiInstruction, UiMessage, UiParsedInstruction,
};
use tracing::warn;

use crate::models::{Transaction, TxStatus, TxType};
use crate::units::format_lamports;

/// One entry of `getTokenAccountsByOwner` with `jsonParsed` encoding
#[derive(Debug, Deserialize)]
pub struct TokenAccount {
    pub account: TokenAccountData,
}

#[derive(Debug, Deserialize)]
pub struct TokenAccountData {
    pub data: ParsedAccountData,
}

#[derive(Debug, Deserialize)]
pub struct ParsedAccountData {
    pub parsed: ParsedTokenAccount,
}

#[derive(Debug, Deserialize)]
pub struct ParsedTokenAccount {
    pub info: TokenAccountInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccountInfo {
    pub mint: String,
    pub token_amount: TokenAmount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    /// Raw base units
    pub amount: String,
    pub decimals: u8,
}

/// Entry of a remote token list
#[derive(Debug, Clone, Deserialize)]
pub struct TokenListEntry {
    pub address: String,
    pub symbol: String,
    pub name: String,
    #[serde(default, rename = "logoURI")]
    pub logo_uri: Option<String>,
}

/// Convert a fetched transaction into the unified model, or `None` when the
/// encoding does not carry what the heuristic needs
pub fn extract_transaction(
    address: &str,
    signature: &RpcConfirmedTransactionStatusWithSignature,
    tx_data: &EncodedConfirmedTransactionWithStatusMeta,
) -> Option<Transaction> {
    let transaction = match &tx_data.transaction.transaction {
        EncodedTransaction::Json(tx) => tx,
        _ => {
            warn!("Unsupported transaction encoding for {}", signature.signature);
            return None;
        }
    };

    let meta = match &tx_data.transaction.meta {
        Some(meta) => meta,
        None => {
            warn!("Transaction {} has no metadata", signature.signature);
            return None;
        }
    };

    let message = match &transaction.message {
        UiMessage::Parsed(message) => message,
        UiMessage::Raw(_) => {
            warn!("Transaction {} has unparsed message", signature.signature);
            return None;
        }
    };

    let account_keys: Vec<String> = message
        .account_keys
        .iter()
        .map(|key| key.pubkey.clone())
        .collect();

    let fee_payer = match account_keys.first() {
        Some(payer) => payer.clone(),
        None => {
            warn!("Transaction {} has no account keys", signature.signature);
            return None;
        }
    };

    let (kind, delta) = infer_direction(address, &account_keys, &meta.pre_balances, &meta.post_balances);

    let to = find_transfer_destination(&message.instructions).unwrap_or_else(|| {
        if kind == TxType::Receive {
            address.to_string()
        } else {
            String::new()
        }
    });

    let status = if signature.confirmation_status == Some(TransactionConfirmationStatus::Processed) {
        TxStatus::Pending
    } else if meta.err.is_some() {
        TxStatus::Failed
    } else {
        TxStatus::Success
    };

    let block_time = tx_data.block_time.or(signature.block_time).unwrap_or(0);
    let Some(timestamp_millis) = block_time.checked_mul(1000) else {
        warn!("Transaction {} has out-of-range block time {}", signature.signature, block_time);
        return None;
    };

    Some(Transaction {
        hash: signature.signature.clone(),
        timestamp_millis,
        from: fee_payer,
        to,
        value: format_lamports(delta),
        fee: format_lamports(meta.fee),
        status,
        kind,
    })
}

/// Compare the wallet's lamports before and after. A decrease is a send, an
/// increase a receive. With no usable delta, the fee payer is assumed to have
/// sent; anything else is `Other`.
pub fn infer_direction(address: &str, account_keys: &[String], pre: &[u64], post: &[u64]) -> (TxType, u64) {
    let index = account_keys.iter().position(|key| key == address);

    if let Some(i) = index {
        if let (Some(&before), Some(&after)) = (pre.get(i), post.get(i)) {
            if after < before {
                return (TxType::Send, before - after);
            }
            if after > before {
                return (TxType::Receive, after - before);
            }
        }
    }

    if index == Some(0) {
        (TxType::Send, 0)
    } else {
        (TxType::Other, 0)
    }
}

/// Destination of the first parsed System Program transfer, if any
fn find_transfer_destination(instructions: &[UiInstruction]) -> Option<String> {
    let system_program = SYSTEM_PROGRAM_ID.to_string();

    instructions.iter().find_map(|instruction| {
        let UiInstruction::Parsed(UiParsedInstruction::Parsed(parsed)) = instruction else {
            return None;
        };
        if parsed.program_id != system_program {
            return None;
        }

        let kind = parsed.parsed.get("type").and_then(|t| t.as_str())?;
        if kind != "transfer" && kind != "transferWithSeed" {
            return None;
        }

        parsed
            .parsed
            .get("info")
            .and_then(|info| info.get("destination"))
            .and_then(|dest| dest.as_str())
            .map(|dest| dest.to_string())
    })
}
