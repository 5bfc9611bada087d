use crate::models::{AddressValidation, Chain};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static ETHEREUM_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("ethereum address pattern"));

// Base58 alphabet: no 0, O, I or l
static SOLANA_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").expect("solana address pattern")
});

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Unrecognized address format: {0}")]
    UnrecognizedAddress(String),
}

/// Map a raw address to its chain by format alone. Case-sensitive, no trimming.
pub fn classify(address: &str) -> Option<Chain> {
    if ETHEREUM_ADDRESS.is_match(address) {
        Some(Chain::Ethereum)
    } else if SOLANA_ADDRESS.is_match(address) {
        Some(Chain::Solana)
    } else {
        None
    }
}

pub fn validate_address(address: &str) -> AddressValidation {
    let chain = classify(address);
    AddressValidation {
        is_valid: chain.is_some(),
        chain,
    }
}

pub fn require_chain(address: &str) -> Result<Chain, ValidationError> {
    if address.trim().is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    classify(address).ok_or_else(|| ValidationError::UnrecognizedAddress(address.to_string()))
}
