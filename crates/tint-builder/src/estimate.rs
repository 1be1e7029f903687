//! Transaction size and fee estimation.
//!
//! Sizes are computed from the unsigned transaction: the base serialization
//! with inputs cleared, plus a per-input allowance of 41 bytes (outpoint 36
//! + sequence 4 + script-length 1) and a template-specific dummy scriptSig.

use tint_script::chunk::push_data_prefix;
use tint_script::{Script, ScriptTemplate};
use tint_transaction::Transaction;

use crate::builder::TransactionBuilder;
use crate::fee::FeeRate;
use crate::BuilderError;

/// Size of a pushed dummy signature: 71-byte DER plus the sighash byte.
const DUMMY_SIGNATURE_LEN: usize = 72;

/// Size of a pushed compressed public key.
const DUMMY_PUBKEY_LEN: usize = 33;

/// Per-input overhead: outpoint (36) + sequence (4) + script length (1).
const INPUT_OVERHEAD: usize = 41;

impl TransactionBuilder {
    /// Estimate the signed size of a transaction in bytes.
    ///
    /// Every input's coin is resolved to pick the dummy scriptSig matching
    /// its template; colored inputs estimate as their bearer coin.
    ///
    /// # Arguments
    /// * `transaction` - The (typically unsigned) transaction to measure.
    ///
    /// # Returns
    /// The estimated byte size, or `CoinNotFound` for an unresolvable
    /// input.
    pub fn estimate_size(&self, transaction: &Transaction) -> Result<usize, BuilderError> {
        let mut base = transaction.clone();
        base.inputs.clear();
        let mut size = base.size();

        for (input_index, input) in transaction.inputs.iter().enumerate() {
            let coin = self
                .find_coin(&input.previous_outpoint)
                .ok_or(BuilderError::CoinNotFound {
                    outpoint: input.previous_outpoint,
                    input_index,
                })?;
            let redeem = coin
                .redeem_script()
                .cloned()
                .or_else(|| self.known_redeem_for(coin.locking_script()));
            size += INPUT_OVERHEAD + estimate_script_sig_len(coin.locking_script(), redeem.as_ref());
        }

        Ok(size)
    }

    /// Estimate the fees of a transaction at the given rate.
    ///
    /// # Arguments
    /// * `transaction` - The transaction to measure.
    /// * `rate` - The fee rate to apply.
    ///
    /// # Returns
    /// `rate.fee(estimated size)`.
    pub fn estimate_fees(
        &self,
        transaction: &Transaction,
        rate: &FeeRate,
    ) -> Result<i64, BuilderError> {
        Ok(rate.fee(self.estimate_size(transaction)?))
    }
}

/// Estimate the scriptSig length for an output script.
///
/// | Template         | Dummy scriptSig                                |
/// |------------------|------------------------------------------------|
/// | pay-to-pubkey    | pushed dummy signature                         |
/// | pay-to-pubkey-hash | dummy signature + dummy pubkey               |
/// | multisig n-of-m  | leading zero + n dummy signatures              |
/// | pay-to-script-hash | redeem template estimate + pushed redeem     |
/// | unknown          | the output script's own length (worst case)    |
pub(crate) fn estimate_script_sig_len(locking_script: &Script, redeem: Option<&Script>) -> usize {
    match ScriptTemplate::classify(locking_script) {
        ScriptTemplate::PayToPubkey { .. } => 1 + DUMMY_SIGNATURE_LEN,
        ScriptTemplate::PayToPubkeyHash { .. } => {
            (1 + DUMMY_SIGNATURE_LEN) + (1 + DUMMY_PUBKEY_LEN)
        }
        ScriptTemplate::Multisig { required, .. } => 1 + required * (1 + DUMMY_SIGNATURE_LEN),
        ScriptTemplate::PayToScriptHash { .. } => match redeem {
            Some(redeem) => {
                let push_prefix = push_data_prefix(redeem.len()).map(|p| p.len()).unwrap_or(5);
                estimate_script_sig_len(redeem, None) + push_prefix + redeem.len()
            }
            None => locking_script.len(),
        },
        ScriptTemplate::NullData | ScriptTemplate::Unknown => locking_script.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_script::template::{multisig, pay_to_pubkey, pay_to_pubkey_hash, pay_to_script};

    const PUBKEY_HEX: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    /// Verify the P2PKH estimate is the conventional ~107 bytes.
    #[test]
    fn test_p2pkh_estimate() {
        let script = pay_to_pubkey_hash(&[1u8; 20]);
        assert_eq!(estimate_script_sig_len(&script, None), 107);
    }

    /// Verify the P2PK estimate is a single pushed signature.
    #[test]
    fn test_p2pk_estimate() {
        let pubkey = hex::decode(PUBKEY_HEX).unwrap();
        let script = pay_to_pubkey(&pubkey).unwrap();
        assert_eq!(estimate_script_sig_len(&script, None), 73);
    }

    /// Verify the multisig estimate scales with the threshold, not the
    /// key count.
    #[test]
    fn test_multisig_estimate() {
        let keys: Vec<Vec<u8>> = (0..3).map(|_| hex::decode(PUBKEY_HEX).unwrap()).collect();
        let script = multisig(2, &keys).unwrap();
        assert_eq!(estimate_script_sig_len(&script, None), 1 + 2 * 73);
    }

    /// Verify the P2SH estimate adds the redeem push to the inner estimate.
    #[test]
    fn test_p2sh_estimate() {
        let keys: Vec<Vec<u8>> = (0..3).map(|_| hex::decode(PUBKEY_HEX).unwrap()).collect();
        let redeem = multisig(2, &keys).unwrap();
        let wrapper = pay_to_script(&redeem);
        let inner = estimate_script_sig_len(&redeem, None);
        // The 105-byte redeem needs an OP_PUSHDATA1 prefix (2 bytes).
        assert_eq!(redeem.len(), 105);
        assert_eq!(
            estimate_script_sig_len(&wrapper, Some(&redeem)),
            inner + 2 + redeem.len()
        );
    }

    /// Verify an unknown template falls back to the script's own length.
    #[test]
    fn test_unknown_estimate() {
        let script = Script::from_bytes(&[0x76, 0x76, 0x87]);
        assert_eq!(estimate_script_sig_len(&script, None), 3);
    }
}
