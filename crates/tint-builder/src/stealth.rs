//! Stealth payments.
//!
//! A stealth address publishes a scan key and one or more spend keys; each
//! payment derives a one-time key per spend key as
//! `spend_pub + SHA-256(ECDH(ephemeral, scan)) * G`, pays to the derived
//! key's script, and records the ephemeral public key in the transaction's
//! single OP_RETURN slot so the receiver can uncover the spend key with the
//! matching scan private key.

use tint_primitives::ec::{PrivateKey, PublicKey};
use tint_primitives::hash::sha256;
use tint_script::template::{multisig, null_data, pay_to_pubkey_hash};
use tint_script::Script;

use crate::BuilderError;

/// Prefix byte of the stealth metadata payload inside the OP_RETURN output.
pub const STEALTH_METADATA_PREFIX: u8 = 0x06;

/// A stealth address: scan key plus spend keys.
#[derive(Clone, Debug)]
pub struct StealthAddress {
    /// The scan public key shared with senders.
    pub scan_key: PublicKey,
    /// The spend public keys; one produces a P2PKH payment, several a
    /// multisig payment.
    pub spend_keys: Vec<PublicKey>,
    /// Signatures required to spend a multisig payment.
    pub signature_count: usize,
}

impl StealthAddress {
    /// Create a stealth address.
    ///
    /// # Arguments
    /// * `scan_key` - The scan public key.
    /// * `spend_keys` - One or more spend public keys.
    /// * `signature_count` - Signatures required (1..=spend key count).
    ///
    /// # Returns
    /// `Ok(StealthAddress)`, or an error for an empty key set or an
    /// out-of-range signature count.
    pub fn new(
        scan_key: PublicKey,
        spend_keys: Vec<PublicKey>,
        signature_count: usize,
    ) -> Result<Self, BuilderError> {
        if spend_keys.is_empty() {
            return Err(BuilderError::InvalidStealthAddress(
                "at least one spend key is required".to_string(),
            ));
        }
        if signature_count == 0 || signature_count > spend_keys.len() {
            return Err(BuilderError::InvalidStealthAddress(format!(
                "signature count {} out of range for {} spend keys",
                signature_count,
                spend_keys.len()
            )));
        }
        Ok(StealthAddress {
            scan_key,
            spend_keys,
            signature_count,
        })
    }

    /// Derive the payment for a given ephemeral key.
    ///
    /// # Arguments
    /// * `ephemeral` - The sender's ephemeral private key.
    /// * `nonce` - A sender-chosen nonce recorded in the metadata payload.
    ///
    /// # Returns
    /// The payment script pair, or an error if derivation hits the point at
    /// infinity.
    pub fn create_payment(
        &self,
        ephemeral: &PrivateKey,
        nonce: u32,
    ) -> Result<StealthPayment, BuilderError> {
        let secret = shared_secret(ephemeral, &self.scan_key)?;

        let mut derived = Vec::with_capacity(self.spend_keys.len());
        for spend_key in &self.spend_keys {
            derived.push(spend_key.tweak_add(&secret)?);
        }

        let payment_script = if derived.len() == 1 {
            pay_to_pubkey_hash(&derived[0].hash160())
        } else {
            let pubkeys: Vec<Vec<u8>> = derived.iter().map(|k| k.to_compressed().to_vec()).collect();
            multisig(self.signature_count, &pubkeys)?
        };

        let mut payload = Vec::with_capacity(1 + 4 + 33);
        payload.push(STEALTH_METADATA_PREFIX);
        payload.extend_from_slice(&nonce.to_le_bytes());
        payload.extend_from_slice(&ephemeral.pub_key().to_compressed());

        Ok(StealthPayment {
            metadata_script: null_data(&payload)?,
            payment_script,
        })
    }
}

/// The two outputs of a stealth payment: the OP_RETURN metadata carrier and
/// the actual payment script.
#[derive(Clone, Debug)]
pub struct StealthPayment {
    /// Zero-value metadata output script carrying the ephemeral key.
    pub metadata_script: Script,
    /// The script receiving the paid amount.
    pub payment_script: Script,
}

/// Compute the stealth shared secret between one private and one public key.
///
/// Both sides reach the same value: the sender uses (ephemeral_priv,
/// scan_pub), the receiver (scan_priv, ephemeral_pub).
///
/// # Arguments
/// * `private_key` - This side's private key.
/// * `public_key` - The other side's public key.
///
/// # Returns
/// SHA-256 of the compressed ECDH point.
pub fn shared_secret(
    private_key: &PrivateKey,
    public_key: &PublicKey,
) -> Result<[u8; 32], BuilderError> {
    let point = private_key.shared_point(public_key)?;
    Ok(sha256(&point.to_compressed()))
}

/// Uncover the one-time spend private keys for a received payment.
///
/// # Arguments
/// * `scan_key` - The receiver's scan private key.
/// * `ephemeral_key` - The sender's ephemeral public key from the metadata.
/// * `spend_keys` - The receiver's spend private keys.
///
/// # Returns
/// The tweaked spend keys, in the same order as `spend_keys`.
pub fn uncover_spend_keys(
    scan_key: &PrivateKey,
    ephemeral_key: &PublicKey,
    spend_keys: &[PrivateKey],
) -> Result<Vec<PrivateKey>, BuilderError> {
    let secret = shared_secret(scan_key, ephemeral_key)?;
    let mut uncovered = Vec::with_capacity(spend_keys.len());
    for spend_key in spend_keys {
        uncovered.push(spend_key.tweak_add(&secret)?);
    }
    Ok(uncovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_script::ScriptTemplate;

    /// Verify the sender-derived payment script is spendable by the
    /// receiver-uncovered key.
    #[test]
    fn test_uncover_matches_payment() {
        let scan = PrivateKey::new();
        let spend = PrivateKey::new();
        let ephemeral = PrivateKey::new();

        let address =
            StealthAddress::new(scan.pub_key(), vec![spend.pub_key()], 1).expect("valid address");
        let payment = address.create_payment(&ephemeral, 7).expect("payment derives");

        let uncovered = uncover_spend_keys(&scan, &ephemeral.pub_key(), &[spend])
            .expect("uncover succeeds");
        assert_eq!(uncovered.len(), 1);

        let expected = pay_to_pubkey_hash(&uncovered[0].pub_key().hash160());
        assert_eq!(payment.payment_script, expected);
    }

    /// Verify multi-spend-key addresses derive a multisig payment.
    #[test]
    fn test_multisig_payment() {
        let scan = PrivateKey::new();
        let spends = vec![PrivateKey::new(), PrivateKey::new()];
        let ephemeral = PrivateKey::new();

        let address = StealthAddress::new(
            scan.pub_key(),
            spends.iter().map(|k| k.pub_key()).collect(),
            2,
        )
        .expect("valid address");
        let payment = address.create_payment(&ephemeral, 0).expect("payment derives");

        match ScriptTemplate::classify(&payment.payment_script) {
            ScriptTemplate::Multisig { required, pubkeys } => {
                assert_eq!(required, 2);
                assert_eq!(pubkeys.len(), 2);
            }
            other => panic!("expected multisig payment, got {:?}", other),
        }
    }

    /// Verify the metadata payload shape: prefix, nonce, ephemeral key.
    #[test]
    fn test_metadata_payload() {
        let scan = PrivateKey::new();
        let spend = PrivateKey::new();
        let ephemeral = PrivateKey::new();

        let address =
            StealthAddress::new(scan.pub_key(), vec![spend.pub_key()], 1).expect("valid address");
        let payment = address
            .create_payment(&ephemeral, 0xDEADBEEF)
            .expect("payment derives");

        assert!(payment.metadata_script.is_null_data());
        let chunks = payment.metadata_script.chunks().expect("parses");
        let payload = chunks[1].push_bytes().expect("push");
        assert_eq!(payload.len(), 38);
        assert_eq!(payload[0], STEALTH_METADATA_PREFIX);
        assert_eq!(&payload[1..5], &0xDEADBEEFu32.to_le_bytes());
        assert_eq!(&payload[5..], &ephemeral.pub_key().to_compressed());
    }

    /// Verify address validation rejects bad parameters.
    #[test]
    fn test_address_validation() {
        let scan = PrivateKey::new().pub_key();
        let spend = PrivateKey::new().pub_key();
        assert!(StealthAddress::new(scan.clone(), vec![], 1).is_err());
        assert!(StealthAddress::new(scan.clone(), vec![spend.clone()], 0).is_err());
        assert!(StealthAddress::new(scan, vec![spend], 2).is_err());
    }
}
