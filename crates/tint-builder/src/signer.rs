//! Input signing, template dispatch, and signature combination.
//!
//! Each input's coin determines the locking script to satisfy; the signer
//! dispatches on its template (pay-to-pubkey, pay-to-pubkey-hash, multisig,
//! P2SH wrapper, with stealth coins first uncovering their one-time keys)
//! and signs with every key it can resolve. Inputs whose keys are unknown
//! stay partially signed for later combination with cooperating signers.

use tint_primitives::ec::{PrivateKey, PublicKey, Signature};
use tint_primitives::hash::hash160;
use tint_script::chunk::ScriptChunk;
use tint_script::opcodes::OP_0;
use tint_script::template::{pay_to_pubkey, pay_to_pubkey_hash};
use tint_script::{Script, ScriptTemplate};
use tint_transaction::sighash::{signature_hash, SIGHASH_ALL};
use tint_transaction::Transaction;

use crate::builder::TransactionBuilder;
use crate::coin::{Coin, StealthCoin};
use crate::BuilderError;

impl TransactionBuilder {
    /// Sign every input of the transaction in place.
    ///
    /// Each input's coin is resolved through the group coin lists and the
    /// coin-finder callback; a missing coin is an error. A missing key
    /// leaves the input (partially) unsigned; an unknown script template
    /// is an error.
    ///
    /// # Arguments
    /// * `transaction` - The transaction to sign.
    ///
    /// # Returns
    /// `Ok(())`, or the first signing error.
    pub fn sign_transaction(&self, transaction: &mut Transaction) -> Result<(), BuilderError> {
        for input_index in 0..transaction.inputs.len() {
            let outpoint = transaction.inputs[input_index].previous_outpoint;
            let coin = self
                .find_coin(&outpoint)
                .ok_or(BuilderError::CoinNotFound {
                    outpoint,
                    input_index,
                })?;

            let mut extra_keys = Vec::new();
            if let Coin::Stealth(stealth) = &coin {
                extra_keys = self.uncover_stealth_keys(stealth);
            }

            let locking_script = coin.locking_script().clone();
            let redeem = coin.redeem_script().cloned();
            let existing = transaction.inputs[input_index].unlocking_script.clone();

            let script_sig = self.sign_input(
                transaction,
                input_index,
                &locking_script,
                existing.as_ref(),
                redeem.as_ref(),
                &extra_keys,
                true,
            )?;
            if let Some(script_sig) = script_sig {
                transaction.inputs[input_index].unlocking_script = Some(script_sig);
            }
        }
        Ok(())
    }

    /// Merge independently signed copies of the same transaction.
    ///
    /// Folds left over the inputs: each pair of scriptSigs is merged
    /// against the spent output's script, deduced from an embedded pubkey
    /// (P2PKH) or redeem script (P2SH) when the coin itself is unknown.
    /// Multisig merging realigns signatures to pubkey slots by
    /// verification, which makes the fold commutative.
    ///
    /// # Arguments
    /// * `transactions` - The signed copies, at least one.
    ///
    /// # Returns
    /// The combined transaction.
    pub fn combine_signatures(
        &self,
        transactions: &[Transaction],
    ) -> Result<Transaction, BuilderError> {
        let mut iter = transactions.iter();
        let mut combined = iter.next().ok_or(BuilderError::NothingToCombine)?.clone();

        for other in iter {
            let count = combined.inputs.len().min(other.inputs.len());
            for index in 0..count {
                let left = combined.inputs[index].unlocking_script.clone();
                let right = other.inputs[index].unlocking_script.clone();
                let merged = self.merge_script_sigs(&combined, index, left, right)?;
                combined.inputs[index].unlocking_script = merged;
            }
        }
        Ok(combined)
    }

    // -----------------------------------------------------------------
    // Template dispatch
    // -----------------------------------------------------------------

    /// Produce an unlocking script for one input, or `None` when no key is
    /// available (the existing scriptSig, if any, is preserved).
    #[allow(clippy::too_many_arguments)]
    fn sign_input(
        &self,
        tx: &Transaction,
        input_index: usize,
        script: &Script,
        existing: Option<&Script>,
        redeem: Option<&Script>,
        extra_keys: &[PrivateKey],
        allow_p2sh: bool,
    ) -> Result<Option<Script>, BuilderError> {
        match ScriptTemplate::classify(script) {
            ScriptTemplate::PayToPubkey { pubkey } => {
                let key = match self.key_for_pubkey(&pubkey, extra_keys) {
                    Some(key) => key,
                    None => return Ok(existing.cloned()),
                };
                let sig = self.input_signature(tx, input_index, script, &key)?;
                let mut out = Script::new();
                out.append_push_data(&sig)?;
                Ok(Some(out))
            }
            ScriptTemplate::PayToPubkeyHash { pubkey_hash } => {
                let key = match self.key_for_pubkey_hash(&pubkey_hash, extra_keys) {
                    Some(key) => key,
                    None => return Ok(existing.cloned()),
                };
                let sig = self.input_signature(tx, input_index, script, &key)?;
                let mut out = Script::new();
                out.append_push_data(&sig)?;
                out.append_push_data(&key.pub_key().to_compressed())?;
                Ok(Some(out))
            }
            ScriptTemplate::Multisig { required, pubkeys } => {
                self.sign_multisig(tx, input_index, script, required, &pubkeys, existing, extra_keys)
            }
            ScriptTemplate::PayToScriptHash { script_hash } => {
                if !allow_p2sh {
                    return Err(BuilderError::UnsupportedScriptTemplate { input_index });
                }
                let redeem = match redeem
                    .cloned()
                    .or_else(|| existing.and_then(redeem_from_script_sig))
                    .or_else(|| self.known_redeem_for(script))
                {
                    Some(redeem) => redeem,
                    // The redeem may be known only to a cooperating signer.
                    None => return Ok(existing.cloned()),
                };
                if hash160(redeem.to_bytes()) != script_hash {
                    return Err(BuilderError::InvalidScriptCoin(
                        "redeem script does not match the output's script hash".to_string(),
                    ));
                }

                let inner_existing = existing.and_then(|s| strip_redeem_push(s, &redeem));
                let inner = self.sign_input(
                    tx,
                    input_index,
                    &redeem,
                    inner_existing.as_ref(),
                    None,
                    extra_keys,
                    false,
                )?;
                match inner {
                    Some(mut script_sig) => {
                        script_sig.append_push_data(redeem.to_bytes())?;
                        Ok(Some(script_sig))
                    }
                    None => Ok(existing.cloned()),
                }
            }
            ScriptTemplate::NullData | ScriptTemplate::Unknown => {
                Err(BuilderError::UnsupportedScriptTemplate { input_index })
            }
        }
    }

    /// Sign a multisig input, merging any signatures already present.
    ///
    /// Existing signatures are realigned to pubkey slots by verification;
    /// fresh signatures are added until the threshold is reached. The
    /// result carries the standard leading zero.
    #[allow(clippy::too_many_arguments)]
    fn sign_multisig(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_code: &Script,
        required: usize,
        pubkeys: &[Vec<u8>],
        existing: Option<&Script>,
        extra_keys: &[PrivateKey],
    ) -> Result<Option<Script>, BuilderError> {
        let hash = signature_hash(tx, input_index, script_code.to_bytes(), SIGHASH_ALL)?;

        let mut slots: Vec<Option<Vec<u8>>> = vec![None; pubkeys.len()];

        if let Some(existing) = existing {
            for sig_bytes in push_data_items(existing) {
                if sig_bytes.len() < 9 {
                    continue;
                }
                let der = &sig_bytes[..sig_bytes.len() - 1];
                let sig = match Signature::from_der(der) {
                    Ok(sig) => sig,
                    Err(_) => continue,
                };
                for (slot, pubkey) in slots.iter_mut().zip(pubkeys) {
                    if slot.is_some() {
                        continue;
                    }
                    if let Ok(pubkey) = PublicKey::from_bytes(pubkey) {
                        if pubkey.verify(&hash, &sig) {
                            *slot = Some(sig_bytes.clone());
                            break;
                        }
                    }
                }
            }
        }

        let mut filled = slots.iter().filter(|slot| slot.is_some()).count();
        for (slot, pubkey) in slots.iter_mut().zip(pubkeys) {
            if filled >= required {
                break;
            }
            if slot.is_some() {
                continue;
            }
            if let Some(key) = self.key_for_pubkey(pubkey, extra_keys) {
                let sig = key.sign(&hash)?;
                let mut bytes = sig.to_der();
                bytes.push(SIGHASH_ALL as u8);
                *slot = Some(bytes);
                filled += 1;
            }
        }

        if filled == 0 {
            return Ok(existing.cloned());
        }

        let mut out = Script::new();
        out.append_opcodes(&[OP_0])?;
        for slot in slots.into_iter().flatten().take(required) {
            out.append_push_data(&slot)?;
        }
        Ok(Some(out))
    }

    /// Compute a DER signature (with the sighash byte appended) for one
    /// input against a script code.
    fn input_signature(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_code: &Script,
        key: &PrivateKey,
    ) -> Result<Vec<u8>, BuilderError> {
        let hash = signature_hash(tx, input_index, script_code.to_bytes(), SIGHASH_ALL)?;
        let sig = key.sign(&hash)?;
        let mut bytes = sig.to_der();
        bytes.push(SIGHASH_ALL as u8);
        Ok(bytes)
    }

    // -----------------------------------------------------------------
    // Key lookup
    // -----------------------------------------------------------------

    /// Find the private key for a SEC1 public key: the session key set,
    /// then stealth-derived keys, then the key-finder callback.
    fn key_for_pubkey(&self, pubkey_bytes: &[u8], extra_keys: &[PrivateKey]) -> Option<PrivateKey> {
        if let Ok(target) = PublicKey::from_bytes(pubkey_bytes) {
            let target = target.to_compressed();
            for key in self.keys.iter().chain(extra_keys) {
                if key.pub_key().to_compressed() == target {
                    return Some(key.clone());
                }
            }
        }
        if let Some(finder) = &self.key_finder {
            if let Ok(script) = pay_to_pubkey(pubkey_bytes) {
                return finder(&script);
            }
        }
        None
    }

    /// Find the private key for a 20-byte public key hash.
    fn key_for_pubkey_hash(
        &self,
        pubkey_hash: &[u8; 20],
        extra_keys: &[PrivateKey],
    ) -> Option<PrivateKey> {
        for key in self.keys.iter().chain(extra_keys) {
            if key.pub_key().hash160() == *pubkey_hash {
                return Some(key.clone());
            }
        }
        if let Some(finder) = &self.key_finder {
            return finder(&pay_to_pubkey_hash(pubkey_hash));
        }
        None
    }

    /// Uncover the one-time keys of a stealth coin from the session key
    /// set: every (scan, spend) key pair is tried, keeping derivations
    /// whose public key appears in the coin's locking script.
    fn uncover_stealth_keys(&self, coin: &StealthCoin) -> Vec<PrivateKey> {
        let template = ScriptTemplate::classify(&coin.plain.locking_script);
        let mut uncovered = Vec::new();

        for scan_key in &self.keys {
            let secret = match crate::stealth::shared_secret(scan_key, &coin.ephemeral_key) {
                Ok(secret) => secret,
                Err(_) => continue,
            };
            for spend_key in &self.keys {
                let derived = match spend_key.tweak_add(&secret) {
                    Ok(key) => key,
                    Err(_) => continue,
                };
                let derived_pub = derived.pub_key();
                let matches = match &template {
                    ScriptTemplate::PayToPubkeyHash { pubkey_hash } => {
                        derived_pub.hash160() == *pubkey_hash
                    }
                    ScriptTemplate::PayToPubkey { pubkey } => {
                        pubkey.as_slice() == derived_pub.to_compressed()
                    }
                    ScriptTemplate::Multisig { pubkeys, .. } => pubkeys
                        .iter()
                        .any(|pk| pk.as_slice() == derived_pub.to_compressed()),
                    _ => false,
                };
                if matches {
                    uncovered.push(derived);
                }
            }
        }
        uncovered
    }

    // -----------------------------------------------------------------
    // Signature combination
    // -----------------------------------------------------------------

    /// Merge a pair of scriptSigs for one input.
    fn merge_script_sigs(
        &self,
        tx: &Transaction,
        input_index: usize,
        left: Option<Script>,
        right: Option<Script>,
    ) -> Result<Option<Script>, BuilderError> {
        let (left, right) = match (left, right) {
            (None, right) => return Ok(right),
            (left, None) => return Ok(left),
            (Some(left), Some(right)) => (left, right),
        };

        let outpoint = tx.inputs[input_index].previous_outpoint;
        let output_script = self
            .find_coin(&outpoint)
            .map(|coin| coin.locking_script().clone())
            .or_else(|| deduce_output_script(&left))
            .or_else(|| deduce_output_script(&right));

        match output_script {
            Some(script) => self.merge_for_script(tx, input_index, &script, left, right),
            None => Ok(Some(pick_longer(left, right))),
        }
    }

    /// Merge two scriptSigs knowing the output script they satisfy.
    fn merge_for_script(
        &self,
        tx: &Transaction,
        input_index: usize,
        script: &Script,
        left: Script,
        right: Script,
    ) -> Result<Option<Script>, BuilderError> {
        match ScriptTemplate::classify(script) {
            ScriptTemplate::Multisig { required, pubkeys } => {
                let mut union = Script::new();
                for source in [&left, &right] {
                    for data in push_data_items(source) {
                        union.append_push_data(&data)?;
                    }
                }
                let merged = self.sign_multisig(
                    tx,
                    input_index,
                    script,
                    required,
                    &pubkeys,
                    Some(&union),
                    &[],
                )?;
                Ok(merged.or(Some(pick_longer(left, right))))
            }
            ScriptTemplate::PayToScriptHash { script_hash } => {
                let redeem = redeem_from_script_sig(&left)
                    .or_else(|| redeem_from_script_sig(&right))
                    .filter(|redeem| hash160(redeem.to_bytes()) == script_hash);
                let redeem = match redeem {
                    Some(redeem) => redeem,
                    None => return Ok(Some(pick_longer(left, right))),
                };

                let inner_left = strip_redeem_push(&left, &redeem).unwrap_or_default();
                let inner_right = strip_redeem_push(&right, &redeem).unwrap_or_default();
                match self.merge_for_script(tx, input_index, &redeem, inner_left, inner_right)? {
                    Some(mut merged) => {
                        merged.append_push_data(redeem.to_bytes())?;
                        Ok(Some(merged))
                    }
                    None => Ok(Some(pick_longer(left, right))),
                }
            }
            _ => Ok(Some(pick_longer(left, right))),
        }
    }
}

/// Collect the non-empty push payloads of a script.
fn push_data_items(script: &Script) -> Vec<Vec<u8>> {
    match script.chunks() {
        Ok(chunks) => chunks
            .iter()
            .filter_map(ScriptChunk::push_bytes)
            .filter(|data| !data.is_empty())
            .map(<[u8]>::to_vec)
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Deduce the spent output's script from a scriptSig: P2PKH from the
/// embedded pubkey's hash, P2SH from the embedded redeem script's hash.
fn deduce_output_script(script_sig: &Script) -> Option<Script> {
    let chunks = script_sig.chunks().ok()?;

    // P2PKH shape: <sig> <pubkey>
    if chunks.len() == 2 {
        if let (Some(_sig), Some(pubkey)) = (chunks[0].push_bytes(), chunks[1].push_bytes()) {
            if is_pubkey_like(pubkey) {
                return Some(pay_to_pubkey_hash(&hash160(pubkey)));
            }
        }
    }

    // P2SH shape: the final push is a script of a known template.
    let last = chunks.last()?.push_bytes()?;
    if !last.is_empty() {
        let candidate = Script::from_bytes(last);
        match ScriptTemplate::classify(&candidate) {
            ScriptTemplate::Unknown | ScriptTemplate::NullData => {}
            _ => {
                return Some(tint_script::template::pay_to_script_hash(&hash160(last)));
            }
        }
    }
    None
}

/// Extract the redeem script from a P2SH scriptSig's final push.
fn redeem_from_script_sig(script_sig: &Script) -> Option<Script> {
    let chunks = script_sig.chunks().ok()?;
    let last = chunks.last()?.push_bytes()?;
    if last.is_empty() {
        return None;
    }
    Some(Script::from_bytes(last))
}

/// Rebuild a P2SH scriptSig without its final redeem push.
fn strip_redeem_push(script_sig: &Script, redeem: &Script) -> Option<Script> {
    let chunks = script_sig.chunks().ok()?;
    let last = chunks.last()?.push_bytes()?;
    if last != redeem.to_bytes() {
        return None;
    }

    let mut inner = Script::new();
    for chunk in &chunks[..chunks.len() - 1] {
        match chunk.push_bytes() {
            Some(data) => inner.append_push_data(data).ok()?,
            None => inner.append_opcodes(&[chunk.op]).ok()?,
        }
    }
    Some(inner)
}

/// Prefer the more complete of two scriptSigs; ties keep the left side.
fn pick_longer(left: Script, right: Script) -> Script {
    if right.len() > left.len() {
        right
    } else {
        left
    }
}

/// Loose SEC1 public key shape check for scriptSig deduction.
fn is_pubkey_like(bytes: &[u8]) -> bool {
    match bytes.first() {
        Some(0x02) | Some(0x03) => bytes.len() == 33,
        Some(0x04) | Some(0x06) | Some(0x07) => bytes.len() == 65,
        _ => false,
    }
}
