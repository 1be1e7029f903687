//! Transaction policies and verification.
//!
//! Policies are pluggable checkers producing violation values; `verify`
//! runs the miner policy, the standard policy, and the optional fee
//! expectation, and returns the collected violations. An empty list means
//! the transaction is acceptable.

use tint_transaction::{OutPoint, Transaction};

use crate::builder::TransactionBuilder;
use crate::coin::Coin;
use crate::fee::{dust_threshold, native_dust, FeeRate};
use crate::BuilderError;

/// Largest admissible satoshi value (21 million coins).
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

/// Consensus-level size bound applied by the default miner policy.
pub const MAX_BLOCK_TX_SIZE: usize = 1_000_000;

/// Relay-level size bound applied by the default standard policy.
pub const MAX_STANDARD_TX_SIZE: usize = 100_000;

/// A single policy violation. Violations are collected, never raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    /// The transaction has no inputs.
    #[error("transaction has no inputs")]
    NoInputs,

    /// The transaction has no outputs.
    #[error("transaction has no outputs")]
    NoOutputs,

    /// Two inputs spend the same outpoint.
    #[error("duplicate input spending {0}")]
    DuplicateInput(OutPoint),

    /// The transaction exceeds a size bound.
    #[error("transaction size {size} exceeds {max} bytes")]
    OversizeTransaction {
        /// Serialized size in bytes.
        size: usize,
        /// The applicable bound.
        max: usize,
    },

    /// An output value (or the output total) exceeds the money range.
    #[error("output {index} value out of range")]
    ValueOutOfRange {
        /// Index of the offending output.
        index: usize,
    },

    /// Inputs are worth less than outputs.
    #[error("negative fee: {fee}")]
    NegativeFee {
        /// The (negative) fee.
        fee: i64,
    },

    /// The fee differs from the expectation beyond the margin.
    #[error("fee {actual} differs from expected {expected} by more than {margin}")]
    FeeMismatch {
        /// The expected fee.
        expected: i64,
        /// The actual fee.
        actual: i64,
        /// The tolerated margin.
        margin: i64,
    },

    /// A non-data output is below its script's dust threshold.
    #[error("output {index} is dust: {satoshis} below {threshold}")]
    DustOutput {
        /// Index of the offending output.
        index: usize,
        /// The output's value.
        satoshis: u64,
        /// The dust threshold of its script.
        threshold: i64,
    },

    /// More than one null-data output.
    #[error("more than one null-data output")]
    MultipleNullData,

    /// An unlocking script contains non-push operations.
    #[error("input {index} unlocking script is not push-only")]
    NonPushScriptSig {
        /// Index of the offending input.
        index: usize,
    },

    /// A spent coin could not be resolved.
    #[error("input {index} spends unknown coin {outpoint}")]
    CoinUnavailable {
        /// Index of the input.
        index: usize,
        /// The unresolvable outpoint.
        outpoint: OutPoint,
    },
}

/// A pluggable transaction policy.
///
/// `spent_coins` is parallel to the inputs; entries are `None` when the
/// coin could not be resolved.
pub trait TransactionPolicy {
    /// Check a transaction, returning every violation found.
    ///
    /// # Arguments
    /// * `transaction` - The transaction to check.
    /// * `spent_coins` - The resolved spent coins, parallel to the inputs.
    ///
    /// # Returns
    /// The violations; empty when the policy passes.
    fn check(&self, transaction: &Transaction, spent_coins: &[Option<Coin>])
        -> Vec<PolicyViolation>;
}

/// Consensus-shaped checks a miner would enforce.
pub struct MinerPolicy {
    /// Maximum serialized size.
    pub max_size: usize,
}

impl Default for MinerPolicy {
    fn default() -> Self {
        MinerPolicy {
            max_size: MAX_BLOCK_TX_SIZE,
        }
    }
}

impl TransactionPolicy for MinerPolicy {
    fn check(
        &self,
        transaction: &Transaction,
        spent_coins: &[Option<Coin>],
    ) -> Vec<PolicyViolation> {
        let mut violations = Vec::new();

        if transaction.inputs.is_empty() {
            violations.push(PolicyViolation::NoInputs);
        }
        if transaction.outputs.is_empty() {
            violations.push(PolicyViolation::NoOutputs);
        }

        for (index, input) in transaction.inputs.iter().enumerate() {
            if transaction.inputs[..index]
                .iter()
                .any(|other| other.previous_outpoint == input.previous_outpoint)
            {
                violations.push(PolicyViolation::DuplicateInput(input.previous_outpoint));
            }
        }

        let size = transaction.size();
        if size > self.max_size {
            violations.push(PolicyViolation::OversizeTransaction {
                size,
                max: self.max_size,
            });
        }

        let mut total: u64 = 0;
        for (index, output) in transaction.outputs.iter().enumerate() {
            if output.satoshis > MAX_MONEY {
                violations.push(PolicyViolation::ValueOutOfRange { index });
                continue;
            }
            total = total.saturating_add(output.satoshis);
            if total > MAX_MONEY {
                violations.push(PolicyViolation::ValueOutOfRange { index });
            }
        }

        if spent_coins.iter().all(Option::is_some) && !spent_coins.is_empty() {
            let spent: i64 = spent_coins
                .iter()
                .flatten()
                .map(Coin::satoshis)
                .sum();
            let fee = spent - transaction.total_output_satoshis() as i64;
            if fee < 0 {
                violations.push(PolicyViolation::NegativeFee { fee });
            }
        }

        violations
    }
}

/// Relay-standardness checks.
pub struct StandardPolicy {
    /// Maximum serialized size.
    pub max_size: usize,
    /// Relay rate defining dust thresholds.
    pub min_relay_fee: FeeRate,
}

impl Default for StandardPolicy {
    fn default() -> Self {
        StandardPolicy {
            max_size: MAX_STANDARD_TX_SIZE,
            min_relay_fee: FeeRate::default(),
        }
    }
}

impl TransactionPolicy for StandardPolicy {
    fn check(
        &self,
        transaction: &Transaction,
        _spent_coins: &[Option<Coin>],
    ) -> Vec<PolicyViolation> {
        let mut violations = Vec::new();

        let size = transaction.size();
        if size > self.max_size {
            violations.push(PolicyViolation::OversizeTransaction {
                size,
                max: self.max_size,
            });
        }

        let mut null_data_outputs = 0usize;
        for (index, output) in transaction.outputs.iter().enumerate() {
            if output.locking_script.is_null_data() {
                null_data_outputs += 1;
                continue;
            }
            let threshold = dust_threshold(&output.locking_script, &self.min_relay_fee);
            if (output.satoshis as i64) < threshold {
                violations.push(PolicyViolation::DustOutput {
                    index,
                    satoshis: output.satoshis,
                    threshold,
                });
            }
        }
        if null_data_outputs > 1 {
            violations.push(PolicyViolation::MultipleNullData);
        }

        for (index, input) in transaction.inputs.iter().enumerate() {
            if let Some(script) = &input.unlocking_script {
                if !script.is_push_only() {
                    violations.push(PolicyViolation::NonPushScriptSig { index });
                }
            }
        }

        violations
    }
}

impl TransactionBuilder {
    /// Verify a transaction against the miner and standard policies.
    ///
    /// # Arguments
    /// * `transaction` - The transaction to verify.
    ///
    /// # Returns
    /// The collected violations; empty means valid.
    pub fn verify(&self, transaction: &Transaction) -> Result<Vec<PolicyViolation>, BuilderError> {
        self.verify_internal(transaction, None)
    }

    /// Verify with an exact fee expectation.
    ///
    /// The fee (inputs minus outputs) must match `expected` within the
    /// margin: twice the native dust under dust prevention, zero otherwise.
    pub fn verify_with_fees(
        &self,
        transaction: &Transaction,
        expected: i64,
    ) -> Result<Vec<PolicyViolation>, BuilderError> {
        self.verify_internal(transaction, Some(expected))
    }

    /// Verify with a rate-derived fee expectation.
    pub fn verify_with_rate(
        &self,
        transaction: &Transaction,
        rate: &FeeRate,
    ) -> Result<Vec<PolicyViolation>, BuilderError> {
        let expected = self.estimate_fees(transaction, rate)?;
        self.verify_internal(transaction, Some(expected))
    }

    fn verify_internal(
        &self,
        transaction: &Transaction,
        expected_fee: Option<i64>,
    ) -> Result<Vec<PolicyViolation>, BuilderError> {
        let spent_coins: Vec<Option<Coin>> = transaction
            .inputs
            .iter()
            .map(|input| self.find_coin(&input.previous_outpoint))
            .collect();

        let mut violations = Vec::new();
        for (index, (input, coin)) in transaction.inputs.iter().zip(&spent_coins).enumerate() {
            if coin.is_none() {
                violations.push(PolicyViolation::CoinUnavailable {
                    index,
                    outpoint: input.previous_outpoint,
                });
            }
        }

        violations.extend(self.miner_policy.check(transaction, &spent_coins));
        violations.extend(self.standard_policy.check(transaction, &spent_coins));

        if let Some(expected) = expected_fee {
            if spent_coins.iter().all(Option::is_some) {
                let spent: i64 = spent_coins.iter().flatten().map(Coin::satoshis).sum();
                let fee = spent - transaction.total_output_satoshis() as i64;
                let margin = if self.dust_prevention {
                    2 * native_dust(&self.min_relay_fee)
                } else {
                    0
                };
                if (fee - expected).abs() > margin {
                    violations.push(PolicyViolation::FeeMismatch {
                        expected,
                        actual: fee,
                        margin,
                    });
                }
            }
        }

        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_script::template::{null_data, pay_to_pubkey_hash};
    use tint_script::Script;
    use tint_transaction::{TransactionInput, TransactionOutput};

    fn tx_with(outputs: Vec<TransactionOutput>) -> Transaction {
        let mut tx = Transaction::new();
        tx.add_input(TransactionInput::new(OutPoint::new([1u8; 32], 0)));
        for output in outputs {
            tx.add_output(output);
        }
        tx
    }

    /// Verify the miner policy flags empty transactions and duplicates.
    #[test]
    fn test_miner_policy_structure() {
        let policy = MinerPolicy::default();
        let empty = Transaction::new();
        let violations = policy.check(&empty, &[]);
        assert!(violations.contains(&PolicyViolation::NoInputs));
        assert!(violations.contains(&PolicyViolation::NoOutputs));

        let mut tx = tx_with(vec![TransactionOutput::new(
            1000,
            pay_to_pubkey_hash(&[1u8; 20]),
        )]);
        tx.add_input(TransactionInput::new(OutPoint::new([1u8; 32], 0)));
        let violations = policy.check(&tx, &[None, None]);
        assert!(violations
            .iter()
            .any(|v| matches!(v, PolicyViolation::DuplicateInput(_))));
    }

    /// Verify the miner policy flags out-of-range output values.
    #[test]
    fn test_miner_policy_value_range() {
        let policy = MinerPolicy::default();
        let tx = tx_with(vec![TransactionOutput::new(MAX_MONEY + 1, Script::new())]);
        let violations = policy.check(&tx, &[None]);
        assert!(violations
            .iter()
            .any(|v| matches!(v, PolicyViolation::ValueOutOfRange { index: 0 })));
    }

    /// Verify the standard policy flags dust and multiple data carriers.
    #[test]
    fn test_standard_policy_dust_and_null_data() {
        let policy = StandardPolicy::default();
        let tx = tx_with(vec![
            TransactionOutput::new(100, pay_to_pubkey_hash(&[1u8; 20])),
            TransactionOutput::new(0, null_data(b"a").unwrap()),
            TransactionOutput::new(0, null_data(b"b").unwrap()),
        ]);
        let violations = policy.check(&tx, &[None]);
        assert!(violations
            .iter()
            .any(|v| matches!(v, PolicyViolation::DustOutput { index: 0, .. })));
        assert!(violations.contains(&PolicyViolation::MultipleNullData));
    }

    /// Verify the standard policy flags non-push unlocking scripts.
    #[test]
    fn test_standard_policy_push_only() {
        let policy = StandardPolicy::default();
        let mut tx = tx_with(vec![TransactionOutput::new(
            1000,
            pay_to_pubkey_hash(&[1u8; 20]),
        )]);
        tx.inputs[0].unlocking_script = Some(Script::from_bytes(&[0x76]));
        let violations = policy.check(&tx, &[None]);
        assert!(violations
            .iter()
            .any(|v| matches!(v, PolicyViolation::NonPushScriptSig { index: 0 })));
    }
}
