//! Mutable per-build state.
//!
//! A `BuildContext` exists only for the duration of a single `build` call:
//! it owns the growing transaction, the set of consumed outpoints, the
//! per-group fee accumulator, and the color marker under construction.
//! `ContextMemento` snapshots the pieces the change fixed point needs to
//! roll back between passes.

use std::collections::HashSet;

use tint_assets::{ColorMarker, Money};
use tint_script::Script;
use tint_transaction::{OutPoint, Transaction, TransactionInput, TransactionOutput};

use crate::BuilderError;

/// Which change script a funding pass draws on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeType {
    /// Native-currency change.
    Uncolored = 0,
    /// Colored-asset change.
    Colored = 1,
}

/// Mutable state for one build.
pub(crate) struct BuildContext {
    /// The transaction being grown.
    pub transaction: Transaction,
    /// Outpoints of coins already spent by this build.
    pub consumed: HashSet<OutPoint>,
    /// Native cost accumulated by colored outputs, recovered in the native
    /// pass. Reset per group.
    pub additional_fees: i64,
    /// The color marker, created on first colored intent.
    pub marker: Option<ColorMarker>,
    /// The issuance coin's outpoint once its input has been inserted.
    pub issuance_outpoint: Option<OutPoint>,
    /// The change amount of the current fixed-point pass.
    pub change_amount: Money,
    /// Cover-only cap for the current pass, native only.
    pub cover_only: Option<i64>,
    /// Dust bound of the current pass.
    pub dust: Money,
    /// Change kind of the current pass.
    pub change_type: ChangeType,
    /// Whether a lock time is in force for this build.
    pub lock_time_set: bool,
    /// Set once the first ensured input has been given a non-final sequence.
    pub non_final_sequence_set: bool,
}

/// Snapshot for rolling back a fixed-point pass: marker, transaction, and
/// fee accumulator, all deep copies.
pub(crate) struct ContextMemento {
    transaction: Transaction,
    marker: Option<ColorMarker>,
    additional_fees: i64,
}

impl BuildContext {
    /// Create a context growing from a base transaction (empty for a fresh
    /// build, or a partial transaction being continued).
    pub fn new(base: Transaction, lock_time_set: bool) -> Self {
        BuildContext {
            transaction: base,
            consumed: HashSet::new(),
            additional_fees: 0,
            marker: None,
            issuance_outpoint: None,
            change_amount: Money::Native(0),
            cover_only: None,
            dust: Money::Native(0),
            change_type: ChangeType::Uncolored,
            lock_time_set,
            non_final_sequence_set: false,
        }
    }

    /// Capture a memento of the rollback-relevant state.
    pub fn memento(&self) -> ContextMemento {
        ContextMemento {
            transaction: self.transaction.clone(),
            marker: self.marker.clone(),
            additional_fees: self.additional_fees,
        }
    }

    /// Restore a previously captured memento.
    pub fn restore(&mut self, memento: ContextMemento) {
        self.transaction = memento.transaction;
        self.marker = memento.marker;
        self.additional_fees = memento.additional_fees;
    }

    /// Access the marker, creating an empty one on first use.
    pub fn marker_mut(&mut self) -> &mut ColorMarker {
        self.marker.get_or_insert_with(ColorMarker::new)
    }

    /// Locate the marker output by script-pattern match.
    ///
    /// The position is never remembered because intents may reorder
    /// outputs between calls.
    pub fn find_marker_output(&self) -> Option<usize> {
        self.transaction
            .outputs
            .iter()
            .position(|o| ColorMarker::from_script(&o.locking_script).is_some())
    }

    /// Make sure the transaction carries a marker output, appending a
    /// placeholder when missing. Idempotent.
    ///
    /// # Returns
    /// The marker output's current index.
    pub fn ensure_marker_output(&mut self) -> Result<usize, BuilderError> {
        self.marker_mut();
        if let Some(index) = self.find_marker_output() {
            return Ok(index);
        }
        let script = self
            .marker
            .as_ref()
            .map(|m| m.to_script())
            .transpose()?
            .unwrap_or_default();
        self.transaction
            .add_output(TransactionOutput::new(0, script));
        Ok(self.transaction.outputs.len() - 1)
    }

    /// Insert a colored output just before the marker output, keeping the
    /// marker after every colored output it describes.
    ///
    /// # Arguments
    /// * `script` - The colored output's locking script.
    /// * `satoshis` - The dust value the colored output carries.
    ///
    /// # Returns
    /// The new output's index, which is also its marker quantity index.
    pub fn add_colored_output(
        &mut self,
        script: &Script,
        satoshis: i64,
    ) -> Result<usize, BuilderError> {
        let marker_index = self.ensure_marker_output()?;
        self.transaction
            .outputs
            .insert(marker_index, TransactionOutput::new(satoshis as u64, script.clone()));
        Ok(marker_index)
    }

    /// Record a coin as consumed.
    pub fn consume(&mut self, outpoint: OutPoint) {
        self.consumed.insert(outpoint);
    }

    /// Make sure an input spending the outpoint exists, and apply the
    /// lock-time sequence rule: the first ensured input of a lock-timed
    /// build gets sequence zero so the lock time is effective.
    pub fn ensure_input(&mut self, outpoint: OutPoint) {
        let index = match self.transaction.find_input(&outpoint) {
            Some(index) => index,
            None => {
                self.transaction.add_input(TransactionInput::new(outpoint));
                self.transaction.inputs.len() - 1
            }
        };
        if self.lock_time_set && !self.non_final_sequence_set {
            self.transaction.inputs[index].sequence = 0;
            self.non_final_sequence_set = true;
        }
    }
}
