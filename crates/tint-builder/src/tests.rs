//! End-to-end builder scenarios: funding, change, colored transfers,
//! issuance, exchange operations, stealth payments, signing, combination,
//! and verification.

use std::cell::RefCell;
use std::rc::Rc;

use tint_assets::marker::{OP_EXCHANGE_OPERATION, OP_TRANSFER_TO_EXCHANGE};
use tint_assets::{AssetAmount, AssetId, ColorMarker, Money};
use tint_primitives::ec::PrivateKey;
use tint_primitives::hash::sha1;
use tint_script::template::{multisig, pay_to_pubkey_hash};
use tint_script::Script;
use tint_transaction::{OutPoint, Transaction};

use crate::coin::{BearerCoin, Coin, ColoredCoin, IssuanceCoin, PlainCoin, StealthCoin};
use crate::context::ChangeType;
use crate::stealth::StealthAddress;
use crate::{BuilderError, MetadataRepository, PolicyViolation, TransactionBuilder};

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

fn key(n: u8) -> PrivateKey {
    PrivateKey::from_bytes(&[n; 32]).expect("valid scalar")
}

fn script_for(key: &PrivateKey) -> Script {
    pay_to_pubkey_hash(&key.pub_key().hash160())
}

fn outpoint(n: u8) -> OutPoint {
    OutPoint::new([n; 32], 0)
}

fn plain(n: u8, satoshis: i64, script: &Script) -> Coin {
    Coin::Plain(PlainCoin::new(outpoint(n), satoshis, script.clone()))
}

fn colored(n: u8, id: AssetId, quantity: u64, bearer_satoshis: i64, script: &Script) -> Coin {
    Coin::Colored(ColoredCoin {
        bearer: BearerCoin::Plain(PlainCoin::new(outpoint(n), bearer_satoshis, script.clone())),
        asset: AssetAmount::new(id, quantity),
    })
}

/// A metadata repository recording every write for inspection.
#[derive(Clone, Default)]
struct RecordingRepository {
    entries: Rc<RefCell<Vec<String>>>,
}

impl MetadataRepository for RecordingRepository {
    fn add(&mut self, data: &str) {
        self.entries.borrow_mut().push(data.to_string());
    }
}

/// Sum the native value of a transaction's inputs through the builder's
/// coin lookups.
fn total_input_value(builder: &TransactionBuilder, tx: &Transaction) -> i64 {
    tx.inputs
        .iter()
        .map(|input| {
            builder
                .find_coin(&input.previous_outpoint)
                .expect("coin known")
                .satoshis()
        })
        .sum()
}

// -----------------------------------------------------------------------
// Native funding and change
// -----------------------------------------------------------------------

/// A send plus fees covered exactly leaves no change output.
#[test]
fn test_exact_funding_no_change() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder.add_coin(plain(1, 5_000, &funding));
    builder.send(&dest, 4_000).unwrap().send_fees(1_000);

    let tx = builder.build(false).unwrap();
    assert_eq!(tx.inputs.len(), 1);
    assert_eq!(tx.outputs.len(), 1);
    assert_eq!(tx.outputs[0].satoshis, 4_000);
    assert_eq!(tx.outputs[0].locking_script, dest);
}

/// Overshooting selection produces a change output; fees are conserved.
#[test]
fn test_change_output_and_fee_conservation() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let change = script_for(&key(3));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coin(plain(1, 10_000, &funding))
        .set_change(&change, ChangeType::Uncolored);
    builder.send(&dest, 6_000).unwrap().send_fees(1_000);

    let tx = builder.build(false).unwrap();
    assert_eq!(tx.outputs.len(), 2);
    assert_eq!(tx.outputs[0].satoshis, 6_000);
    assert_eq!(tx.outputs[1].satoshis, 3_000);
    assert_eq!(tx.outputs[1].locking_script, change);

    let fee = total_input_value(&builder, &tx) - tx.total_output_satoshis() as i64;
    assert_eq!(fee, 1_000);
}

/// Change at or below dust is absorbed into the fee, never emitted.
#[test]
fn test_dust_change_absorbed() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let funding = script_for(&owner);

    // No change script configured: the 200-satoshi change must be absorbed.
    let mut builder = TransactionBuilder::with_seed(1);
    builder.add_coin(plain(1, 5_000, &funding));
    builder.send(&dest, 4_800).unwrap();

    let tx = builder.build(false).unwrap();
    assert_eq!(tx.outputs.len(), 1);
    let fee = total_input_value(&builder, &tx) - tx.total_output_satoshis() as i64;
    assert_eq!(fee, 200);
}

/// Under dust prevention a sub-dust send is rerouted to the fee pool.
#[test]
fn test_dust_send_rerouted_to_fees() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let change = script_for(&key(3));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coin(plain(1, 2_000, &funding))
        .set_change(&change, ChangeType::Uncolored);
    builder.send(&dest, 100).unwrap();

    let tx = builder.build(false).unwrap();
    // The destination output is absent; the amount became fee alongside
    // the change output.
    assert!(tx.outputs.iter().all(|o| o.locking_script != dest));
    assert_eq!(tx.outputs.len(), 1);
    assert_eq!(tx.outputs[0].satoshis, 1_900);
    let fee = total_input_value(&builder, &tx) - tx.total_output_satoshis() as i64;
    assert_eq!(fee, 100);
}

/// Missing change script when change is material is a configuration error.
#[test]
fn test_missing_change_script() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder.add_coin(plain(1, 10_000, &funding));
    builder.send(&dest, 6_000).unwrap();

    match builder.build(false) {
        Err(BuilderError::MissingChangeScript(ChangeType::Uncolored)) => {}
        other => panic!("expected missing change script, got {:?}", other),
    }
}

/// An uncoverable target reports the group and missing amount.
#[test]
fn test_insufficient_funds() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder.add_coin(plain(1, 1_000, &funding));
    builder.set_group_name("wallet");
    builder.send(&dest, 10_000).unwrap();

    match builder.build(false) {
        Err(BuilderError::NotEnoughFunds { group, missing }) => {
            assert_eq!(group, "wallet");
            assert_eq!(missing, Money::Native(9_000));
        }
        other => panic!("expected not-enough-funds, got {:?}", other),
    }
}

/// Two builds with the same seed and declarations are byte-identical.
#[test]
fn test_deterministic_builds() {
    let build = || {
        let owner = key(1);
        let dest = script_for(&key(2));
        let change = script_for(&key(3));
        let funding = script_for(&owner);

        let mut builder = TransactionBuilder::with_seed(99);
        builder
            .add_coins([
                plain(1, 4_000, &funding),
                plain(2, 4_000, &funding),
                plain(3, 4_000, &funding),
                plain(4, 4_000, &funding),
            ])
            .set_change(&change, ChangeType::Uncolored);
        builder.send(&dest, 7_000).unwrap().send_fees(500);
        builder.build(false).unwrap().to_bytes()
    };

    assert_eq!(build(), build());
}

/// The lock time is applied and exactly one input gets a zero sequence.
#[test]
fn test_lock_time_non_final_sequence() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let change = script_for(&key(3));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coins([plain(1, 4_000, &funding), plain(2, 4_000, &funding)])
        .set_change(&change, ChangeType::Uncolored)
        .set_lock_time(650_000);
    builder.send(&dest, 6_000).unwrap();

    let tx = builder.build(false).unwrap();
    assert_eq!(tx.lock_time, 650_000);
    assert_eq!(tx.inputs.len(), 2);
    let zero_sequences = tx.inputs.iter().filter(|i| i.sequence == 0).count();
    assert_eq!(zero_sequences, 1);
}

/// send_fees_split spreads fees across groups, remainder to the first.
#[test]
fn test_send_fees_split() {
    let owner = key(1);
    let change = script_for(&key(3));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coin(plain(1, 10_000, &funding))
        .set_change(&change, ChangeType::Uncolored);
    builder.then();
    builder
        .add_coin(plain(2, 10_000, &funding))
        .set_change(&change, ChangeType::Uncolored);
    builder.send_fees_split(2_001);

    let tx = builder.build(false).unwrap();
    assert_eq!(tx.inputs.len(), 2);
    assert_eq!(tx.outputs.len(), 2);
    let fee = total_input_value(&builder, &tx) - tx.total_output_satoshis() as i64;
    assert_eq!(fee, 2_001);
}

// -----------------------------------------------------------------------
// Colored transfers
// -----------------------------------------------------------------------

/// The canonical colored transfer: send 40 of 100, get 60 change, marker
/// last with quantities [40, 60].
#[test]
fn test_colored_transfer_layout() {
    let owner = key(1);
    let asset_id = AssetId::from_bytes([0xAA; 20]);
    let dest = script_for(&key(2));
    let colored_change = script_for(&key(3));
    let native_change = script_for(&key(4));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coins([
            colored(1, asset_id, 100, 600, &funding),
            plain(2, 2_000, &funding),
        ])
        .set_change(&colored_change, ChangeType::Colored)
        .set_change(&native_change, ChangeType::Uncolored);
    builder.send_asset(&dest, AssetAmount::new(asset_id, 40)).unwrap();

    let tx = builder.build(false).unwrap();

    assert_eq!(tx.outputs.len(), 4);
    assert_eq!(tx.outputs[0].locking_script, dest);
    assert_eq!(tx.outputs[0].satoshis, 600);
    assert_eq!(tx.outputs[1].locking_script, colored_change);
    assert_eq!(tx.outputs[1].satoshis, 600);
    assert_eq!(tx.outputs[3].locking_script, native_change);

    let (marker_index, marker) = ColorMarker::from_transaction(&tx).expect("marker present");
    assert_eq!(marker_index, 2);
    assert_eq!(tx.outputs[2].satoshis, 0);
    assert_eq!(marker.quantities(), &[40, 60]);
    assert_eq!(marker.version(), 1);

    // Fee conservation across bearer dust and native funding.
    let fee = total_input_value(&builder, &tx) - tx.total_output_satoshis() as i64;
    assert_eq!(fee, 0);
}

/// Colored selection accumulates several coins when one is not enough.
#[test]
fn test_colored_multi_coin_selection() {
    let owner = key(1);
    let asset_id = AssetId::from_bytes([0xBB; 20]);
    let dest = script_for(&key(2));
    let colored_change = script_for(&key(3));
    let native_change = script_for(&key(4));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coins([
            colored(1, asset_id, 30, 600, &funding),
            colored(2, asset_id, 30, 600, &funding),
            plain(3, 5_000, &funding),
        ])
        .set_change(&colored_change, ChangeType::Colored)
        .set_change(&native_change, ChangeType::Uncolored);
    builder.send_asset(&dest, AssetAmount::new(asset_id, 60)).unwrap();

    let tx = builder.build(false).unwrap();
    let (_, marker) = ColorMarker::from_transaction(&tx).expect("marker present");
    assert_eq!(marker.quantities(), &[60]);
    // Both colored coins are spent; their surplus bearer dust comes back
    // as native change, so the plain coin is never needed.
    assert_eq!(tx.inputs.len(), 2);
    assert_eq!(tx.outputs.last().unwrap().locking_script, native_change);
    assert_eq!(tx.outputs.last().unwrap().satoshis, 600);

    let fee = total_input_value(&builder, &tx) - tx.total_output_satoshis() as i64;
    assert_eq!(fee, 0);
}

/// Missing asset quantity reports the asset shortfall.
#[test]
fn test_insufficient_asset_funds() {
    let owner = key(1);
    let asset_id = AssetId::from_bytes([0xCC; 20]);
    let dest = script_for(&key(2));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder.add_coins([
        colored(1, asset_id, 10, 600, &funding),
        plain(2, 5_000, &funding),
    ]);
    builder.send_asset(&dest, AssetAmount::new(asset_id, 25)).unwrap();

    match builder.build(false) {
        Err(BuilderError::NotEnoughFunds { missing, .. }) => {
            assert_eq!(missing, Money::Asset(AssetAmount::new(asset_id, 15)));
        }
        other => panic!("expected not-enough-funds, got {:?}", other),
    }
}

// -----------------------------------------------------------------------
// Exchange semantics
// -----------------------------------------------------------------------

/// Send-to-exchange forces version 2 / op-code 0x01 and flags the output.
#[test]
fn test_send_asset_to_exchange() {
    let owner = key(1);
    let asset_id = AssetId::from_bytes([0xDD; 20]);
    let dest = script_for(&key(2));
    let colored_change = script_for(&key(3));
    let native_change = script_for(&key(4));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coins([
            colored(1, asset_id, 100, 600, &funding),
            plain(2, 3_000, &funding),
        ])
        .set_change(&colored_change, ChangeType::Colored)
        .set_change(&native_change, ChangeType::Uncolored);
    builder
        .send_asset_to_exchange(&dest, AssetAmount::new(asset_id, 40))
        .unwrap();

    let tx = builder.build(false).unwrap();
    let (_, marker) = ColorMarker::from_transaction(&tx).expect("marker present");
    assert_eq!(marker.version(), 2);
    assert_eq!(marker.op_code(), Some(OP_TRANSFER_TO_EXCHANGE));
    assert_eq!(marker.quantities(), &[40, 60]);
    // Only the exchange send is flagged, not the change.
    assert_eq!(marker.exchange_flags(), &[true, false]);
}

/// The exchange operation: version 2 / op-code 0x02, SHA-1 metadata, both
/// outputs flagged, and the reason written to the repository.
#[test]
fn test_exchange_operation() {
    let owner = key(1);
    let asset_a = AssetId::from_bytes([0xA1; 20]);
    let asset_b = AssetId::from_bytes([0xB1; 20]);
    let dest_a = script_for(&key(2));
    let dest_b = script_for(&key(3));
    let colored_change = script_for(&key(4));
    let native_change = script_for(&key(5));
    let funding = script_for(&owner);

    let repository = RecordingRepository::default();
    let entries = repository.entries.clone();

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coins([
            colored(1, asset_a, 50, 600, &funding),
            colored(2, asset_b, 100, 600, &funding),
            plain(3, 5_000, &funding),
        ])
        .set_change(&colored_change, ChangeType::Colored)
        .set_change(&native_change, ChangeType::Uncolored)
        .set_metadata_repository(repository);
    builder
        .exchange_operation(
            &dest_a,
            AssetAmount::new(asset_a, 50),
            &dest_b,
            AssetAmount::new(asset_b, 75),
            "r",
        )
        .unwrap();

    let tx = builder.build(false).unwrap();
    let (_, marker) = ColorMarker::from_transaction(&tx).expect("marker present");
    assert_eq!(marker.version(), 2);
    assert_eq!(marker.op_code(), Some(OP_EXCHANGE_OPERATION));
    assert_eq!(marker.metadata(), &sha1(b"r"));
    // Legs at quantity indexes 0 and 1, asset B change at 2.
    assert_eq!(marker.quantities(), &[50, 75, 25]);
    assert_eq!(marker.exchange_flags(), &[true, true, false]);
    assert_eq!(tx.outputs[0].locking_script, dest_a);
    assert_eq!(tx.outputs[1].locking_script, dest_b);

    assert!(entries.borrow().iter().any(|entry| entry == "r"));
}

/// An exchange operation after asset intents is rejected at queue time.
#[test]
fn test_exchange_operation_ordering() {
    let asset_a = AssetId::from_bytes([0xA2; 20]);
    let asset_b = AssetId::from_bytes([0xB2; 20]);
    let dest = script_for(&key(2));

    let mut builder = TransactionBuilder::with_seed(1);
    builder.send_asset(&dest, AssetAmount::new(asset_a, 5)).unwrap();
    let result = builder.exchange_operation(
        &dest,
        AssetAmount::new(asset_a, 1),
        &dest,
        AssetAmount::new(asset_b, 1),
        "why",
    );
    assert!(matches!(result, Err(BuilderError::ExchangeAfterAssetIntents)));
}

/// A send-to-exchange cannot follow an exchange operation on the marker.
#[test]
fn test_marker_op_code_conflict() {
    let owner = key(1);
    let asset_a = AssetId::from_bytes([0xA3; 20]);
    let asset_b = AssetId::from_bytes([0xB3; 20]);
    let dest = script_for(&key(2));
    let colored_change = script_for(&key(3));
    let native_change = script_for(&key(4));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coins([
            colored(1, asset_a, 50, 600, &funding),
            colored(2, asset_b, 100, 600, &funding),
            plain(3, 5_000, &funding),
        ])
        .set_change(&colored_change, ChangeType::Colored)
        .set_change(&native_change, ChangeType::Uncolored);
    builder
        .exchange_operation(
            &dest,
            AssetAmount::new(asset_a, 50),
            &dest,
            AssetAmount::new(asset_b, 75),
            "swap",
        )
        .unwrap();
    builder
        .send_asset_to_exchange(&dest, AssetAmount::new(asset_a, 1))
        .unwrap();

    match builder.build(false) {
        Err(BuilderError::MarkerOpCodeConflict { current }) => {
            assert_eq!(current, OP_EXCHANGE_OPERATION);
        }
        other => panic!("expected op-code conflict, got {:?}", other),
    }
}

// -----------------------------------------------------------------------
// Issuance
// -----------------------------------------------------------------------

/// Issuance inserts the authorizing input and the issued output at index
/// zero and records the definition URL.
#[test]
fn test_issue_asset() {
    let issuer = key(1);
    let issuer_script = script_for(&issuer);
    let dest = script_for(&key(2));
    let asset_id = AssetId::from_script(&issuer_script);

    let issuance_coin = Coin::Issuance(IssuanceCoin {
        bearer: BearerCoin::Plain(PlainCoin::new(outpoint(1), 600, issuer_script.clone())),
        definition_url: Some("https://assets.example/gold.json".to_string()),
    });

    let mut builder = TransactionBuilder::with_seed(1);
    builder.add_coin(issuance_coin);
    builder.issue_asset(&dest, AssetAmount::new(asset_id, 1_000)).unwrap();

    let tx = builder.build(false).unwrap();
    assert_eq!(tx.inputs.len(), 1);
    assert_eq!(tx.inputs[0].previous_outpoint, outpoint(1));
    assert_eq!(tx.outputs.len(), 2);
    assert_eq!(tx.outputs[0].locking_script, dest);
    assert_eq!(tx.outputs[0].satoshis, 600);

    let (marker_index, marker) = ColorMarker::from_transaction(&tx).expect("marker present");
    assert_eq!(marker_index, 1);
    assert_eq!(marker.quantities(), &[1_000]);
    assert_eq!(marker.metadata(), b"u=https://assets.example/gold.json");
}

/// Issuing without a matching issuance coin fails.
#[test]
fn test_issue_without_issuance_coin() {
    let dest = script_for(&key(2));
    let asset_id = AssetId::from_bytes([0xEE; 20]);

    let mut builder = TransactionBuilder::with_seed(1);
    builder.add_coin(plain(1, 5_000, &script_for(&key(1))));
    builder.issue_asset(&dest, AssetAmount::new(asset_id, 10)).unwrap();

    assert!(matches!(
        builder.build(false),
        Err(BuilderError::MissingIssuanceCoin(id)) if id == asset_id
    ));
}

/// Only one asset id may be issued per session.
#[test]
fn test_single_issuance_rule() {
    let dest = script_for(&key(2));
    let first = AssetId::from_bytes([0x01; 20]);
    let second = AssetId::from_bytes([0x02; 20]);

    let mut builder = TransactionBuilder::with_seed(1);
    builder.issue_asset(&dest, AssetAmount::new(first, 10)).unwrap();
    // Re-issuing the same asset is fine.
    builder.issue_asset(&dest, AssetAmount::new(first, 5)).unwrap();
    assert!(matches!(
        builder.issue_asset(&dest, AssetAmount::new(second, 10)),
        Err(BuilderError::MultipleIssuance { .. })
    ));
}

// -----------------------------------------------------------------------
// OP_RETURN exclusivity and stealth
// -----------------------------------------------------------------------

/// The overlay output has a single owner per session.
#[test]
fn test_op_return_exclusivity() {
    let asset_id = AssetId::from_bytes([0x11; 20]);
    let dest = script_for(&key(2));
    let scan = key(11);
    let spend = key(12);
    let address = StealthAddress::new(scan.pub_key(), vec![spend.pub_key()], 1).unwrap();

    let mut builder = TransactionBuilder::with_seed(1);
    builder.send_asset(&dest, AssetAmount::new(asset_id, 5)).unwrap();
    assert!(matches!(
        builder.send_stealth(&address, 1_000, None),
        Err(BuilderError::OpReturnConflict(_))
    ));

    let mut builder = TransactionBuilder::with_seed(1);
    builder.send_stealth(&address, 1_000, None).unwrap();
    assert!(matches!(
        builder.send_asset(&dest, AssetAmount::new(asset_id, 5)),
        Err(BuilderError::OpReturnConflict(_))
    ));
}

/// A stealth send emits the metadata output and the derived payment
/// output, and the receiver can uncover and sign the payment.
#[test]
fn test_stealth_send_and_spend() {
    let owner = key(1);
    let change = script_for(&key(3));
    let funding = script_for(&owner);

    let scan = key(11);
    let spend = key(12);
    let ephemeral = key(13);
    let address = StealthAddress::new(scan.pub_key(), vec![spend.pub_key()], 1).unwrap();

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coin(plain(1, 10_000, &funding))
        .set_change(&change, ChangeType::Uncolored);
    builder
        .send_stealth(&address, 5_000, Some(ephemeral.clone()))
        .unwrap();

    let tx = builder.build(false).unwrap();
    // Metadata output, payment output, change output.
    assert_eq!(tx.outputs.len(), 3);
    assert!(tx.outputs[0].locking_script.is_null_data());
    assert_eq!(tx.outputs[1].satoshis, 5_000);

    let expected_payment = address.create_payment(&ephemeral, 0).unwrap();
    assert_eq!(tx.outputs[1].locking_script, expected_payment.payment_script);

    // The receiver spends the payment with scan + spend keys.
    let payment_outpoint = OutPoint::new(tx.tx_id(), 1);
    let stealth_coin = Coin::Stealth(StealthCoin {
        plain: PlainCoin::new(payment_outpoint, 5_000, tx.outputs[1].locking_script.clone()),
        ephemeral_key: ephemeral.pub_key(),
    });

    let mut receiver = TransactionBuilder::with_seed(2);
    receiver
        .add_coin(stealth_coin)
        .add_keys([scan, spend])
        .set_change(&change, ChangeType::Uncolored);
    receiver.send(&script_for(&key(4)), 4_000).unwrap();

    let spend_tx = receiver.build(true).unwrap();
    assert!(spend_tx.inputs[0].unlocking_script.is_some());
}

// -----------------------------------------------------------------------
// Signing and combination
// -----------------------------------------------------------------------

/// A P2PKH input is signed with a verifiable signature.
#[test]
fn test_sign_p2pkh() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let change = script_for(&key(3));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coin(plain(1, 10_000, &funding))
        .add_key(owner.clone())
        .set_change(&change, ChangeType::Uncolored);
    builder.send(&dest, 6_000).unwrap();

    let tx = builder.build(true).unwrap();
    let script_sig = tx.inputs[0].unlocking_script.as_ref().expect("signed");
    let chunks = script_sig.chunks().unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(
        chunks[1].push_bytes().unwrap(),
        owner.pub_key().to_compressed()
    );

    // The embedded signature verifies against the input's sighash.
    let sig_bytes = chunks[0].push_bytes().unwrap();
    let der = &sig_bytes[..sig_bytes.len() - 1];
    let sig = tint_primitives::ec::Signature::from_der(der).unwrap();
    let hash = tint_transaction::sighash::signature_hash(
        &tx,
        0,
        funding.to_bytes(),
        tint_transaction::sighash::SIGHASH_ALL,
    )
    .unwrap();
    assert!(owner.pub_key().verify(&hash, &sig));
}

/// Inputs without a known key stay unsigned; unknown templates fail.
#[test]
fn test_sign_without_key_and_unknown_template() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let change = script_for(&key(3));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coin(plain(1, 10_000, &funding))
        .set_change(&change, ChangeType::Uncolored);
    builder.send(&dest, 6_000).unwrap();

    // No key added: build(sign) leaves the input unsigned.
    let tx = builder.build(true).unwrap();
    assert!(tx.inputs[0].unlocking_script.is_none());

    // A coin with an unclassifiable script cannot be signed.
    let weird = Script::from_bytes(&[0x76, 0x76, 0x87]);
    let mut builder = TransactionBuilder::with_seed(1);
    builder.add_coin(plain(2, 10_000, &weird));
    builder.send_fees(10_000);
    assert!(matches!(
        builder.build(true),
        Err(BuilderError::UnsupportedScriptTemplate { input_index: 0 })
    ));
}

/// Cooperating signers each add one multisig signature; combination is
/// commutative and completes the script.
#[test]
fn test_multisig_combine_signatures() {
    let key_a = key(21);
    let key_b = key(22);
    let dest = script_for(&key(2));
    let change = script_for(&key(3));
    let lock = multisig(
        2,
        &[
            key_a.pub_key().to_compressed().to_vec(),
            key_b.pub_key().to_compressed().to_vec(),
        ],
    )
    .unwrap();

    let make_builder = |signing_key: &PrivateKey| {
        let mut builder = TransactionBuilder::with_seed(5);
        builder
            .add_coin(plain(1, 10_000, &lock))
            .add_key(signing_key.clone())
            .set_change(&change, ChangeType::Uncolored);
        builder.send(&dest, 6_000).unwrap();
        builder
    };

    let mut builder_a = make_builder(&key_a);
    let mut builder_b = make_builder(&key_b);

    let tx_a = builder_a.build(true).unwrap();
    let tx_b = builder_b.build(true).unwrap();
    // Same seed, same declarations: both signers worked on the same
    // unsigned transaction.
    let unsigned = |tx: &Transaction| {
        let mut stripped = tx.clone();
        for input in &mut stripped.inputs {
            input.unlocking_script = None;
        }
        stripped.to_bytes()
    };
    assert_eq!(unsigned(&tx_a), unsigned(&tx_b));

    let combined_ab = builder_a.combine_signatures(&[tx_a.clone(), tx_b.clone()]).unwrap();
    let combined_ba = builder_a.combine_signatures(&[tx_b, tx_a]).unwrap();

    let sig_ab = combined_ab.inputs[0].unlocking_script.clone().expect("combined");
    let sig_ba = combined_ba.inputs[0].unlocking_script.clone().expect("combined");
    assert_eq!(sig_ab, sig_ba);

    // Leading zero plus both signatures.
    let chunks = sig_ab.chunks().unwrap();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].push_bytes().unwrap(), &[] as &[u8]);
}

// -----------------------------------------------------------------------
// Estimation, verification, continuation
// -----------------------------------------------------------------------

/// The size estimate brackets the actual signed size.
#[test]
fn test_estimate_size_brackets_signed_size() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let change = script_for(&key(3));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coins([plain(1, 6_000, &funding), plain(2, 6_000, &funding)])
        .add_key(owner)
        .set_change(&change, ChangeType::Uncolored);
    builder.send(&dest, 9_000).unwrap().send_fees(500);

    let unsigned = builder.build(false).unwrap();
    let estimate = builder.estimate_size(&unsigned).unwrap();

    let signed = builder.build(true).unwrap();
    let actual = signed.size();
    assert!(estimate >= actual, "estimate {} below actual {}", estimate, actual);
    assert!(estimate - actual <= 4 * signed.inputs.len());

    let fees = builder
        .estimate_fees(&unsigned, &crate::FeeRate::per_kb(1000))
        .unwrap();
    assert_eq!(fees, estimate as i64);
}

/// Estimating a transaction with unknown coins reports which input.
#[test]
fn test_estimate_unknown_coin() {
    let builder = TransactionBuilder::with_seed(1);
    let mut tx = Transaction::new();
    tx.add_input(tint_transaction::TransactionInput::new(outpoint(9)));

    match builder.estimate_size(&tx) {
        Err(BuilderError::CoinNotFound {
            outpoint: missing,
            input_index,
        }) => {
            assert_eq!(missing, outpoint(9));
            assert_eq!(input_index, 0);
        }
        other => panic!("expected coin-not-found, got {:?}", other),
    }
}

/// verify accepts a well-formed build and checks the fee expectation
/// within the dust-prevention margin.
#[test]
fn test_verify_fee_expectation() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let change = script_for(&key(3));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coin(plain(1, 10_000, &funding))
        .set_change(&change, ChangeType::Uncolored);
    builder.send(&dest, 6_000).unwrap().send_fees(1_000);

    let tx = builder.build(false).unwrap();
    assert_eq!(builder.verify_with_fees(&tx, 1_000).unwrap(), Vec::new());

    let violations = builder.verify_with_fees(&tx, 5_000).unwrap();
    assert!(violations
        .iter()
        .any(|v| matches!(v, PolicyViolation::FeeMismatch { actual: 1_000, .. })));
}

/// verify reports unknown coins as violations, not errors.
#[test]
fn test_verify_unknown_coin_violation() {
    let builder = TransactionBuilder::with_seed(1);
    let mut tx = Transaction::new();
    tx.add_input(tint_transaction::TransactionInput::new(outpoint(7)));
    tx.add_output(tint_transaction::TransactionOutput::new(
        1_000,
        script_for(&key(2)),
    ));

    let violations = builder.verify(&tx).unwrap();
    assert!(violations
        .iter()
        .any(|v| matches!(v, PolicyViolation::CoinUnavailable { index: 0, .. })));
}

/// continue_to_build + cover_the_rest funds a partial transaction.
#[test]
fn test_cover_the_rest() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let funding = script_for(&owner);

    // A partial transaction already spending a 2000-satoshi coin toward a
    // 5000-satoshi output.
    let partial_coin = PlainCoin::new(outpoint(8), 2_000, funding.clone());
    let mut partial = Transaction::new();
    partial.add_input(tint_transaction::TransactionInput::new(outpoint(8)));
    partial.add_output(tint_transaction::TransactionOutput::new(5_000, dest));

    let finder_coin = partial_coin.clone();
    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coin(plain(1, 3_000, &funding))
        .set_coin_finder(move |op| {
            if *op == finder_coin.outpoint {
                Some(Coin::Plain(finder_coin.clone()))
            } else {
                None
            }
        });
    builder.continue_to_build(partial).cover_the_rest().unwrap();

    let tx = builder.build(false).unwrap();
    assert_eq!(tx.inputs.len(), 2);
    assert_eq!(tx.outputs.len(), 1);
    let fee = total_input_value(&builder, &tx) - tx.total_output_satoshis() as i64;
    assert_eq!(fee, 0);
}

/// cover_the_rest with an unknown spent coin reports it.
#[test]
fn test_cover_the_rest_unknown_coin() {
    let mut partial = Transaction::new();
    partial.add_input(tint_transaction::TransactionInput::new(outpoint(9)));

    let mut builder = TransactionBuilder::with_seed(1);
    builder.continue_to_build(partial);
    assert!(matches!(
        builder.cover_the_rest(),
        Err(BuilderError::CoinNotFound { input_index: 0, .. })
    ));
}

/// shuffle preserves the multiset of coins and intents.
#[test]
fn test_shuffle_preserves_membership() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let change = script_for(&key(3));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(3);
    builder
        .add_coins([
            plain(1, 600, &funding),
            plain(2, 1_000, &funding),
            plain(3, 3_000, &funding),
        ])
        .set_change(&change, ChangeType::Uncolored);
    builder.send(&dest, 700).unwrap();
    builder.send(&dest, 800).unwrap();
    builder.send_fees(100);

    builder.shuffle();

    // Every coin is still present after the shuffle.
    for n in [1u8, 2, 3] {
        assert!(builder.find_coin(&outpoint(n)).is_some());
    }

    // Every declared send still lands in the built transaction, and the
    // fee directive is conserved, so the intent multiset survived too.
    let tx = builder.build(false).unwrap();
    assert!(tx.outputs.iter().any(|o| o.satoshis == 700));
    assert!(tx.outputs.iter().any(|o| o.satoshis == 800));
    let fee = total_input_value(&builder, &tx) - tx.total_output_satoshis() as i64;
    assert_eq!(fee, 100);
}

/// A pay-to-script-hash coin signs through its redeem script.
#[test]
fn test_sign_p2sh_wrapped_multisig() {
    let key_a = key(31);
    let key_b = key(32);
    let dest = script_for(&key(2));
    let change = script_for(&key(3));

    let redeem = multisig(
        1,
        &[
            key_a.pub_key().to_compressed().to_vec(),
            key_b.pub_key().to_compressed().to_vec(),
        ],
    )
    .unwrap();
    let wrapper = tint_script::template::pay_to_script(&redeem);

    let script_coin = crate::coin::ScriptCoin::new(
        PlainCoin::new(outpoint(1), 10_000, wrapper),
        redeem.clone(),
    )
    .unwrap();

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coin(Coin::Script(script_coin))
        .add_key(key_a)
        .set_change(&change, ChangeType::Uncolored);
    builder.send(&dest, 6_000).unwrap();

    let tx = builder.build(true).unwrap();
    let script_sig = tx.inputs[0].unlocking_script.as_ref().expect("signed");
    let chunks = script_sig.chunks().unwrap();
    // OP_0, one signature, the redeem push.
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[2].push_bytes().unwrap(), redeem.to_bytes());
}

/// Builds in multiple groups fund independently and in order.
#[test]
fn test_multiple_groups() {
    let owner = key(1);
    let dest = script_for(&key(2));
    let change = script_for(&key(3));
    let funding = script_for(&owner);

    let mut builder = TransactionBuilder::with_seed(1);
    builder
        .add_coin(plain(1, 5_000, &funding))
        .set_change(&change, ChangeType::Uncolored);
    builder.send(&dest, 4_000).unwrap().send_fees(1_000);
    builder.then();
    builder
        .add_coin(plain(2, 3_000, &funding))
        .set_change(&change, ChangeType::Uncolored);
    builder.send(&dest, 2_000).unwrap().send_fees(1_000);

    let tx = builder.build(false).unwrap();
    assert_eq!(tx.inputs.len(), 2);
    let fee = total_input_value(&builder, &tx) - tx.total_output_satoshis() as i64;
    assert_eq!(fee, 2_000);

    // Group funding is isolated: a group cannot use another group's coins.
    let mut builder = TransactionBuilder::with_seed(1);
    builder.add_coin(plain(1, 5_000, &funding));
    builder.then();
    builder.send(&dest, 4_000).unwrap();
    assert!(matches!(
        builder.build(false),
        Err(BuilderError::NotEnoughFunds { .. })
    ));
}
