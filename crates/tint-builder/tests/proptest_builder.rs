use proptest::prelude::*;

use tint_assets::{AssetAmount, AssetId, ColorMarker};
use tint_builder::{ChangeType, Coin, ColoredCoin, PlainCoin, TransactionBuilder};
use tint_builder::{BearerCoin, BuilderError};
use tint_script::template::pay_to_pubkey_hash;
use tint_script::Script;
use tint_transaction::OutPoint;

fn funding_script() -> Script {
    pay_to_pubkey_hash(&[0x11; 20])
}

fn change_script() -> Script {
    pay_to_pubkey_hash(&[0x22; 20])
}

fn dest_script() -> Script {
    pay_to_pubkey_hash(&[0x33; 20])
}

fn plain_coin(index: usize, satoshis: i64) -> Coin {
    let mut txid = [0u8; 32];
    txid[0] = index as u8;
    txid[1] = (index >> 8) as u8;
    Coin::Plain(PlainCoin::new(OutPoint::new(txid, 0), satoshis, funding_script()))
}

fn colored_coin(index: usize, id: AssetId, quantity: u64) -> Coin {
    let mut txid = [0xF0u8; 32];
    txid[0] = index as u8;
    Coin::Colored(ColoredCoin {
        bearer: BearerCoin::Plain(PlainCoin::new(OutPoint::new(txid, 0), 600, funding_script())),
        asset: AssetAmount::new(id, quantity),
    })
}

/// Total input value resolved through the builder.
fn input_total(builder: &TransactionBuilder, tx: &tint_transaction::Transaction) -> i64 {
    tx.inputs
        .iter()
        .map(|i| builder.find_coin(&i.previous_outpoint).unwrap().satoshis())
        .sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever the coin pool and targets, a successful build conserves
    /// value: inputs = outputs + declared fee + absorbed dust.
    #[test]
    fn native_build_conserves_value(
        seed in any::<u64>(),
        coin_values in prop::collection::vec(600i64..50_000, 1..8),
        send in 600i64..20_000,
        fee in 0i64..2_000,
    ) {
        let mut builder = TransactionBuilder::with_seed(seed);
        let coins: Vec<Coin> = coin_values
            .iter()
            .enumerate()
            .map(|(i, &v)| plain_coin(i, v))
            .collect();
        builder.add_coins(coins).set_change(&change_script(), ChangeType::Uncolored);
        builder.send(&dest_script(), send).unwrap().send_fees(fee);

        match builder.build(false) {
            Ok(tx) => {
                let inputs = input_total(&builder, &tx);
                let outputs = tx.total_output_satoshis() as i64;
                // Selection covers outputs plus the declared fee; anything
                // beyond that is dust absorbed into the fee.
                prop_assert!(inputs >= outputs + fee);
                prop_assert!(tx.outputs.iter().any(|o| o.satoshis == send as u64));
            }
            Err(BuilderError::NotEnoughFunds { .. }) => {
                let total: i64 = coin_values.iter().sum();
                prop_assert!(total < send + fee);
            }
            Err(other) => return Err(TestCaseError::fail(format!("unexpected error: {}", other))),
        }
    }

    /// Builds are deterministic in the seed: same declarations, same bytes.
    #[test]
    fn builds_are_deterministic(
        seed in any::<u64>(),
        coin_values in prop::collection::vec(600i64..50_000, 2..6),
        send in 600i64..10_000,
    ) {
        let run = || {
            let mut builder = TransactionBuilder::with_seed(seed);
            let coins: Vec<Coin> = coin_values
                .iter()
                .enumerate()
                .map(|(i, &v)| plain_coin(i, v))
                .collect();
            builder.add_coins(coins).set_change(&change_script(), ChangeType::Uncolored);
            builder.send(&dest_script(), send).unwrap();
            builder.shuffle();
            builder.build(false).map(|tx| tx.to_bytes())
        };

        match (run(), run()) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(_), Err(_)) => {}
            _ => return Err(TestCaseError::fail("determinism broke between runs")),
        }
    }

    /// Colored transfers keep asset quantities balanced: the marker's
    /// quantities sum to the quantity carried by the selected coins.
    #[test]
    fn colored_build_balances_quantities(
        seed in any::<u64>(),
        quantities in prop::collection::vec(1u64..500, 1..5),
        send_quantity in 1u64..400,
    ) {
        let id = AssetId::from_bytes([0x77; 20]);
        let mut builder = TransactionBuilder::with_seed(seed);
        let coins: Vec<Coin> = quantities
            .iter()
            .enumerate()
            .map(|(i, &q)| colored_coin(i, id, q))
            .collect();
        builder
            .add_coins(coins)
            .add_coin(plain_coin(1000, 50_000))
            .set_change(&change_script(), ChangeType::Uncolored)
            .set_change(&pay_to_pubkey_hash(&[0x44; 20]), ChangeType::Colored);
        builder.send_asset(&dest_script(), AssetAmount::new(id, send_quantity)).unwrap();

        match builder.build(false) {
            Ok(tx) => {
                let (_, marker) = ColorMarker::from_transaction(&tx).expect("marker present");
                let moved: u64 = tx
                    .inputs
                    .iter()
                    .filter_map(|i| builder.find_coin(&i.previous_outpoint))
                    .filter_map(|c| c.asset())
                    .map(|a| a.quantity)
                    .sum();
                let recorded: u64 = marker.quantities().iter().sum();
                prop_assert_eq!(moved, recorded);
                prop_assert_eq!(marker.quantity(0), send_quantity);
            }
            Err(BuilderError::NotEnoughFunds { .. }) => {
                let total: u64 = quantities.iter().sum();
                prop_assert!(total < send_quantity);
            }
            Err(other) => return Err(TestCaseError::fail(format!("unexpected error: {}", other))),
        }
    }
}
