//! Builder groups: independent funding plans within a session.

use tint_assets::AssetId;
use tint_script::Script;

use crate::coin::Coin;
use crate::intent::Intent;

/// An independent funding plan: its own coins, intents, change scripts,
/// and cover-only cap. A session holds an ordered list of groups and a
/// current pointer that advances on `then`.
pub(crate) struct BuilderGroup {
    /// Group name, used in insufficient-funds errors.
    pub name: String,
    /// The group's coins, deduplicated by outpoint, in insertion order.
    pub coins: Vec<Coin>,
    /// Native-currency intents in queue order.
    pub native_intents: Vec<Intent>,
    /// Per-asset intent lists, keyed by asset id in insertion order.
    pub asset_intents: Vec<(AssetId, Vec<Intent>)>,
    /// Issuance intents in queue order.
    pub issuance_intents: Vec<Intent>,
    /// Change scripts indexed by `ChangeType as usize`.
    pub change_scripts: [Option<Script>; 2],
    /// When set, the native pass funds only this amount plus change.
    pub cover_only: Option<i64>,
}

impl BuilderGroup {
    /// Create an empty group.
    pub fn new(name: String) -> Self {
        BuilderGroup {
            name,
            coins: Vec::new(),
            native_intents: Vec::new(),
            asset_intents: Vec::new(),
            issuance_intents: Vec::new(),
            change_scripts: [None, None],
            cover_only: None,
        }
    }

    /// Add a coin, replacing any existing coin with the same outpoint.
    pub fn add_coin(&mut self, coin: Coin) {
        let outpoint = coin.outpoint();
        match self.coins.iter_mut().find(|c| c.outpoint() == outpoint) {
            Some(existing) => *existing = coin,
            None => self.coins.push(coin),
        }
    }

    /// Look up a coin by outpoint.
    pub fn coin_by_outpoint(&self, outpoint: &tint_transaction::OutPoint) -> Option<&Coin> {
        self.coins.iter().find(|c| c.outpoint() == *outpoint)
    }

    /// Return the intent list for an asset, creating it (in insertion
    /// order) on first use.
    pub fn asset_intents_mut(&mut self, id: AssetId) -> &mut Vec<Intent> {
        if let Some(index) = self.asset_intents.iter().position(|(a, _)| *a == id) {
            return &mut self.asset_intents[index].1;
        }
        self.asset_intents.push((id, Vec::new()));
        &mut self.asset_intents.last_mut().expect("just pushed").1
    }
}
