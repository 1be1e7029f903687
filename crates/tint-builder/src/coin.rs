//! The coin model: immutable references to previously created outputs.
//!
//! A coin carries the outpoint, value, and locking script of an unspent
//! output, plus the variant-specific material the builder needs to spend
//! it: a redeem script for script coins, ephemeral key material for stealth
//! coins, an asset quantity for colored coins, and issuance authority for
//! issuance coins. Coins are value types; the builder never mutates them.

use tint_assets::{AssetAmount, AssetId};
use tint_primitives::ec::PublicKey;
use tint_primitives::hash::hash160;
use tint_script::{Script, ScriptTemplate};
use tint_transaction::OutPoint;

use crate::BuilderError;

/// A plain unspent output: outpoint, value, and locking script.
#[derive(Clone, Debug)]
pub struct PlainCoin {
    /// The outpoint identifying the output.
    pub outpoint: OutPoint,
    /// The output's native value in satoshis.
    pub satoshis: i64,
    /// The output's locking script.
    pub locking_script: Script,
}

impl PlainCoin {
    /// Create a plain coin.
    ///
    /// # Arguments
    /// * `outpoint` - The outpoint being referenced.
    /// * `satoshis` - The output value.
    /// * `locking_script` - The output's locking script.
    ///
    /// # Returns
    /// A new `PlainCoin`.
    pub fn new(outpoint: OutPoint, satoshis: i64, locking_script: Script) -> Self {
        PlainCoin {
            outpoint,
            satoshis,
            locking_script,
        }
    }
}

/// A plain coin whose P2SH output is spendable through a known redeem script.
#[derive(Clone, Debug)]
pub struct ScriptCoin {
    /// The underlying plain coin (its locking script is the P2SH wrapper).
    pub plain: PlainCoin,
    /// The redeem script whose Hash160 the output commits to.
    pub redeem_script: Script,
}

impl ScriptCoin {
    /// Create a script coin, validating the redeem script against the
    /// output's script hash.
    ///
    /// # Arguments
    /// * `plain` - The P2SH-locked plain coin.
    /// * `redeem_script` - The redeem script.
    ///
    /// # Returns
    /// `Ok(ScriptCoin)`, or an error if the output is not P2SH or the
    /// redeem script does not hash to its commitment.
    pub fn new(plain: PlainCoin, redeem_script: Script) -> Result<Self, BuilderError> {
        match ScriptTemplate::classify(&plain.locking_script) {
            ScriptTemplate::PayToScriptHash { script_hash } => {
                if hash160(redeem_script.to_bytes()) != script_hash {
                    return Err(BuilderError::InvalidScriptCoin(
                        "redeem script does not match the output's script hash".to_string(),
                    ));
                }
            }
            _ => {
                return Err(BuilderError::InvalidScriptCoin(
                    "output is not pay-to-script-hash".to_string(),
                ));
            }
        }
        Ok(ScriptCoin {
            plain,
            redeem_script,
        })
    }
}

/// A plain coin received through a stealth payment.
///
/// Carries the sender's ephemeral public key, recorded in the payment's
/// metadata output; the receiver combines it with the scan key to uncover
/// the one-time spend key.
#[derive(Clone, Debug)]
pub struct StealthCoin {
    /// The underlying plain coin paying to the derived one-time script.
    pub plain: PlainCoin,
    /// The sender's ephemeral public key.
    pub ephemeral_key: PublicKey,
}

/// The bearer of a colored or issuance coin: a plain or script coin whose
/// native value is the dust the colored output carries.
#[derive(Clone, Debug)]
pub enum BearerCoin {
    /// A plain bearer.
    Plain(PlainCoin),
    /// A P2SH bearer with a known redeem script.
    Script(ScriptCoin),
}

impl BearerCoin {
    /// Return the bearer's outpoint.
    pub fn outpoint(&self) -> OutPoint {
        match self {
            BearerCoin::Plain(c) => c.outpoint,
            BearerCoin::Script(c) => c.plain.outpoint,
        }
    }

    /// Return the bearer's native value.
    pub fn satoshis(&self) -> i64 {
        match self {
            BearerCoin::Plain(c) => c.satoshis,
            BearerCoin::Script(c) => c.plain.satoshis,
        }
    }

    /// Return the bearer's locking script.
    pub fn locking_script(&self) -> &Script {
        match self {
            BearerCoin::Plain(c) => &c.locking_script,
            BearerCoin::Script(c) => &c.plain.locking_script,
        }
    }

    /// Return the redeem script, if the bearer is a script coin.
    pub fn redeem_script(&self) -> Option<&Script> {
        match self {
            BearerCoin::Plain(_) => None,
            BearerCoin::Script(c) => Some(&c.redeem_script),
        }
    }
}

/// A coin carrying units of a colored asset on top of its bearer dust.
#[derive(Clone, Debug)]
pub struct ColoredCoin {
    /// The bearer coin whose native value is the colored output's dust.
    pub bearer: BearerCoin,
    /// The asset id and quantity this coin carries.
    pub asset: AssetAmount,
}

/// A coin authorizing the creation of new units of an asset.
///
/// The asset id derives from the coin's locking script, so whoever can
/// spend the coin controls issuance.
#[derive(Clone, Debug)]
pub struct IssuanceCoin {
    /// The bearer coin spent by the issuance input.
    pub bearer: BearerCoin,
    /// Optional asset-definition URL carried into the marker metadata.
    pub definition_url: Option<String>,
}

impl IssuanceCoin {
    /// Derive the id of the asset this coin can issue.
    ///
    /// # Returns
    /// The Hash160 of the bearer's locking script.
    pub fn asset_id(&self) -> AssetId {
        AssetId::from_script(self.bearer.locking_script())
    }
}

/// An immutable reference to a spendable output, in all the shapes the
/// builder understands.
#[derive(Clone, Debug)]
pub enum Coin {
    /// A plain coin.
    Plain(PlainCoin),
    /// A P2SH coin with a known redeem script.
    Script(ScriptCoin),
    /// A stealth-received coin.
    Stealth(StealthCoin),
    /// A colored coin.
    Colored(ColoredCoin),
    /// An issuance coin.
    Issuance(IssuanceCoin),
}

impl Coin {
    /// Return the coin's outpoint. Outpoints uniquely identify coins
    /// within a build.
    pub fn outpoint(&self) -> OutPoint {
        match self {
            Coin::Plain(c) => c.outpoint,
            Coin::Script(c) => c.plain.outpoint,
            Coin::Stealth(c) => c.plain.outpoint,
            Coin::Colored(c) => c.bearer.outpoint(),
            Coin::Issuance(c) => c.bearer.outpoint(),
        }
    }

    /// Return the coin's native value; for colored and issuance coins this
    /// is the bearer dust.
    pub fn satoshis(&self) -> i64 {
        match self {
            Coin::Plain(c) => c.satoshis,
            Coin::Script(c) => c.plain.satoshis,
            Coin::Stealth(c) => c.plain.satoshis,
            Coin::Colored(c) => c.bearer.satoshis(),
            Coin::Issuance(c) => c.bearer.satoshis(),
        }
    }

    /// Return the locking script of the output this coin references.
    pub fn locking_script(&self) -> &Script {
        match self {
            Coin::Plain(c) => &c.locking_script,
            Coin::Script(c) => &c.plain.locking_script,
            Coin::Stealth(c) => &c.plain.locking_script,
            Coin::Colored(c) => c.bearer.locking_script(),
            Coin::Issuance(c) => c.bearer.locking_script(),
        }
    }

    /// Return the redeem script, when one is attached.
    pub fn redeem_script(&self) -> Option<&Script> {
        match self {
            Coin::Plain(_) => None,
            Coin::Script(c) => Some(&c.redeem_script),
            Coin::Stealth(_) => None,
            Coin::Colored(c) => c.bearer.redeem_script(),
            Coin::Issuance(c) => c.bearer.redeem_script(),
        }
    }

    /// Return the asset amount of a colored coin.
    pub fn asset(&self) -> Option<AssetAmount> {
        match self {
            Coin::Colored(c) => Some(c.asset),
            _ => None,
        }
    }

    /// Check whether the coin funds native-currency passes (plain, script,
    /// and stealth coins do; colored and issuance coins do not).
    pub fn is_uncolored(&self) -> bool {
        matches!(self, Coin::Plain(_) | Coin::Script(_) | Coin::Stealth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tint_script::template::{pay_to_pubkey_hash, pay_to_script};

    fn outpoint(n: u8) -> OutPoint {
        OutPoint::new([n; 32], 0)
    }

    /// Verify script coin validation against the P2SH commitment.
    #[test]
    fn test_script_coin_validation() {
        let redeem = pay_to_pubkey_hash(&[1u8; 20]);
        let wrapper = pay_to_script(&redeem);
        let plain = PlainCoin::new(outpoint(1), 1000, wrapper);

        assert!(ScriptCoin::new(plain.clone(), redeem).is_ok());

        let wrong_redeem = pay_to_pubkey_hash(&[2u8; 20]);
        assert!(ScriptCoin::new(plain, wrong_redeem).is_err());

        let not_p2sh = PlainCoin::new(outpoint(2), 1000, pay_to_pubkey_hash(&[1u8; 20]));
        assert!(ScriptCoin::new(not_p2sh, pay_to_pubkey_hash(&[1u8; 20])).is_err());
    }

    /// Verify the colored coin's value is its bearer dust.
    #[test]
    fn test_colored_coin_bearer_value() {
        let bearer = BearerCoin::Plain(PlainCoin::new(
            outpoint(3),
            600,
            pay_to_pubkey_hash(&[3u8; 20]),
        ));
        let id = AssetId::from_bytes([9u8; 20]);
        let coin = Coin::Colored(ColoredCoin {
            bearer,
            asset: AssetAmount::new(id, 100),
        });
        assert_eq!(coin.satoshis(), 600);
        assert_eq!(coin.asset(), Some(AssetAmount::new(id, 100)));
        assert!(!coin.is_uncolored());
    }

    /// Verify the issuance coin's asset id derives from its locking script.
    #[test]
    fn test_issuance_asset_id() {
        let script = pay_to_pubkey_hash(&[7u8; 20]);
        let bearer = BearerCoin::Plain(PlainCoin::new(outpoint(4), 600, script.clone()));
        let coin = IssuanceCoin {
            bearer,
            definition_url: None,
        };
        assert_eq!(coin.asset_id(), AssetId::from_script(&script));
    }
}
