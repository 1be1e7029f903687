//! The transaction-builder session.
//!
//! A session accumulates coins, keys, and intents into funding groups,
//! then `build` runs the planner: per group, the issuance pass, one
//! funding fixed point per asset, and the native-currency pass. The
//! session owns the random generator (seedable for deterministic builds)
//! and passes it explicitly to the selector and the shuffler.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tint_assets::{AssetAmount, AssetId, Money, MoneyBag};
use tint_primitives::ec::PrivateKey;
use tint_primitives::hash::{hash160, sha1};
use tint_script::{Script, ScriptTemplate};
use tint_transaction::{OutPoint, Transaction};

use crate::coin::Coin;
use crate::context::{BuildContext, ChangeType};
use crate::fee::{dust_threshold, native_dust, FeeRate, DEFAULT_COLORED_DUST};
use crate::group::BuilderGroup;
use crate::intent::{Intent, IntentEnv};
use crate::policy::{MinerPolicy, StandardPolicy, TransactionPolicy};
use crate::select::{fisher_yates_shuffle, CoinSelector, DefaultCoinSelector};
use crate::stealth::StealthAddress;
use crate::BuilderError;

/// Hard cap on change fixed-point passes; two suffice in practice.
const MAX_CHANGE_PASSES: usize = 8;

/// Write-only sink for out-of-band metadata (exchange reasons).
///
/// The fixed point may re-apply intents, so writes must be idempotent from
/// the caller's standpoint.
pub trait MetadataRepository {
    /// Record a metadata string.
    ///
    /// # Arguments
    /// * `data` - The string to record.
    fn add(&mut self, data: &str);
}

/// Pluggable fallback resolving outpoints the session's coin maps miss.
type CoinFinder = Box<dyn Fn(&OutPoint) -> Option<Coin>>;

/// Pluggable fallback resolving signing keys by script.
type KeyFinder = Box<dyn Fn(&Script) -> Option<PrivateKey>>;

/// The subsystem holding the transaction's single OP_RETURN slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OpReturnUser {
    /// The color marker.
    ColoredCoins,
    /// A stealth payment's metadata output.
    Stealth,
}

impl OpReturnUser {
    fn name(self) -> &'static str {
        match self {
            OpReturnUser::ColoredCoins => "colored coins",
            OpReturnUser::Stealth => "stealth payments",
        }
    }
}

/// A single-use transaction-building session.
pub struct TransactionBuilder {
    pub(crate) groups: Vec<BuilderGroup>,
    pub(crate) current: usize,
    pub(crate) rng: StdRng,
    pub(crate) keys: Vec<PrivateKey>,
    pub(crate) known_redeems: Vec<Script>,
    pub(crate) selector: Box<dyn CoinSelector>,
    pub(crate) coin_finder: Option<CoinFinder>,
    pub(crate) key_finder: Option<KeyFinder>,
    pub(crate) repository: Option<Box<dyn MetadataRepository>>,
    pub(crate) miner_policy: Box<dyn TransactionPolicy>,
    pub(crate) standard_policy: Box<dyn TransactionPolicy>,
    pub(crate) dust_prevention: bool,
    pub(crate) min_relay_fee: FeeRate,
    pub(crate) colored_dust: i64,
    pub(crate) op_return_owner: Option<OpReturnUser>,
    pub(crate) lock_time: Option<u32>,
    pub(crate) base_transaction: Option<Transaction>,
    pub(crate) issued_asset: Option<AssetId>,
}

impl TransactionBuilder {
    /// Create a session with an entropy-seeded random generator.
    ///
    /// # Returns
    /// A new `TransactionBuilder` with one empty group.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a session with a fixed seed, making builds fully
    /// deterministic.
    ///
    /// # Arguments
    /// * `seed` - The generator seed.
    ///
    /// # Returns
    /// A new deterministic `TransactionBuilder`.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        TransactionBuilder {
            groups: vec![BuilderGroup::new("group 1".to_string())],
            current: 0,
            rng,
            keys: Vec::new(),
            known_redeems: Vec::new(),
            selector: Box::new(DefaultCoinSelector),
            coin_finder: None,
            key_finder: None,
            repository: None,
            miner_policy: Box::new(MinerPolicy::default()),
            standard_policy: Box::new(StandardPolicy::default()),
            dust_prevention: true,
            min_relay_fee: FeeRate::default(),
            colored_dust: DEFAULT_COLORED_DUST,
            op_return_owner: None,
            lock_time: None,
            base_transaction: None,
            issued_asset: None,
        }
    }

    // -----------------------------------------------------------------
    // Session configuration
    // -----------------------------------------------------------------

    /// Add a coin to the current group, replacing any coin with the same
    /// outpoint.
    pub fn add_coin(&mut self, coin: Coin) -> &mut Self {
        self.current_group_mut().add_coin(coin);
        self
    }

    /// Add several coins to the current group.
    pub fn add_coins<I: IntoIterator<Item = Coin>>(&mut self, coins: I) -> &mut Self {
        for coin in coins {
            self.add_coin(coin);
        }
        self
    }

    /// Add a signing key to the session.
    pub fn add_key(&mut self, key: PrivateKey) -> &mut Self {
        self.keys.push(key);
        self
    }

    /// Add several signing keys to the session.
    pub fn add_keys<I: IntoIterator<Item = PrivateKey>>(&mut self, keys: I) -> &mut Self {
        self.keys.extend(keys);
        self
    }

    /// Register redeem scripts the signer may need for P2SH inputs.
    pub fn add_known_redeems<I: IntoIterator<Item = Script>>(&mut self, redeems: I) -> &mut Self {
        self.known_redeems.extend(redeems);
        self
    }

    /// Configure the current group's change script for a change kind.
    pub fn set_change(&mut self, script: &Script, change_type: ChangeType) -> &mut Self {
        self.current_group_mut().change_scripts[change_type as usize] = Some(script.clone());
        self
    }

    /// Cap the current group's native funding at `amount` plus change.
    pub fn cover_only(&mut self, amount: i64) -> &mut Self {
        self.current_group_mut().cover_only = Some(amount);
        self
    }

    /// Rename the current group (the name appears in funding errors).
    pub fn set_group_name<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.current_group_mut().name = name.into();
        self
    }

    /// Close the current group and open a new one; subsequent coins and
    /// intents land in the new group.
    pub fn then(&mut self) -> &mut Self {
        let name = format!("group {}", self.groups.len() + 1);
        self.groups.push(BuilderGroup::new(name));
        self.current = self.groups.len() - 1;
        self
    }

    /// Set the transaction lock time; the first selected input will get a
    /// non-final sequence so the lock time takes effect.
    pub fn set_lock_time(&mut self, lock_time: u32) -> &mut Self {
        self.lock_time = Some(lock_time);
        self
    }

    /// Replace the coin-selection strategy.
    pub fn set_coin_selector(&mut self, selector: Box<dyn CoinSelector>) -> &mut Self {
        self.selector = selector;
        self
    }

    /// Install a fallback coin finder consulted when the session's coin
    /// maps miss an outpoint.
    pub fn set_coin_finder<F>(&mut self, finder: F) -> &mut Self
    where
        F: Fn(&OutPoint) -> Option<Coin> + 'static,
    {
        self.coin_finder = Some(Box::new(finder));
        self
    }

    /// Install a fallback key finder consulted when the session's key set
    /// cannot satisfy a script.
    pub fn set_key_finder<F>(&mut self, finder: F) -> &mut Self
    where
        F: Fn(&Script) -> Option<PrivateKey> + 'static,
    {
        self.key_finder = Some(Box::new(finder));
        self
    }

    /// Install the metadata repository written by exchange operations.
    pub fn set_metadata_repository<R: MetadataRepository + 'static>(
        &mut self,
        repository: R,
    ) -> &mut Self {
        self.repository = Some(Box::new(repository));
        self
    }

    /// Replace the miner and standard policies used by `verify`.
    pub fn set_policies(
        &mut self,
        miner: Box<dyn TransactionPolicy>,
        standard: Box<dyn TransactionPolicy>,
    ) -> &mut Self {
        self.miner_policy = miner;
        self.standard_policy = standard;
        self
    }

    /// Enable or disable dust prevention (on by default).
    pub fn set_dust_prevention(&mut self, enabled: bool) -> &mut Self {
        self.dust_prevention = enabled;
        self
    }

    /// Set the native value carried by colored outputs.
    pub fn set_colored_dust(&mut self, satoshis: i64) -> &mut Self {
        self.colored_dust = satoshis;
        self
    }

    /// Set the minimum relay fee rate used for dust thresholds.
    pub fn set_min_relay_fee(&mut self, rate: FeeRate) -> &mut Self {
        self.min_relay_fee = rate;
        self
    }

    // -----------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------

    /// Send native currency to a script.
    ///
    /// Under dust prevention, a sub-dust amount to a non-data script is
    /// silently rerouted to the fee pool instead of producing an
    /// unrelayable output.
    ///
    /// # Arguments
    /// * `script` - Destination locking script.
    /// * `amount` - Amount in satoshis, non-negative.
    pub fn send(&mut self, script: &Script, amount: i64) -> Result<&mut Self, BuilderError> {
        if amount < 0 {
            return Err(BuilderError::NegativeAmount(amount));
        }
        if self.dust_prevention
            && !script.is_null_data()
            && amount < dust_threshold(script, &self.min_relay_fee)
        {
            return Ok(self.send_fees(amount));
        }
        self.current_group_mut().native_intents.push(Intent::SendNative {
            script: script.clone(),
            amount,
        });
        Ok(self)
    }

    /// Send a money value, dispatching on its kind.
    pub fn send_money(&mut self, script: &Script, money: Money) -> Result<&mut Self, BuilderError> {
        match money {
            Money::Native(amount) => self.send(script, amount),
            Money::Asset(amount) => self.send_asset(script, amount),
        }
    }

    /// Send every component of a money bag to the same script.
    pub fn send_bag(&mut self, script: &Script, bag: &MoneyBag) -> Result<&mut Self, BuilderError> {
        for money in bag.iter() {
            self.send_money(script, *money)?;
        }
        Ok(self)
    }

    /// Send asset units to a script.
    ///
    /// # Arguments
    /// * `script` - Destination locking script.
    /// * `amount` - Asset id and quantity.
    pub fn send_asset(
        &mut self,
        script: &Script,
        amount: AssetAmount,
    ) -> Result<&mut Self, BuilderError> {
        self.reserve_op_return(OpReturnUser::ColoredCoins)?;
        self.current_group_mut()
            .asset_intents_mut(amount.id)
            .push(Intent::SendAsset {
                script: script.clone(),
                amount,
                to_exchange: false,
            });
        Ok(self)
    }

    /// Send asset units to an exchange: marker version 2, op-code 0x01,
    /// and the output's exchange flag set. Fails at build time if the
    /// marker op-code is already set to a different value.
    pub fn send_asset_to_exchange(
        &mut self,
        script: &Script,
        amount: AssetAmount,
    ) -> Result<&mut Self, BuilderError> {
        self.reserve_op_return(OpReturnUser::ColoredCoins)?;
        self.current_group_mut()
            .asset_intents_mut(amount.id)
            .push(Intent::SendAsset {
                script: script.clone(),
                amount,
                to_exchange: true,
            });
        Ok(self)
    }

    /// Perform an exchange operation: two flagged colored outputs, marker
    /// version 2 / op-code 0x02, SHA-1(reason) as marker metadata, and the
    /// reason written to the metadata repository.
    ///
    /// Must be queued before any other asset intent in the group.
    pub fn exchange_operation(
        &mut self,
        script1: &Script,
        asset1: AssetAmount,
        script2: &Script,
        asset2: AssetAmount,
        reason: &str,
    ) -> Result<&mut Self, BuilderError> {
        if !self.current_group().asset_intents.is_empty() {
            return Err(BuilderError::ExchangeAfterAssetIntents);
        }
        self.reserve_op_return(OpReturnUser::ColoredCoins)?;
        let digest = sha1(reason.as_bytes());

        self.current_group_mut()
            .asset_intents_mut(asset1.id)
            .push(Intent::ExchangeLeg {
                script: script1.clone(),
                amount: asset1,
                reason: Some(reason.to_string()),
                digest,
            });
        self.current_group_mut()
            .asset_intents_mut(asset2.id)
            .push(Intent::ExchangeLeg {
                script: script2.clone(),
                amount: asset2,
                reason: None,
                digest,
            });
        Ok(self)
    }

    /// Issue new units of an asset. Only one asset id may be issued per
    /// session; the group must hold a matching issuance coin at build time.
    pub fn issue_asset(
        &mut self,
        script: &Script,
        amount: AssetAmount,
    ) -> Result<&mut Self, BuilderError> {
        if let Some(first) = self.issued_asset {
            if first != amount.id {
                return Err(BuilderError::MultipleIssuance {
                    first,
                    second: amount.id,
                });
            }
        } else {
            self.issued_asset = Some(amount.id);
        }
        self.reserve_op_return(OpReturnUser::ColoredCoins)?;
        self.current_group_mut().issuance_intents.push(Intent::Issue {
            script: script.clone(),
            amount,
        });
        Ok(self)
    }

    /// Contribute an amount to the fee pool.
    pub fn send_fees(&mut self, amount: i64) -> &mut Self {
        self.current_group_mut()
            .native_intents
            .push(Intent::SendFees { amount });
        self
    }

    /// Estimate the fees of the session's unsigned transaction at the
    /// given rate and queue them via `send_fees`.
    pub fn send_estimated_fees(&mut self, rate: &FeeRate) -> Result<&mut Self, BuilderError> {
        let transaction = self.build(false)?;
        let size = self.estimate_size(&transaction)?;
        Ok(self.send_fees(rate.fee(size)))
    }

    /// Split a fee amount into one share per group (remainder to the
    /// first group).
    pub fn send_fees_split(&mut self, amount: i64) -> &mut Self {
        let count = self.groups.len() as i64;
        let share = amount / count;
        let remainder = amount % count;
        for (index, group) in self.groups.iter_mut().enumerate() {
            let group_amount = if index == 0 { share + remainder } else { share };
            if group_amount != 0 {
                group.native_intents.push(Intent::SendFees {
                    amount: group_amount,
                });
            }
        }
        self
    }

    /// Send a stealth payment.
    ///
    /// Reserves the OP_RETURN slot for the payment's metadata output; a
    /// session already using it for colored coins fails here.
    ///
    /// # Arguments
    /// * `address` - The recipient's stealth address.
    /// * `amount` - Amount in satoshis, non-negative.
    /// * `ephemeral` - Ephemeral key; derived from the session generator
    ///   when absent.
    pub fn send_stealth(
        &mut self,
        address: &StealthAddress,
        amount: i64,
        ephemeral: Option<PrivateKey>,
    ) -> Result<&mut Self, BuilderError> {
        if amount < 0 {
            return Err(BuilderError::NegativeAmount(amount));
        }
        self.reserve_op_return(OpReturnUser::Stealth)?;
        let ephemeral = match ephemeral {
            Some(key) => key,
            None => self.random_private_key()?,
        };
        let nonce: u32 = self.rng.gen();
        let payment = address.create_payment(&ephemeral, nonce)?;
        self.current_group_mut().native_intents.push(Intent::SendStealth {
            metadata_script: payment.metadata_script,
            payment_script: payment.payment_script,
            amount,
        });
        Ok(self)
    }

    /// Continue building on top of an existing partial transaction.
    pub fn continue_to_build(&mut self, transaction: Transaction) -> &mut Self {
        self.base_transaction = Some(transaction);
        self
    }

    /// Queue funding for whatever the continued transaction's outputs
    /// still lack: outputs total minus the value its inputs already spend.
    ///
    /// # Returns
    /// The builder, or `CoinNotFound` if an input's coin is unresolvable,
    /// or `MissingBaseTransaction` without `continue_to_build`.
    pub fn cover_the_rest(&mut self) -> Result<&mut Self, BuilderError> {
        let base = self
            .base_transaction
            .clone()
            .ok_or(BuilderError::MissingBaseTransaction)?;

        let mut spent: i64 = 0;
        for (index, input) in base.inputs.iter().enumerate() {
            let coin = self
                .find_coin(&input.previous_outpoint)
                .ok_or(BuilderError::CoinNotFound {
                    outpoint: input.previous_outpoint,
                    input_index: index,
                })?;
            if coin.is_uncolored() {
                spent += coin.satoshis();
            }
        }

        let missing = base.total_output_satoshis() as i64 - spent;
        self.current_group_mut().native_intents.push(Intent::SendFees {
            amount: missing.max(0),
        });
        Ok(self)
    }

    /// Reorder the intents within each list and each group's coins using
    /// the session generator. Membership is preserved; only order changes.
    pub fn shuffle(&mut self) -> &mut Self {
        let TransactionBuilder { groups, rng, .. } = self;
        for group in groups.iter_mut() {
            fisher_yates_shuffle(rng, &mut group.native_intents);
            for (_, intents) in group.asset_intents.iter_mut() {
                fisher_yates_shuffle(rng, intents);
            }
            fisher_yates_shuffle(rng, &mut group.issuance_intents);
            fisher_yates_shuffle(rng, &mut group.coins);
        }
        self
    }

    // -----------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------

    /// Build the transaction: per group, the issuance pass, one funding
    /// fixed point per asset, then the native pass; finally the marker
    /// output is rewritten with its finished payload and, when requested,
    /// every input with a known key is signed in place.
    ///
    /// # Arguments
    /// * `sign` - Whether to sign the built transaction.
    ///
    /// # Returns
    /// The built transaction, or the planner error that aborted it.
    pub fn build(&mut self, sign: bool) -> Result<Transaction, BuilderError> {
        let base = match &self.base_transaction {
            Some(transaction) => transaction.clone(),
            None => Transaction::new(),
        };
        let mut ctx = BuildContext::new(base, self.lock_time.is_some());
        if let Some(lock_time) = self.lock_time {
            ctx.transaction.lock_time = lock_time;
        }

        {
            let TransactionBuilder {
                groups,
                rng,
                selector,
                repository,
                colored_dust,
                dust_prevention,
                min_relay_fee,
                ..
            } = self;
            let selector: &dyn CoinSelector = selector.as_ref();
            let native_dust_bound = if *dust_prevention {
                native_dust(min_relay_fee)
            } else {
                0
            };
            let relay = *min_relay_fee;
            let prevention = *dust_prevention;
            let change_dust = move |script: &Script| {
                if prevention {
                    dust_threshold(script, &relay)
                } else {
                    0
                }
            };
            let change_dust: &dyn Fn(&Script) -> i64 = &change_dust;

            for group in groups.iter() {
                ctx.additional_fees = 0;

                // Issuance pass: applied once, outside the fixed point.
                {
                    let mut env = IntentEnv {
                        repository: &mut *repository,
                        colored_dust: *colored_dust,
                    };
                    for intent in &group.issuance_intents {
                        intent.apply(&mut ctx, group, &mut env)?;
                    }
                }

                // Per-asset passes, in insertion order.
                for (asset_id, intents) in &group.asset_intents {
                    ctx.change_type = ChangeType::Colored;
                    ctx.change_amount = Money::Asset(AssetAmount::new(*asset_id, 0));
                    ctx.dust = Money::Asset(AssetAmount::new(*asset_id, 0));
                    ctx.cover_only = None;

                    let candidates: Vec<(OutPoint, u64)> = group
                        .coins
                        .iter()
                        .filter_map(|coin| match coin {
                            Coin::Colored(colored) if colored.asset.id == *asset_id => {
                                Some((coin.outpoint(), colored.asset.quantity))
                            }
                            _ => None,
                        })
                        .collect();

                    let id = *asset_id;
                    let selected = {
                        let mut env = IntentEnv {
                            repository: &mut *repository,
                            colored_dust: *colored_dust,
                        };
                        run_funding_pass::<u64>(
                            &mut ctx,
                            group,
                            &mut env,
                            selector,
                            rng,
                            intents,
                            &Intent::ColoredChange,
                            None,
                            &candidates,
                            None,
                            0,
                            &move |quantity| Money::Asset(AssetAmount::new(id, quantity)),
                            None,
                        )?
                    };

                    // The selected colored coins bring their bearer dust
                    // into the transaction; recover it from the fee pool.
                    let bearer: i64 = selected
                        .iter()
                        .filter_map(|outpoint| group.coin_by_outpoint(outpoint))
                        .map(|coin| coin.satoshis())
                        .sum();
                    ctx.additional_fees -= bearer;
                }

                // Native pass.
                ctx.change_type = ChangeType::Uncolored;
                ctx.change_amount = Money::Native(0);
                ctx.dust = Money::Native(native_dust_bound);
                ctx.cover_only = group.cover_only;

                let candidates: Vec<(OutPoint, i64)> = group
                    .coins
                    .iter()
                    .filter(|coin| coin.is_uncolored())
                    .map(|coin| (coin.outpoint(), coin.satoshis()))
                    .collect();

                {
                    let mut env = IntentEnv {
                        repository: &mut *repository,
                        colored_dust: *colored_dust,
                    };
                    run_funding_pass::<i64>(
                        &mut ctx,
                        group,
                        &mut env,
                        selector,
                        rng,
                        &group.native_intents,
                        &Intent::NativeChange,
                        Some(&Intent::AccruedFees),
                        &candidates,
                        group.cover_only,
                        native_dust_bound,
                        &Money::Native,
                        Some(change_dust),
                    )?;
                }
            }
        }

        // Finish: rewrite the marker output with the final payload, since
        // quantities may have grown during the build.
        if let Some(marker) = ctx.marker.clone() {
            if let Some(index) = ctx.find_marker_output() {
                ctx.transaction.outputs[index].locking_script = marker.to_script()?;
            }
        }

        let mut transaction = ctx.transaction;
        if sign {
            self.sign_transaction(&mut transaction)?;
        }
        Ok(transaction)
    }

    // -----------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------

    /// Resolve a coin by outpoint: the groups' coin lists first, then the
    /// fallback coin finder.
    pub fn find_coin(&self, outpoint: &OutPoint) -> Option<Coin> {
        for group in &self.groups {
            if let Some(coin) = group.coin_by_outpoint(outpoint) {
                return Some(coin.clone());
            }
        }
        if let Some(finder) = &self.coin_finder {
            return finder(outpoint);
        }
        None
    }

    /// Look up a registered redeem script matching a P2SH locking script.
    pub(crate) fn known_redeem_for(&self, script: &Script) -> Option<Script> {
        match ScriptTemplate::classify(script) {
            ScriptTemplate::PayToScriptHash { script_hash } => self
                .known_redeems
                .iter()
                .find(|redeem| hash160(redeem.to_bytes()) == script_hash)
                .cloned(),
            _ => None,
        }
    }

    pub(crate) fn current_group(&self) -> &BuilderGroup {
        &self.groups[self.current]
    }

    pub(crate) fn current_group_mut(&mut self) -> &mut BuilderGroup {
        &mut self.groups[self.current]
    }

    /// Claim the single OP_RETURN slot for a subsystem.
    fn reserve_op_return(&mut self, user: OpReturnUser) -> Result<(), BuilderError> {
        match self.op_return_owner {
            None => {
                self.op_return_owner = Some(user);
                Ok(())
            }
            Some(owner) if owner == user => Ok(()),
            Some(owner) => Err(BuilderError::OpReturnConflict(owner.name())),
        }
    }

    /// Derive a private key from the session generator (for ephemeral
    /// stealth keys), keeping builds seed-deterministic.
    fn random_private_key(&mut self) -> Result<PrivateKey, BuilderError> {
        for _ in 0..16 {
            let mut bytes = [0u8; 32];
            self.rng.fill(&mut bytes);
            if let Ok(key) = PrivateKey::from_bytes(&bytes) {
                return Ok(key);
            }
        }
        Err(BuilderError::Primitives(
            tint_primitives::PrimitivesError::InvalidPrivateKey(
                "generator produced no valid scalar".to_string(),
            ),
        ))
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------
// The funding fixed point
// ---------------------------------------------------------------------

/// Amount arithmetic a funding pass needs: total ordering, addition,
/// subtraction (zero is `dust - dust`), extraction from intent results,
/// and selector dispatch.
trait PassAmount:
    Copy + Ord + std::ops::Add<Output = Self> + std::ops::Sub<Output = Self>
{
    /// Extract this amount kind from an intent's contribution.
    fn from_money(money: Money) -> Self;

    /// Dispatch to the matching selector method.
    fn select(
        selector: &dyn CoinSelector,
        rng: &mut StdRng,
        amounts: &[Self],
        target: Self,
    ) -> Option<Vec<usize>>;
}

impl PassAmount for i64 {
    fn from_money(money: Money) -> Self {
        match money {
            Money::Native(value) => value,
            Money::Asset(_) => 0,
        }
    }

    fn select(
        selector: &dyn CoinSelector,
        rng: &mut StdRng,
        amounts: &[Self],
        target: Self,
    ) -> Option<Vec<usize>> {
        selector.select_native(rng, amounts, target)
    }
}

impl PassAmount for u64 {
    fn from_money(money: Money) -> Self {
        match money {
            Money::Native(_) => 0,
            Money::Asset(amount) => amount.quantity,
        }
    }

    fn select(
        selector: &dyn CoinSelector,
        rng: &mut StdRng,
        amounts: &[Self],
        target: Self,
    ) -> Option<Vec<usize>> {
        selector.select_quantities(rng, amounts, target)
    }
}

/// Run one funding fixed point: apply the pass intents (the change intent
/// last, its contribution joining the target), select coins, and either
/// finalize the selection or roll back, record the discovered change, and
/// go around again so the change intent can place its output.
///
/// Bounded by `MAX_CHANGE_PASSES`; non-convergence is an error.
#[allow(clippy::too_many_arguments)]
fn run_funding_pass<A: PassAmount>(
    ctx: &mut BuildContext,
    group: &BuilderGroup,
    env: &mut IntentEnv<'_>,
    selector: &dyn CoinSelector,
    rng: &mut StdRng,
    intents: &[Intent],
    change_intent: &Intent,
    extra_intent: Option<&Intent>,
    candidates: &[(OutPoint, A)],
    cover_only: Option<A>,
    dust: A,
    wrap: &dyn Fn(A) -> Money,
    script_dust: Option<&dyn Fn(&Script) -> A>,
) -> Result<Vec<OutPoint>, BuilderError> {
    let zero = dust - dust;

    for _ in 0..MAX_CHANGE_PASSES {
        let snapshot = ctx.memento();

        let mut target = zero;
        for intent in intents {
            target = target + A::from_money(intent.apply(ctx, group, env)?);
        }
        if let Some(extra) = extra_intent {
            target = target + A::from_money(extra.apply(ctx, group, env)?);
        }
        target = target + A::from_money(change_intent.apply(ctx, group, env)?);

        if let Some(cover) = cover_only {
            target = cover + A::from_money(ctx.change_amount);
        }

        let unconsumed: Vec<(OutPoint, A)> = candidates
            .iter()
            .filter(|(outpoint, _)| !ctx.consumed.contains(outpoint))
            .copied()
            .collect();
        let amounts: Vec<A> = unconsumed.iter().map(|(_, amount)| *amount).collect();

        let indexes = match A::select(selector, rng, &amounts, target) {
            Some(indexes) => indexes,
            None => {
                let available = amounts.iter().fold(zero, |acc, &a| acc + a);
                return Err(BuilderError::NotEnoughFunds {
                    group: group.name.clone(),
                    missing: wrap(target - available),
                });
            }
        };

        let total = indexes.iter().fold(zero, |acc, &i| acc + amounts[i]);
        if total < target {
            return Err(BuilderError::NotEnoughFunds {
                group: group.name.clone(),
                missing: wrap(target - total),
            });
        }

        let change = total - target;
        if change > dust {
            let change_script = group.change_scripts[ctx.change_type as usize]
                .as_ref()
                .ok_or(BuilderError::MissingChangeScript(ctx.change_type))?;
            let absorbed = match script_dust {
                Some(threshold) => change <= threshold(change_script),
                None => false,
            };
            if !absorbed {
                ctx.restore(snapshot);
                ctx.change_amount = wrap(change);
                continue;
            }
        }

        let mut selected = Vec::with_capacity(indexes.len());
        for &i in &indexes {
            let outpoint = unconsumed[i].0;
            ctx.consume(outpoint);
            ctx.ensure_input(outpoint);
            selected.push(outpoint);
        }
        return Ok(selected);
    }

    Err(BuilderError::ChangeNotConverged {
        group: group.name.clone(),
    })
}
