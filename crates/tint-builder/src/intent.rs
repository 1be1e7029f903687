//! Build intents.
//!
//! Every declared send, fee directive, issuance, or change step is data: a
//! tagged variant applied against the build context. Applying an intent
//! mutates the growing transaction (and the marker), and returns the amount
//! it contributed to the pass target. The fixed point may apply the same
//! intent several times, once per pass, after rolling the context back.

use tint_assets::marker::{OP_EXCHANGE_OPERATION, OP_TRANSFER_TO_EXCHANGE};
use tint_assets::{AssetAmount, Money};
use tint_script::Script;
use tint_transaction::{TransactionInput, TransactionOutput};

use crate::builder::MetadataRepository;
use crate::coin::Coin;
use crate::context::{BuildContext, ChangeType};
use crate::group::BuilderGroup;
use crate::BuilderError;

/// Shared resources an intent may need while applying.
pub(crate) struct IntentEnv<'a> {
    /// The session's metadata repository, written by exchange operations.
    pub repository: &'a mut Option<Box<dyn MetadataRepository>>,
    /// Native value carried by each colored output.
    pub colored_dust: i64,
}

/// A single declared step of the build.
#[derive(Clone, Debug)]
pub(crate) enum Intent {
    /// Implicit native change step, applied after the native pass intents.
    NativeChange,
    /// Implicit colored change step, applied after a per-asset pass.
    ColoredChange,
    /// Implicit step contributing the accumulated colored-output costs to
    /// the native target.
    AccruedFees,
    /// Send native currency to a script.
    SendNative {
        /// Destination locking script.
        script: Script,
        /// Amount in satoshis.
        amount: i64,
    },
    /// Contribute an amount to the native target without an output.
    SendFees {
        /// Amount in satoshis.
        amount: i64,
    },
    /// Send asset units to a script.
    SendAsset {
        /// Destination locking script.
        script: Script,
        /// Asset id and quantity.
        amount: AssetAmount,
        /// Whether this send targets an exchange (marker op-code 0x01 with
        /// the output's exchange flag set).
        to_exchange: bool,
    },
    /// One leg of an exchange operation (marker op-code 0x02).
    ExchangeLeg {
        /// Destination locking script.
        script: Script,
        /// Asset id and quantity.
        amount: AssetAmount,
        /// The operation's reason, present on the first leg only; written
        /// to the metadata repository on every application.
        reason: Option<String>,
        /// SHA-1 digest of the reason, stored as marker metadata.
        digest: [u8; 20],
    },
    /// Issue new units of an asset.
    Issue {
        /// Destination locking script for the issued output.
        script: Script,
        /// Asset id and quantity to issue.
        amount: AssetAmount,
    },
    /// Send a stealth payment: metadata output plus payment output.
    SendStealth {
        /// The OP_RETURN metadata script carrying the ephemeral key.
        metadata_script: Script,
        /// The derived one-time payment script.
        payment_script: Script,
        /// Amount in satoshis.
        amount: i64,
    },
}

impl Intent {
    /// Apply this intent to the build context.
    ///
    /// # Arguments
    /// * `ctx` - The build context to mutate.
    /// * `group` - The group the intent belongs to.
    /// * `env` - Shared session resources.
    ///
    /// # Returns
    /// The amount contributed to the pass target.
    pub fn apply(
        &self,
        ctx: &mut BuildContext,
        group: &BuilderGroup,
        env: &mut IntentEnv<'_>,
    ) -> Result<Money, BuilderError> {
        match self {
            Intent::NativeChange => apply_native_change(ctx, group),
            Intent::ColoredChange => apply_colored_change(ctx, group, env),
            Intent::AccruedFees => Ok(Money::Native(ctx.additional_fees)),
            Intent::SendNative { script, amount } => {
                ctx.transaction
                    .add_output(TransactionOutput::new(*amount as u64, script.clone()));
                Ok(Money::Native(*amount))
            }
            Intent::SendFees { amount } => Ok(Money::Native(*amount)),
            Intent::SendAsset {
                script,
                amount,
                to_exchange,
            } => apply_send_asset(ctx, env, script, *amount, *to_exchange),
            Intent::ExchangeLeg {
                script,
                amount,
                reason,
                digest,
            } => apply_exchange_leg(ctx, env, script, *amount, reason.as_deref(), digest),
            Intent::Issue { script, amount } => apply_issue(ctx, group, env, script, *amount),
            Intent::SendStealth {
                metadata_script,
                payment_script,
                amount,
            } => {
                ctx.transaction
                    .add_output(TransactionOutput::new(0, metadata_script.clone()));
                ctx.transaction
                    .add_output(TransactionOutput::new(*amount as u64, payment_script.clone()));
                Ok(Money::Native(*amount))
            }
        }
    }
}

/// Add the native change output when the pass discovered material change.
fn apply_native_change(ctx: &mut BuildContext, group: &BuilderGroup) -> Result<Money, BuilderError> {
    let amount = match ctx.change_amount {
        Money::Native(v) => v,
        Money::Asset(_) => 0,
    };
    if amount == 0 {
        return Ok(Money::Native(0));
    }
    let script = group.change_scripts[ChangeType::Uncolored as usize]
        .clone()
        .ok_or(BuilderError::MissingChangeScript(ChangeType::Uncolored))?;
    ctx.transaction
        .add_output(TransactionOutput::new(amount as u64, script));
    Ok(Money::Native(amount))
}

/// Add the colored change output and record its quantity in the marker.
fn apply_colored_change(
    ctx: &mut BuildContext,
    group: &BuilderGroup,
    env: &mut IntentEnv<'_>,
) -> Result<Money, BuilderError> {
    let amount = match ctx.change_amount {
        Money::Asset(a) => a,
        Money::Native(_) => return Ok(Money::Native(0)),
    };
    if amount.quantity == 0 {
        return Ok(Money::Asset(amount));
    }
    let script = group.change_scripts[ChangeType::Colored as usize]
        .clone()
        .ok_or(BuilderError::MissingChangeScript(ChangeType::Colored))?;
    let index = ctx.add_colored_output(&script, env.colored_dust)?;
    ctx.marker_mut().set_quantity(index, amount.quantity)?;
    ctx.additional_fees += env.colored_dust;
    Ok(Money::Asset(amount))
}

/// Add a colored send output, recording its quantity (and, for exchange
/// sends, forcing op-code 0x01 and flagging the output).
fn apply_send_asset(
    ctx: &mut BuildContext,
    env: &mut IntentEnv<'_>,
    script: &Script,
    amount: AssetAmount,
    to_exchange: bool,
) -> Result<Money, BuilderError> {
    if to_exchange {
        if let Some(current) = ctx.marker_mut().op_code() {
            if current != OP_TRANSFER_TO_EXCHANGE {
                return Err(BuilderError::MarkerOpCodeConflict { current });
            }
        }
    }

    let index = ctx.add_colored_output(script, env.colored_dust)?;
    let marker = ctx.marker_mut();
    marker.set_quantity(index, amount.quantity)?;
    if to_exchange {
        marker.set_op_code(OP_TRANSFER_TO_EXCHANGE);
        marker.set_exchange_flag(index);
    }
    ctx.additional_fees += env.colored_dust;
    Ok(Money::Asset(amount))
}

/// Apply one leg of an exchange operation.
fn apply_exchange_leg(
    ctx: &mut BuildContext,
    env: &mut IntentEnv<'_>,
    script: &Script,
    amount: AssetAmount,
    reason: Option<&str>,
    digest: &[u8; 20],
) -> Result<Money, BuilderError> {
    if let Some(current) = ctx.marker_mut().op_code() {
        if current != OP_EXCHANGE_OPERATION {
            return Err(BuilderError::MarkerOpCodeConflict { current });
        }
    }

    let index = ctx.add_colored_output(script, env.colored_dust)?;
    let marker = ctx.marker_mut();
    marker.set_op_code(OP_EXCHANGE_OPERATION);
    marker.set_quantity(index, amount.quantity)?;
    marker.set_exchange_flag(index);
    marker.set_metadata(digest.to_vec());
    ctx.additional_fees += env.colored_dust;

    if let Some(reason) = reason {
        if let Some(repository) = env.repository.as_mut() {
            repository.add(reason);
        }
    }
    Ok(Money::Asset(amount))
}

/// Apply an issuance intent.
///
/// The first application locates the authorizing issuance coin, inserts its
/// input at index 0, and subtracts its bearer value from the accumulator;
/// every application inserts the issued output at index 0 and prepends its
/// quantity to the marker.
fn apply_issue(
    ctx: &mut BuildContext,
    group: &BuilderGroup,
    env: &mut IntentEnv<'_>,
    script: &Script,
    amount: AssetAmount,
) -> Result<Money, BuilderError> {
    if ctx.issuance_outpoint.is_none() {
        let coin = group
            .coins
            .iter()
            .find_map(|c| match c {
                Coin::Issuance(ic) if ic.asset_id() == amount.id => Some(ic),
                _ => None,
            })
            .ok_or(BuilderError::MissingIssuanceCoin(amount.id))?;

        let outpoint = coin.bearer.outpoint();
        ctx.transaction
            .inputs
            .insert(0, TransactionInput::new(outpoint));
        ctx.consume(outpoint);
        ctx.additional_fees -= coin.bearer.satoshis();
        if let Some(url) = &coin.definition_url {
            ctx.marker_mut().set_metadata_url(url);
        }
        ctx.issuance_outpoint = Some(outpoint);
    }

    ctx.ensure_marker_output()?;
    ctx.transaction
        .outputs
        .insert(0, TransactionOutput::new(env.colored_dust as u64, script.clone()));
    ctx.marker_mut().insert_quantity(0, amount.quantity)?;
    ctx.additional_fees += env.colored_dust;
    Ok(Money::Asset(amount))
}
