//! The color-marker codec.
//!
//! A color marker is the protocol overlay output carrying per-output asset
//! quantities, protocol version, op-code, and metadata. It is materialized
//! as a zero-value `OP_RETURN PUSH(payload)` output and located inside a
//! transaction by script-pattern match, never by remembered index.
//!
//! # Payload layout
//!
//! | Field      | Encoding                                    |
//! |------------|---------------------------------------------|
//! | tag        | u16 LE, one of the two known magics         |
//! | version    | u16 LE, 1 or 2                              |
//! | op_code    | u8, present iff version == 2                |
//! | n          | VarInt quantity count                       |
//! | quantities | n x LEB128, each <= 2^63-1                  |
//! | metadata   | VarInt-prefixed bytes                       |
//!
//! For version 2 / op-code 0x01 the first ceil(n/8) bytes of the encoded
//! metadata are the exchange-flags bitfield: bits are packed LSB-first
//! within each byte while the flag array is traversed in reverse quantity
//! order.

use tint_primitives::wire::{VarInt, WireReader, WireWriter};
use tint_script::template::null_data;
use tint_script::Script;
use tint_transaction::Transaction;

use crate::leb128::{read_leb128, write_leb128};
use crate::AssetError;

/// The primary marker magic ("OA" on the wire).
pub const MARKER_TAG: u16 = 0x414f;

/// The alternate marker magic used by exchange deployments ("BC" on the wire).
pub const EXCHANGE_MARKER_TAG: u16 = 0x4342;

/// Version-2 op-code: transfer to an exchange, with per-output flags.
pub const OP_TRANSFER_TO_EXCHANGE: u8 = 0x01;

/// Version-2 op-code: exchange operation, metadata carries a reason digest.
pub const OP_EXCHANGE_OPERATION: u8 = 0x02;

/// Upper bound on a single marker quantity (2^63 - 1).
pub const MAX_QUANTITY: u64 = (1 << 63) - 1;

/// A decoded or under-construction color marker.
///
/// Quantity index `i` corresponds to transaction output index `i`; the
/// marker output itself sits after the colored outputs it describes, so a
/// marker is only valid within a transaction when its quantity count is at
/// most the output count minus one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorMarker {
    tag: u16,
    version: u16,
    op_code: Option<u8>,
    quantities: Vec<u64>,
    metadata: Vec<u8>,
    exchange_flags: Vec<bool>,
}

impl ColorMarker {
    /// Create an empty version-1 marker with the primary tag.
    ///
    /// # Returns
    /// A marker with no quantities and empty metadata.
    pub fn new() -> Self {
        Self::with_tag(MARKER_TAG)
    }

    /// Create an empty version-1 marker with a specific tag.
    ///
    /// # Arguments
    /// * `tag` - The marker magic to use.
    ///
    /// # Returns
    /// A marker with no quantities and empty metadata.
    pub fn with_tag(tag: u16) -> Self {
        ColorMarker {
            tag,
            version: 1,
            op_code: None,
            quantities: Vec::new(),
            metadata: Vec::new(),
            exchange_flags: Vec::new(),
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// Return the marker magic.
    pub fn tag(&self) -> u16 {
        self.tag
    }

    /// Return the protocol version (1 or 2).
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Return the op-code, set only on version-2 markers.
    pub fn op_code(&self) -> Option<u8> {
        self.op_code
    }

    /// Return the ordered quantity list.
    pub fn quantities(&self) -> &[u64] {
        &self.quantities
    }

    /// Return the quantity at an index, zero when absent.
    ///
    /// # Arguments
    /// * `index` - The quantity index.
    pub fn quantity(&self, index: usize) -> u64 {
        self.quantities.get(index).copied().unwrap_or(0)
    }

    /// Return the metadata bytes (flag bitfield excluded).
    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    /// Return the exchange flags, parallel to the quantities.
    pub fn exchange_flags(&self) -> &[bool] {
        &self.exchange_flags
    }

    // -----------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------

    /// Set the quantity at an index, growing the list with zeros as needed.
    ///
    /// # Arguments
    /// * `index` - The quantity index.
    /// * `quantity` - The value, at most `MAX_QUANTITY`.
    ///
    /// # Returns
    /// `Ok(())`, or `QuantityOutOfRange` if the value exceeds the bound.
    pub fn set_quantity(&mut self, index: usize, quantity: u64) -> Result<(), AssetError> {
        if quantity > MAX_QUANTITY {
            return Err(AssetError::QuantityOutOfRange(quantity));
        }
        if index >= self.quantities.len() {
            self.quantities.resize(index + 1, 0);
            self.exchange_flags.resize(index + 1, false);
        }
        self.quantities[index] = quantity;
        Ok(())
    }

    /// Insert a quantity at an index, shifting later quantities and flags.
    ///
    /// Issuance uses this to prepend the issued quantity at index 0, in
    /// step with the issued output inserted at transaction index 0.
    ///
    /// # Arguments
    /// * `index` - The insertion index.
    /// * `quantity` - The value, at most `MAX_QUANTITY`.
    ///
    /// # Returns
    /// `Ok(())`, or `QuantityOutOfRange` if the value exceeds the bound.
    pub fn insert_quantity(&mut self, index: usize, quantity: u64) -> Result<(), AssetError> {
        if quantity > MAX_QUANTITY {
            return Err(AssetError::QuantityOutOfRange(quantity));
        }
        if index > self.quantities.len() {
            self.quantities.resize(index, 0);
            self.exchange_flags.resize(index, false);
        }
        self.quantities.insert(index, quantity);
        self.exchange_flags.insert(index, false);
        Ok(())
    }

    /// Set the exchange flag for a quantity index, growing as needed.
    ///
    /// # Arguments
    /// * `index` - The quantity index to flag.
    pub fn set_exchange_flag(&mut self, index: usize) {
        if index >= self.exchange_flags.len() {
            self.quantities.resize(index + 1, 0);
            self.exchange_flags.resize(index + 1, false);
        }
        self.exchange_flags[index] = true;
    }

    /// Replace the metadata bytes.
    ///
    /// # Arguments
    /// * `metadata` - The new metadata.
    pub fn set_metadata(&mut self, metadata: Vec<u8>) {
        self.metadata = metadata;
    }

    /// Set the metadata to an ASCII asset-definition pointer: `u=<url>`.
    ///
    /// # Arguments
    /// * `url` - The definition URL.
    pub fn set_metadata_url(&mut self, url: &str) {
        let mut metadata = Vec::with_capacity(2 + url.len());
        metadata.extend_from_slice(b"u=");
        metadata.extend_from_slice(url.as_bytes());
        self.metadata = metadata;
    }

    /// Raise the version to at least `version`.
    ///
    /// # Arguments
    /// * `version` - The minimum version required.
    pub fn require_version(&mut self, version: u16) {
        if self.version < version {
            self.version = version;
        }
    }

    /// Set the op-code, raising the version to 2.
    ///
    /// # Arguments
    /// * `op_code` - The op-code byte.
    pub fn set_op_code(&mut self, op_code: u8) {
        self.op_code = Some(op_code);
        self.require_version(2);
    }

    // -----------------------------------------------------------------
    // Codec
    // -----------------------------------------------------------------

    /// Encode the marker into its wire payload.
    ///
    /// # Returns
    /// The payload bytes carried by the null-data output.
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = WireWriter::with_capacity(16 + self.metadata.len());
        writer.write_u16_le(self.tag);
        writer.write_u16_le(self.version);
        if self.version == 2 {
            writer.write_u8(self.op_code.unwrap_or(0));
        }

        writer.write_varint(VarInt::from(self.quantities.len()));
        for &quantity in &self.quantities {
            write_leb128(&mut writer, quantity);
        }

        if self.version == 2 && self.op_code == Some(OP_TRANSFER_TO_EXCHANGE) {
            let mut payload = self.flag_bitfield();
            payload.extend_from_slice(&self.metadata);
            writer.write_varstring(&payload);
        } else {
            writer.write_varstring(&self.metadata);
        }

        writer.into_bytes()
    }

    /// Decode a marker from its wire payload.
    ///
    /// The payload must be fully consumed; trailing bytes are an error.
    ///
    /// # Arguments
    /// * `payload` - The bytes carried by the null-data output.
    ///
    /// # Returns
    /// `Ok(ColorMarker)`, or an `AssetError` describing the malformation.
    pub fn decode(payload: &[u8]) -> Result<Self, AssetError> {
        let mut reader = WireReader::new(payload);

        let tag = reader.read_u16_le()?;
        if tag != MARKER_TAG && tag != EXCHANGE_MARKER_TAG {
            return Err(AssetError::BadMagic(tag));
        }

        let version = reader.read_u16_le()?;
        if version != 1 && version != 2 {
            return Err(AssetError::BadVersion(version));
        }

        let op_code = if version == 2 {
            Some(reader.read_u8()?)
        } else {
            None
        };

        let count = reader.read_varint()?.value() as usize;
        let mut quantities = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let quantity = read_leb128(&mut reader)?;
            if quantity > MAX_QUANTITY {
                return Err(AssetError::QuantityOutOfRange(quantity));
            }
            quantities.push(quantity);
        }

        let mut metadata = reader.read_varstring()?.to_vec();

        let exchange_flags = if version == 2 && op_code == Some(OP_TRANSFER_TO_EXCHANGE) {
            let flag_len = count.div_ceil(8);
            if metadata.len() < flag_len {
                return Err(AssetError::ShortFlagField {
                    expected: flag_len,
                    got: metadata.len(),
                });
            }
            let flags = unpack_flags(&metadata[..flag_len], count);
            metadata.drain(..flag_len);
            flags
        } else {
            vec![false; count]
        };

        if reader.remaining() != 0 {
            return Err(AssetError::TrailingBytes(reader.remaining()));
        }

        Ok(ColorMarker {
            tag,
            version,
            op_code,
            quantities,
            metadata,
            exchange_flags,
        })
    }

    /// Materialize the marker as its null-data locking script.
    ///
    /// # Returns
    /// `OP_RETURN PUSH(encode())`.
    pub fn to_script(&self) -> Result<Script, AssetError> {
        Ok(null_data(&self.encode())?)
    }

    /// Try to parse a marker out of a locking script.
    ///
    /// The script must be exactly `OP_RETURN PUSH(payload)` with a payload
    /// that decodes as a marker.
    ///
    /// # Arguments
    /// * `script` - The candidate locking script.
    ///
    /// # Returns
    /// `Some(ColorMarker)` on a pattern and payload match, otherwise `None`.
    pub fn from_script(script: &Script) -> Option<ColorMarker> {
        if !script.is_null_data() {
            return None;
        }
        let chunks = script.chunks().ok()?;
        if chunks.len() != 2 {
            return None;
        }
        let payload = chunks[1].push_bytes()?;
        Self::decode(payload).ok()
    }

    /// Locate the marker within a transaction.
    ///
    /// Returns the first output whose script decodes as a marker valid for
    /// the transaction, i.e. whose quantity count is at most the output
    /// count minus one.
    ///
    /// # Arguments
    /// * `tx` - The transaction to scan.
    ///
    /// # Returns
    /// `Some((output_index, marker))` if a valid marker exists.
    pub fn from_transaction(tx: &Transaction) -> Option<(usize, ColorMarker)> {
        for (index, output) in tx.outputs.iter().enumerate() {
            if let Some(marker) = Self::from_script(&output.locking_script) {
                if marker.quantities.len() + 1 <= tx.outputs.len() {
                    return Some((index, marker));
                }
            }
        }
        None
    }

    /// Pack the exchange flags into their wire bitfield.
    ///
    /// Bits are LSB-first within each byte while the flag array is walked in
    /// reverse quantity order: the flag for quantity `i` lands at reversed
    /// position `n-1-i`, byte `p/8`, bit `p%8`.
    fn flag_bitfield(&self) -> Vec<u8> {
        let n = self.quantities.len();
        let mut bytes = vec![0u8; n.div_ceil(8)];
        for (i, &flag) in self.exchange_flags.iter().enumerate().take(n) {
            if flag {
                let p = n - 1 - i;
                bytes[p / 8] |= 1 << (p % 8);
            }
        }
        bytes
    }
}

impl Default for ColorMarker {
    fn default() -> Self {
        Self::new()
    }
}

/// Unpack an exchange-flags bitfield, inverse of `flag_bitfield`.
fn unpack_flags(bytes: &[u8], n: usize) -> Vec<bool> {
    let mut flags = vec![false; n];
    for (i, flag) in flags.iter_mut().enumerate() {
        let p = n - 1 - i;
        *flag = bytes[p / 8] & (1 << (p % 8)) != 0;
    }
    flags
}
