//! Script opcode constants.
//!
//! Only the opcodes used by the standard templates and the builder are
//! defined here; script evaluation itself is out of scope for this SDK.

/// Push an empty array onto the stack.
pub const OP_0: u8 = 0x00;
/// Alias of OP_0.
pub const OP_FALSE: u8 = 0x00;
/// Push the next 1 byte of data.
pub const OP_DATA_1: u8 = 0x01;
/// Push the next 20 bytes of data (the size of a Hash160).
pub const OP_DATA_20: u8 = 0x14;
/// Push the next 33 bytes of data (the size of a compressed public key).
pub const OP_DATA_33: u8 = 0x21;
/// Push the next 75 bytes of data (largest direct push).
pub const OP_DATA_75: u8 = 0x4b;
/// Push data with a 1-byte length prefix.
pub const OP_PUSHDATA1: u8 = 0x4c;
/// Push data with a 2-byte length prefix.
pub const OP_PUSHDATA2: u8 = 0x4d;
/// Push data with a 4-byte length prefix.
pub const OP_PUSHDATA4: u8 = 0x4e;
/// Push the number -1 onto the stack.
pub const OP_1NEGATE: u8 = 0x4f;
/// Push the number 1 onto the stack.
pub const OP_1: u8 = 0x51;
/// Alias of OP_1.
pub const OP_TRUE: u8 = 0x51;
/// Push the number 16 onto the stack.
pub const OP_16: u8 = 0x60;
/// Mark a transaction output as unspendable data carrier.
pub const OP_RETURN: u8 = 0x6a;
/// Duplicate the top stack item.
pub const OP_DUP: u8 = 0x76;
/// Check the top two items for equality.
pub const OP_EQUAL: u8 = 0x87;
/// OP_EQUAL followed by OP_VERIFY.
pub const OP_EQUALVERIFY: u8 = 0x88;
/// Hash the top item with RIPEMD160(SHA256(x)).
pub const OP_HASH160: u8 = 0xa9;
/// Verify an ECDSA signature.
pub const OP_CHECKSIG: u8 = 0xac;
/// Verify m-of-n ECDSA signatures.
pub const OP_CHECKMULTISIG: u8 = 0xae;

/// Check whether an opcode is a small integer push (OP_1 through OP_16).
///
/// # Arguments
/// * `op` - The opcode byte.
///
/// # Returns
/// `true` for OP_1..=OP_16.
pub fn is_small_int_op(op: u8) -> bool {
    (OP_1..=OP_16).contains(&op)
}

/// Decode a small integer push opcode to its numeric value.
///
/// # Arguments
/// * `op` - An opcode in OP_1..=OP_16.
///
/// # Returns
/// `Some(1..=16)` for small integer opcodes, `None` otherwise.
pub fn small_int_value(op: u8) -> Option<usize> {
    if is_small_int_op(op) {
        Some((op - OP_1 + 1) as usize)
    } else {
        None
    }
}

/// Encode a numeric value 1..=16 as a small integer push opcode.
///
/// # Arguments
/// * `n` - A value in 1..=16.
///
/// # Returns
/// `Some(opcode)` for values in range, `None` otherwise.
pub fn small_int_op(n: usize) -> Option<u8> {
    if (1..=16).contains(&n) {
        Some(OP_1 + (n as u8) - 1)
    } else {
        None
    }
}
