//! Fee rates and dust thresholds.

use tint_primitives::wire::VarInt;
use tint_script::Script;

/// Default minimum relay fee rate, in satoshis per kilobyte.
pub const DEFAULT_MIN_RELAY_FEE: i64 = 1000;

/// Default native value carried by colored outputs.
pub const DEFAULT_COLORED_DUST: i64 = 600;

/// A fee rate expressed in satoshis per 1000 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeRate {
    satoshis_per_kb: i64,
}

impl FeeRate {
    /// Create a fee rate from satoshis per kilobyte.
    ///
    /// # Arguments
    /// * `satoshis_per_kb` - The rate.
    ///
    /// # Returns
    /// A new `FeeRate`.
    pub fn per_kb(satoshis_per_kb: i64) -> Self {
        FeeRate { satoshis_per_kb }
    }

    /// Return the rate in satoshis per kilobyte.
    pub fn satoshis_per_kb(&self) -> i64 {
        self.satoshis_per_kb
    }

    /// Compute the fee for a transaction of the given size.
    ///
    /// # Arguments
    /// * `size_bytes` - The (estimated) serialized size.
    ///
    /// # Returns
    /// `size * rate / 1000`, rounded down.
    pub fn fee(&self, size_bytes: usize) -> i64 {
        (size_bytes as i64) * self.satoshis_per_kb / 1000
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        FeeRate::per_kb(DEFAULT_MIN_RELAY_FEE)
    }
}

/// Compute the dust threshold of an output paying to the given script.
///
/// An output is dust when spending it would cost more than a third of its
/// value at the relay rate: threshold = 3 x fee(output size + 148), where
/// 148 approximates the size of the input that spends it.
///
/// # Arguments
/// * `script` - The locking script of the prospective output.
/// * `relay_fee` - The minimum relay fee rate.
///
/// # Returns
/// The dust threshold in satoshis.
pub fn dust_threshold(script: &Script, relay_fee: &FeeRate) -> i64 {
    let output_size = 8 + VarInt::from(script.len()).length() + script.len();
    3 * relay_fee.fee(output_size + 148)
}

/// Compute the native dust threshold: the dust of a standard 25-byte P2PKH
/// output at the given relay rate (546 satoshis at 1000 sat/kB).
///
/// # Arguments
/// * `relay_fee` - The minimum relay fee rate.
///
/// # Returns
/// The native dust threshold in satoshis.
pub fn native_dust(relay_fee: &FeeRate) -> i64 {
    dust_threshold(&Script::from_bytes(&[0u8; 25]), relay_fee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_rounds_down() {
        let rate = FeeRate::per_kb(1000);
        assert_eq!(rate.fee(250), 250);
        assert_eq!(rate.fee(999), 999);

        let rate = FeeRate::per_kb(500);
        assert_eq!(rate.fee(100), 50);
        assert_eq!(rate.fee(3), 1);
    }

    /// The canonical 546-satoshi dust bound for P2PKH at the default rate.
    #[test]
    fn test_native_dust_default() {
        assert_eq!(native_dust(&FeeRate::default()), 546);
    }

    #[test]
    fn test_dust_scales_with_script_size() {
        let relay = FeeRate::default();
        let small = dust_threshold(&Script::from_bytes(&[0u8; 25]), &relay);
        let large = dust_threshold(&Script::from_bytes(&[0u8; 71]), &relay);
        assert!(large > small);
    }

    #[test]
    fn test_dust_zero_rate() {
        assert_eq!(native_dust(&FeeRate::per_kb(0)), 0);
    }
}
