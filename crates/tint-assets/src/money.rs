//! Money types: native satoshis, asset quantities, and mixed bags.

use std::fmt;

use crate::asset_id::AssetId;

/// A quantity of a specific asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetAmount {
    /// The asset being counted.
    pub id: AssetId,
    /// The unsigned number of asset units.
    pub quantity: u64,
}

impl AssetAmount {
    /// Create a new asset amount.
    ///
    /// # Arguments
    /// * `id` - The asset id.
    /// * `quantity` - The number of units.
    ///
    /// # Returns
    /// A new `AssetAmount`.
    pub fn new(id: AssetId, quantity: u64) -> Self {
        AssetAmount { id, quantity }
    }
}

impl fmt::Display for AssetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.quantity, self.id)
    }
}

/// A money value: either native currency or an asset quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Money {
    /// Native currency in satoshis. Signed, so change and fee arithmetic
    /// can go through negative intermediates.
    Native(i64),
    /// A quantity of a colored asset.
    Asset(AssetAmount),
}

impl Money {
    /// Check whether this value is zero.
    ///
    /// # Returns
    /// `true` for zero satoshis or a zero asset quantity.
    pub fn is_zero(&self) -> bool {
        match self {
            Money::Native(v) => *v == 0,
            Money::Asset(a) => a.quantity == 0,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Money::Native(v) => write!(f, "{} satoshis", v),
            Money::Asset(a) => write!(f, "{}", a),
        }
    }
}

impl From<i64> for Money {
    fn from(v: i64) -> Self {
        Money::Native(v)
    }
}

impl From<AssetAmount> for Money {
    fn from(a: AssetAmount) -> Self {
        Money::Asset(a)
    }
}

/// An ordered multiset of money values.
///
/// Sending a bag is equivalent to sending each component separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoneyBag(Vec<Money>);

impl MoneyBag {
    /// Create an empty bag.
    ///
    /// # Returns
    /// A `MoneyBag` with no components.
    pub fn new() -> Self {
        MoneyBag(Vec::new())
    }

    /// Append a component to the bag.
    ///
    /// # Arguments
    /// * `money` - The component to add.
    pub fn push(&mut self, money: Money) {
        self.0.push(money);
    }

    /// Iterate over the components in insertion order.
    ///
    /// # Returns
    /// An iterator over the contained `Money` values.
    pub fn iter(&self) -> impl Iterator<Item = &Money> {
        self.0.iter()
    }

    /// Return the number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Money>> for MoneyBag {
    fn from(components: Vec<Money>) -> Self {
        MoneyBag(components)
    }
}

impl IntoIterator for MoneyBag {
    type Item = Money;
    type IntoIter = std::vec::IntoIter<Money>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
