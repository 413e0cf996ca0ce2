//! Value objects for the order domain.

use serde::{Deserialize, Serialize};

/// Identifier of a catalog product.
///
/// The product catalog lives outside this engine; orders carry the
/// catalog's identifier as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Money amount represented in kobo to avoid floating point issues.
///
/// All marketplace amounts are naira (NGN); the kobo is the minor unit,
/// 100 kobo to the naira.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in kobo (e.g., 1000 = ₦10.00)
    kobo: i64,
}

impl Money {
    /// Creates a new Money amount from kobo.
    pub fn from_kobo(kobo: i64) -> Self {
        Self { kobo }
    }

    /// Creates a new Money amount from a naira value.
    ///
    /// The kobo portion is calculated as naira * 100.
    pub fn from_naira(naira: i64) -> Self {
        Self { kobo: naira * 100 }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { kobo: 0 }
    }

    /// Returns the amount in kobo.
    pub fn kobo(&self) -> i64 {
        self.kobo
    }

    /// Returns the naira portion (whole number).
    pub fn naira(&self) -> i64 {
        self.kobo / 100
    }

    /// Returns the kobo portion (remainder after naira).
    pub fn kobo_part(&self) -> i64 {
        self.kobo.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.kobo > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.kobo == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.kobo < 0
    }

    /// Adds another money amount.
    pub fn add(&self, other: Money) -> Money {
        Money {
            kobo: self.kobo + other.kobo,
        }
    }

    /// Subtracts another money amount.
    pub fn subtract(&self, other: Money) -> Money {
        Money {
            kobo: self.kobo - other.kobo,
        }
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            kobo: self.kobo * quantity as i64,
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.kobo < 0 {
            write!(f, "-₦{}.{:02}", self.naira().abs(), self.kobo_part())
        } else {
            write!(f, "₦{}.{:02}", self.naira(), self.kobo_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            kobo: self.kobo + rhs.kobo,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            kobo: self.kobo - rhs.kobo,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.kobo += rhs.kobo;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.kobo -= rhs.kobo;
    }
}

/// A shipping, delivery or pickup address with contact details.
///
/// Addresses are free-form: the marketplace never geocodes them, it
/// hands them to a delivery agent as written.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    /// Contact person at this address.
    pub full_name: String,

    /// Street line.
    pub street: String,

    /// City or town.
    pub city: String,

    /// State (Nigerian state, e.g. "Lagos").
    pub state: String,

    /// Contact phone number.
    pub phone: String,
}

impl Address {
    /// Creates a new address.
    pub fn new(
        full_name: impl Into<String>,
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            street: street.into(),
            city: city.into(),
            state: state.into(),
            phone: phone.into(),
        }
    }

    /// Placeholder used when a seller has no registered pickup address.
    ///
    /// The agent sees "contact seller" instead of an empty card.
    pub fn placeholder() -> Self {
        Self {
            full_name: "Seller".to_string(),
            street: "Pickup address not provided, contact seller".to_string(),
            city: String::new(),
            state: String::new(),
            phone: String::new(),
        }
    }

    /// Returns true if every field of the address is empty.
    pub fn is_empty(&self) -> bool {
        self.full_name.is_empty()
            && self.street.is_empty()
            && self.city.is_empty()
            && self.state.is_empty()
            && self.phone.is_empty()
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {} {} ({})",
            self.full_name, self.street, self.city, self.state, self.phone
        )
    }
}

/// The product line of an order.
///
/// Checkout places one product per order; quantity and unit price are
/// captured at placement so later catalog edits never change the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product identifier.
    pub product_id: ProductId,

    /// Human-readable product name.
    pub product_name: String,

    /// Quantity ordered.
    pub quantity: u32,

    /// Price per unit in kobo.
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the total price for this item (quantity * unit_price).
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}
