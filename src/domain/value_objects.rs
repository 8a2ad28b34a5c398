//! Value objects shared across the catalog and order modules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SKU (Stock Keeping Unit) value object. Stored trimmed and uppercased.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() {
            return Err(SkuError::Empty);
        }
        if value.len() > 50 {
            return Err(SkuError::TooLong);
        }
        Ok(Self(value))
    }

    /// Random catalog SKU of the form `MW-XXXXXXXX`.
    pub fn generate() -> Self {
        Self(format!("MW-{:08}", rand::random::<u32>() % 100_000_000))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum SkuError {
    Empty,
    TooLong,
}

impl std::error::Error for SkuError {}
impl fmt::Display for SkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "SKU must not be empty"),
            Self::TooLong => write!(f, "SKU exceeds 50 characters"),
        }
    }
}

/// Human-readable order number, externally visible on invoices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn new(value: impl Into<String>) -> Result<Self, OrderNumberError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() {
            return Err(OrderNumberError::Empty);
        }
        Ok(Self(value))
    }

    pub fn generate() -> Self {
        Self(format!("ORD-{:08}", rand::random::<u32>() % 100_000_000))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum OrderNumberError {
    Empty,
}

impl std::error::Error for OrderNumberError {}
impl fmt::Display for OrderNumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order number must not be empty")
    }
}

/// URL slug derived from a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_normalizes() {
        let sku = Sku::new("  mw-scrub-001 ").unwrap();
        assert_eq!(sku.as_str(), "MW-SCRUB-001");
    }

    #[test]
    fn sku_rejects_empty() {
        assert!(Sku::new("   ").is_err());
    }

    #[test]
    fn generated_order_number_shape() {
        let n = OrderNumber::generate();
        assert!(n.as_str().starts_with("ORD-"));
        assert_eq!(n.as_str().len(), 12);
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Classic Fit Scrub Top (Navy)"), "classic-fit-scrub-top-navy");
        assert_eq!(slugify("  V-Neck  "), "v-neck");
    }
}
