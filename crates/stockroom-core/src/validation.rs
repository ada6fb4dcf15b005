//! # Validation Module
//!
//! Input validation utilities for Stockroom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum Json)                                   │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rule validation (required, ranges, formats)              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK on quantity and price_cents ranges                          │
//! │  └── UNIQUE (username)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_SKU_LEN: usize = 50;
const MAX_NAME_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 100;
const MAX_IMAGE_URL_LEN: usize = 2048;
const MAX_USERNAME_LEN: usize = 50;

/// Highest accepted unit price: 1,000,000.00.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Highest accepted stock level for one product.
///
/// Together with [`MAX_PRICE_CENTS`] a product's stock value stays below
/// 10^14 cents, so store-wide sums fit in `i64`.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000;

/// Unwraps a required field, reporting `{field} is required` when absent.
pub fn require<T>(field: &str, value: Option<T>) -> ValidationResult<T> {
    value.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ```rust
/// use stockroom_core::validation::validate_sku;
///
/// assert!(validate_sku("MILK-1L").is_ok());
/// assert!(validate_sku("").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    not_blank_within("name", name, MAX_NAME_LEN)
}

/// Validates a category: non-empty, at most 100 characters.
pub fn validate_category(category: &str) -> ValidationResult<()> {
    not_blank_within("category", category, MAX_CATEGORY_LEN)
}

/// Validates an image reference. Empty is allowed (no image).
pub fn validate_image_url(url: &str) -> ValidationResult<()> {
    if url.len() > MAX_IMAGE_URL_LEN {
        return Err(ValidationError::TooLong {
            field: "imageUrl".to_string(),
            max: MAX_IMAGE_URL_LEN,
        });
    }
    Ok(())
}

/// Validates a username: non-empty, at most 50 characters, no whitespace.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    not_blank_within("username", username, MAX_USERNAME_LEN)?;

    if username.trim().chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a password. Only emptiness is checked; strength policy is
/// left to the operator.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    Ok(())
}

fn not_blank_within(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity requested on a sale line.
///
/// ## User Workflow
/// ```text
/// Sale line: { product_id, quantity: 0 }
///       │
///       ▼
/// validate_sale_quantity(0) ← THIS FUNCTION
///       │
///       └── qty <= 0? → Error: "quantity must be > 0"
/// ```
pub fn validate_sale_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a stock level: 0 (sold out) up to [`MAX_STOCK_QUANTITY`].
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_STOCK_QUANTITY {
        return Err(ValidationError::TooLarge {
            field: "quantity".to_string(),
            max: MAX_STOCK_QUANTITY.to_string(),
        });
    }
    Ok(())
}

/// Validates a price in cents: 0 (free items) up to [`MAX_PRICE_CENTS`].
///
/// ```rust
/// use stockroom_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(10_000_000_000).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }
    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::TooLarge {
            field: "price".to_string(),
            max: Money::from_cents(MAX_PRICE_CENTS).to_decimal_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("MILK-1L").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("product_1").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Milk 1L").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("cashier1").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("two words").is_err());
        assert!(validate_username(&"u".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_sale_quantity() {
        assert!(validate_sale_quantity(1).is_ok());
        assert!(validate_sale_quantity(0).is_err());
        assert!(validate_sale_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_stock_and_price() {
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_upper_bounds() {
        assert!(validate_stock_quantity(MAX_STOCK_QUANTITY).is_ok());
        assert!(validate_price_cents(MAX_PRICE_CENTS).is_ok());

        let err = validate_stock_quantity(10_000_000_000).unwrap_err();
        assert_eq!(err.to_string(), "quantity must be at most 1000000");
        let err = validate_price_cents(10_000_000_000).unwrap_err();
        assert_eq!(err.to_string(), "price must be at most 1000000.00");

        // The largest product value fits many times over in i64.
        let max_value = MAX_PRICE_CENTS.checked_mul(MAX_STOCK_QUANTITY).unwrap();
        assert!(max_value.checked_mul(90_000).is_some());
    }

    #[test]
    fn test_require() {
        assert_eq!(require("name", Some(3)).unwrap(), 3);
        let err = require::<i64>("quantity", None).unwrap_err();
        assert_eq!(err.to_string(), "quantity is required");
    }
}
