//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  items[]        │   │  username       │       │
//! │  │  price_cents    │   │  total_cents    │   │  password_hash  │       │
//! │  │  quantity       │   │  staff_id       │   │  role           │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │                                       │
//! │                        ┌────────▼────────┐   ┌─────────────────┐       │
//! │                        │    SaleItem     │   │   StoreStats    │       │
//! │                        │  (snapshot of   │   │  (aggregates)   │       │
//! │                        │   name/sku/     │   └─────────────────┘       │
//! │                        │   price)        │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every product has:
//! - `id`: UUID v4 - immutable, referenced by sale items
//! - `sku`: human-readable business key, editable
//!
//! ## Wire Format
//! JSON field names are camelCase. Amounts are held as integer cents in
//! Rust and in SQLite but travel as decimals:
//!
//! | Rust field                    | JSON              |
//! |-------------------------------|-------------------|
//! | `Product.price_cents`         | `price`           |
//! | `SaleItem.unit_price_cents`   | `price`           |
//! | `SaleItem.quantity`           | `qty`             |
//! | `SaleItem.line_total_cents`   | `lineTotal`       |
//! | `Sale.total_cents`            | `totalAmount`     |
//! | `SaleLineRequest.quantity`    | `qty`             |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::validation;
use crate::DEFAULT_CATEGORY;

// =============================================================================
// Role
// =============================================================================

/// Staff role. Admins may create other admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including registering admins.
    Admin,
    /// Day-to-day cashier access.
    #[default]
    Staff,
}

impl Role {
    /// Returns the wire/database name of the role.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".to_string(), "staff".to_string()],
            }),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Shelf category ("General" when not given).
    pub category: String,

    /// Price in cents (smallest currency unit).
    #[serde(rename = "price", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub price_cents: i64,

    /// Quantity on hand. Never negative.
    pub quantity: i64,

    /// Image reference, empty when none.
    pub image_url: String,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units can be taken from stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity <= self.quantity
    }
}

/// Product payload for create and update requests.
///
/// Every field is optional at the wire level; [`ProductInput::into_new_product`]
/// enforces the fields a new product needs, while updates only touch the
/// fields that are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub category: Option<String>,
    #[serde(default, rename = "price", with = "crate::money::decimal::option")]
    #[ts(type = "number | null")]
    pub price_cents: Option<i64>,
    pub quantity: Option<i64>,
    pub image_url: Option<String>,
}

impl ProductInput {
    /// Validates an update request and trims its string fields.
    ///
    /// Absent fields stay `None` and mean "unchanged".
    pub fn normalized_update(&self) -> CoreResult<ProductInput> {
        let trimmed = |value: &Option<String>| value.as_ref().map(|v| v.trim().to_string());
        let normalized = ProductInput {
            name: trimmed(&self.name),
            sku: trimmed(&self.sku),
            category: trimmed(&self.category),
            price_cents: self.price_cents,
            quantity: self.quantity,
            image_url: trimmed(&self.image_url),
        };

        if let Some(name) = &normalized.name {
            validation::validate_product_name(name)?;
        }
        if let Some(sku) = &normalized.sku {
            validation::validate_sku(sku)?;
        }
        if let Some(category) = &normalized.category {
            validation::validate_category(category)?;
        }
        if let Some(price_cents) = normalized.price_cents {
            validation::validate_price_cents(price_cents)?;
        }
        if let Some(quantity) = normalized.quantity {
            validation::validate_stock_quantity(quantity)?;
        }
        if let Some(image_url) = &normalized.image_url {
            validation::validate_image_url(image_url)?;
        }

        Ok(normalized)
    }

    /// Validates a create request and fills in defaults.
    ///
    /// ## Rules
    /// - `name`, `price` and `quantity` are required
    /// - `category` defaults to "General", `image_url` to empty
    /// - `sku` stays `None` when absent; the storage layer generates one
    pub fn into_new_product(self) -> CoreResult<NewProduct> {
        let name = validation::require("name", self.name)?;
        let price_cents = validation::require("price", self.price_cents)?;
        let quantity = validation::require("quantity", self.quantity)?;

        validation::validate_product_name(&name)?;
        validation::validate_price_cents(price_cents)?;
        validation::validate_stock_quantity(quantity)?;

        let sku = match self.sku.map(|s| s.trim().to_string()) {
            Some(sku) if !sku.is_empty() => {
                validation::validate_sku(&sku)?;
                Some(sku)
            }
            _ => None,
        };

        let category = match self.category.map(|c| c.trim().to_string()) {
            Some(category) if !category.is_empty() => {
                validation::validate_category(&category)?;
                category
            }
            _ => DEFAULT_CATEGORY.to_string(),
        };

        let image_url = self.image_url.unwrap_or_default().trim().to_string();
        validation::validate_image_url(&image_url)?;

        Ok(NewProduct {
            name: name.trim().to_string(),
            sku,
            category,
            price_cents,
            quantity,
            image_url,
        })
    }
}

/// A validated product that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub sku: Option<String>,
    pub category: String,
    pub price_cents: i64,
    pub quantity: i64,
    pub image_url: String,
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    /// Line items in request order.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<SaleItem>,
    /// Sum of line totals, in cents.
    #[serde(rename = "totalAmount", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total_cents: i64,
    /// User that rang up the sale.
    pub staff_id: String,
    /// Username at time of sale (frozen).
    pub staff_username: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Zero-based position within the sale.
    pub position: i64,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// SKU at time of sale (frozen).
    pub sku: String,
    /// Unit price in cents at time of sale (frozen).
    #[serde(rename = "price", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub unit_price_cents: i64,
    /// Quantity sold.
    #[serde(rename = "qty")]
    pub quantity: i64,
    /// unit_price × quantity.
    #[serde(rename = "lineTotal", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub line_total_cents: i64,
}

/// One requested line of a sale: `{ "productId": "...", "qty": 3 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    pub product_id: String,
    #[serde(rename = "qty")]
    pub quantity: i64,
}

/// Request body for creating a sale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRequest {
    #[serde(default)]
    pub items: Vec<SaleLineRequest>,
}

/// The staff member a sale is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffIdentity {
    pub user_id: String,
    pub username: String,
}

// =============================================================================
// User
// =============================================================================

/// A staff account.
///
/// Deliberately not `Serialize`: the password hash never leaves the server.
/// Use [`UserProfile`] for responses.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Store-wide aggregates for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// Number of products in the catalogue.
    pub total_products: i64,
    /// Σ quantity over all products.
    pub total_stock_units: i64,
    /// Σ quantity × price over all products.
    #[serde(rename = "totalStockValue", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total_stock_value_cents: i64,
    /// Σ sale totals.
    #[serde(rename = "totalEarnings", with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total_earnings_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
