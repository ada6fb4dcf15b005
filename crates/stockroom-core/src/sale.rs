//! # Sale Planning
//!
//! Turns a sale request into a fully priced plan, or rejects it, without
//! touching storage.
//!
//! ## Validate-All-Then-Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items: [{A, 2}, {B, 1}, {A, 4}]          stock: A=5, B=3              │
//! │                                                                         │
//! │  line 0: A qty 2   running A = 2   ≤ 5  ✓                              │
//! │  line 1: B qty 1   running B = 1   ≤ 3  ✓                              │
//! │  line 2: A qty 4   running A = 6   > 5  ✗ InsufficientStock            │
//! │                                                                         │
//! │  Result: whole sale rejected, nothing deducted                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quantities for a product that appears on several lines are summed before
//! being compared with stock, so splitting a line never lets a sale take more
//! than is on hand.
//!
//! The storage layer runs [`plan_sale`] against the stock it reads inside the
//! sale transaction, then applies [`SalePlan::deductions`].

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, SaleLineRequest};
use crate::validation::validate_sale_quantity;

/// A priced line, ready to be stored as a sale item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    pub product_id: String,
    pub name: String,
    pub sku: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

/// Stock to take from one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deduction {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
}

/// Outcome of planning a sale that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePlan {
    /// Lines in request order.
    pub lines: Vec<PlannedLine>,
    /// Σ line totals.
    pub total: Money,
}

impl SalePlan {
    /// Stock deductions, one per distinct product, in first-seen order.
    pub fn deductions(&self) -> Vec<Deduction> {
        let mut deductions: Vec<Deduction> = Vec::new();
        for line in &self.lines {
            match deductions
                .iter_mut()
                .find(|d| d.product_id == line.product_id)
            {
                Some(existing) => existing.quantity += line.quantity,
                None => deductions.push(Deduction {
                    product_id: line.product_id.clone(),
                    name: line.name.clone(),
                    quantity: line.quantity,
                }),
            }
        }
        deductions
    }
}

/// Plans a sale against current stock.
///
/// ## Checks (in line order)
/// 1. At least one line
/// 2. Each product exists
/// 3. Each quantity > 0
/// 4. Running quantity per product ≤ stock on hand
///
/// Line totals are `unit price × quantity` from the product's current price;
/// the sale total is the sum of line totals. Both use checked arithmetic.
pub fn plan_sale(requests: &[SaleLineRequest], products: &[Product]) -> CoreResult<SalePlan> {
    if requests.is_empty() {
        return Err(CoreError::EmptySale);
    }

    let catalogue: HashMap<&str, &Product> =
        products.iter().map(|p| (p.id.as_str(), p)).collect();
    let mut requested: HashMap<&str, i64> = HashMap::new();

    let mut lines = Vec::with_capacity(requests.len());
    let mut total = Money::zero();

    for request in requests {
        let product = catalogue
            .get(request.product_id.as_str())
            .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

        validate_sale_quantity(request.quantity)?;

        let running = requested.entry(product.id.as_str()).or_insert(0);
        *running = running
            .checked_add(request.quantity)
            .ok_or_else(|| overflow(&product.name))?;

        if !product.can_sell(*running) {
            return Err(CoreError::InsufficientStock {
                product_id: product.id.clone(),
                name: product.name.clone(),
                available: product.quantity,
                requested: *running,
            });
        }

        let unit_price = product.price();
        let line_total = unit_price
            .checked_multiply_quantity(request.quantity)
            .ok_or_else(|| overflow(&product.name))?;
        total = total
            .checked_add(line_total)
            .ok_or_else(|| overflow("sale total"))?;

        lines.push(PlannedLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            unit_price,
            quantity: request.quantity,
            line_total,
        });
    }

    Ok(SalePlan { lines, total })
}

fn overflow(context: &str) -> CoreError {
    CoreError::AmountOverflow {
        context: context.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use chrono::Utc;

    fn product(id: &str, name: &str, price_cents: i64, quantity: i64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            sku: format!("SKU-{}", id.to_uppercase()),
            category: "General".to_string(),
            price_cents,
            quantity,
            image_url: String::new(),
            created_at: Utc::now(),
        }
    }

    fn line(product_id: &str, quantity: i64) -> SaleLineRequest {
        SaleLineRequest {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_single_line_sale() {
        let products = vec![product("a", "Apple", 250, 10)];
        let plan = plan_sale(&[line("a", 3)], &products).unwrap();

        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].unit_price.cents(), 250);
        assert_eq!(plan.lines[0].line_total.cents(), 750);
        assert_eq!(plan.total.cents(), 750);
        assert_eq!(plan.deductions()[0].quantity, 3);
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let products = vec![product("a", "Apple", 199, 10), product("b", "Bread", 349, 4)];
        let plan = plan_sale(&[line("a", 2), line("b", 3)], &products).unwrap();

        let sum = plan
            .lines
            .iter()
            .try_fold(Money::zero(), |acc, l| acc.checked_add(l.line_total))
            .unwrap();
        assert_eq!(plan.total, sum);
        assert_eq!(plan.total.cents(), 199 * 2 + 349 * 3);
    }

    #[test]
    fn test_empty_sale_rejected() {
        let products = vec![product("a", "Apple", 250, 10)];
        assert!(matches!(
            plan_sale(&[], &products),
            Err(CoreError::EmptySale)
        ));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let products = vec![product("a", "Apple", 250, 10)];

        for qty in [0, -2] {
            let err = plan_sale(&[line("a", qty)], &products).unwrap_err();
            assert!(matches!(
                err,
                CoreError::Validation(ValidationError::MustBePositive { .. })
            ));
        }
    }

    #[test]
    fn test_unknown_product_rejected() {
        let products = vec![product("a", "Apple", 250, 10)];
        let err = plan_sale(&[line("a", 1), line("zzz", 1)], &products).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(ref id) if id == "zzz"));
    }

    #[test]
    fn test_unknown_product_reported_before_quantity() {
        let products = vec![product("a", "Apple", 250, 10)];
        let err = plan_sale(&[line("ghost", 0)], &products).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(ref id) if id == "ghost"));
    }

    #[test]
    fn test_insufficient_stock_rejects_whole_sale() {
        let products = vec![product("a", "Apple", 250, 10), product("b", "Bread", 300, 1)];
        let err = plan_sale(&[line("a", 2), line("b", 5)], &products).unwrap_err();

        match err {
            CoreError::InsufficientStock {
                name,
                available,
                requested,
                ..
            } => {
                assert_eq!(name, "Bread");
                assert_eq!(available, 1);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_repeated_product_lines_are_accumulated() {
        let products = vec![product("a", "Apple", 100, 5)];

        // 3 + 3 exceeds 5 even though each line fits on its own.
        let err = plan_sale(&[line("a", 3), line("a", 3)], &products).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { requested: 6, .. }
        ));

        let plan = plan_sale(&[line("a", 2), line("a", 3)], &products).unwrap();
        assert_eq!(plan.lines.len(), 2);
        let deductions = plan.deductions();
        assert_eq!(deductions.len(), 1);
        assert_eq!(deductions[0].quantity, 5);
    }

    #[test]
    fn test_exact_stock_can_be_sold() {
        let products = vec![product("a", "Apple", 100, 4)];
        assert!(plan_sale(&[line("a", 4)], &products).is_ok());
    }

    #[test]
    fn test_overflow_is_reported() {
        let products = vec![product("a", "Gold", i64::MAX / 2, i64::MAX)];
        let err = plan_sale(&[line("a", 3)], &products).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
    }

    #[test]
    fn test_deductions_keep_first_seen_order() {
        let products = vec![product("a", "Apple", 100, 9), product("b", "Bread", 100, 9)];
        let plan = plan_sale(&[line("b", 1), line("a", 1), line("b", 2)], &products).unwrap();

        let ids: Vec<_> = plan
            .deductions()
            .into_iter()
            .map(|d| (d.product_id, d.quantity))
            .collect();
        assert_eq!(ids, vec![("b".to_string(), 3), ("a".to_string(), 1)]);
    }
}
