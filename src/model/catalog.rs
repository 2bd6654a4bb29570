// src/model/catalog.rs

use crate::model::money::Money;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Drives the weather/season-sensitive parts of the demand model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    HotBeverage,
    ColdBeverage,
    Snack,
}

/// A product the machine can carry, as configured.
///
/// Dollar amounts here are converted to cents when the inventory is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProductSpec {
    #[validate(length(min = 1, max = 32))]
    pub sku: String,
    /// Wholesale price per unit, used as the starting cost basis.
    #[validate(custom(function = at_least_one_cent))]
    pub supplier_cost: f64,
    /// Reference shelf price; starting price and anchor for elasticity.
    #[validate(custom(function = at_least_one_cent))]
    pub typical_retail: f64,
    /// Percent change in demand per percent change in price (negative).
    #[validate(range(max = 0.0))]
    pub price_elasticity: f64,
    /// Units per day at the reference price before multipliers.
    #[validate(range(min = 0.0))]
    pub base_sales: f64,
    pub category: ProductCategory,
    /// Days a delivered lot keeps before it has to be thrown out.
    #[validate(range(min = 1))]
    pub shelf_life_days: u32,
}

impl ProductSpec {
    fn new(
        sku: &str,
        supplier_cost: f64,
        typical_retail: f64,
        price_elasticity: f64,
        base_sales: f64,
        category: ProductCategory,
        shelf_life_days: u32,
    ) -> Self {
        Self {
            sku: sku.to_string(),
            supplier_cost,
            typical_retail,
            price_elasticity,
            base_sales,
            category,
            shelf_life_days,
        }
    }
}

/// Dollar amounts are stored in whole cents, so anything that rounds to
/// nothing is as good as zero.
pub(crate) fn at_least_one_cent(dollars: f64) -> Result<(), ValidationError> {
    if Money::from_dollars(dollars).cents() >= 1 {
        Ok(())
    } else {
        Err(ValidationError::new("below_one_cent"))
    }
}

/// The four-product machine the benchmark ships with.
pub fn default_catalog() -> Vec<ProductSpec> {
    vec![
        ProductSpec::new("coffee", 1.50, 3.00, -1.8, 1.0, ProductCategory::HotBeverage, 7),
        ProductSpec::new("chocolate", 0.75, 2.00, -1.5, 1.2, ProductCategory::Snack, 90),
        ProductSpec::new("chips", 0.50, 1.50, -1.2, 1.5, ProductCategory::Snack, 60),
        ProductSpec::new("soda", 0.60, 2.50, -1.4, 1.3, ProductCategory::ColdBeverage, 180),
    ]
}
