//! Input to the product creation workflow.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult};

use crate::option::OptionInput;
use crate::product::{PhysicalAttributes, ProductDetails};
use crate::root::NewProductRoot;
use crate::sku::validate_sku;

/// A new product family: shared fields, SKU prefix, and option axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreationInput {
    /// SKU prefix of the root (and full SKU when there are no options).
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub upc: String,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub taxable: bool,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub sale_price: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(flatten)]
    pub physical: PhysicalAttributes,
    #[serde(default)]
    pub quantity_per_package: i32,
    #[serde(default)]
    pub available_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub options: Vec<OptionInput>,
}

/// Validated, normalized creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CreationPlan {
    pub sku_prefix: String,
    pub root: NewProductRoot,
    pub template: ProductDetails,
    pub options: Vec<OptionInput>,
}

impl ProductCreationInput {
    pub fn validate(&self) -> DomainResult<()> {
        validate_sku(&self.sku)?;
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name must not be empty"));
        }

        let mut names = HashSet::with_capacity(self.options.len());
        for option in &self.options {
            option.validate()?;
            if !names.insert(option.name.as_str()) {
                return Err(DomainError::validation(format!(
                    "duplicate option name '{}'",
                    option.name
                )));
            }
        }
        Ok(())
    }

    /// Validate and normalize. `now` fills a missing `available_on`.
    pub fn into_plan(self, now: DateTime<Utc>) -> DomainResult<CreationPlan> {
        self.validate()?;

        let template = ProductDetails {
            name: self.name,
            subtitle: self.subtitle,
            description: self.description,
            manufacturer: self.manufacturer,
            brand: self.brand,
            upc: self.upc,
            quantity: self.quantity,
            taxable: self.taxable,
            price: self.price,
            on_sale: self.on_sale,
            sale_price: self.sale_price,
            cost: self.cost,
            physical: self.physical,
            quantity_per_package: self.quantity_per_package.max(1),
            available_on: self.available_on.unwrap_or(now),
        };
        let root = NewProductRoot::from_details(self.sku.clone(), &template);

        Ok(CreationPlan {
            sku_prefix: self.sku,
            root,
            template,
            options: self.options,
        })
    }
}
