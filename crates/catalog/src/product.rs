use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainResult, Entity, ProductId, ProductRootId};

use crate::option::ProductOptionValue;
use crate::sku::validate_sku;

/// Product and package dimensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalAttributes {
    #[serde(default)]
    pub product_weight: f64,
    #[serde(default)]
    pub product_height: f64,
    #[serde(default)]
    pub product_width: f64,
    #[serde(default)]
    pub product_length: f64,
    #[serde(default)]
    pub package_weight: f64,
    #[serde(default)]
    pub package_height: f64,
    #[serde(default)]
    pub package_width: f64,
    #[serde(default)]
    pub package_length: f64,
}

/// Fields shared by every variant of a product family.
///
/// This is the base template a creation request describes; each variant gets
/// its own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub name: String,
    pub subtitle: String,
    pub description: String,
    pub manufacturer: String,
    pub brand: String,
    pub upc: String,
    pub quantity: i32,
    pub taxable: bool,
    pub price: f64,
    pub on_sale: bool,
    pub sale_price: f64,
    pub cost: f64,
    #[serde(flatten)]
    pub physical: PhysicalAttributes,
    pub quantity_per_package: i32,
    pub available_on: DateTime<Utc>,
}

/// A concrete purchasable SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub product_root_id: ProductRootId,
    pub sku: String,
    pub option_summary: String,
    #[serde(flatten)]
    pub details: ProductDetails,
    #[serde(default)]
    pub applicable_options: Vec<ProductOptionValue>,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
    pub archived_on: Option<DateTime<Utc>>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }

    fn is_archived(&self) -> bool {
        self.archived_on.is_some()
    }
}

/// Partial update of a single variant. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductUpdate {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub brand: Option<String>,
    pub upc: Option<String>,
    pub quantity: Option<i32>,
    pub taxable: Option<bool>,
    pub price: Option<f64>,
    pub on_sale: Option<bool>,
    pub sale_price: Option<f64>,
    pub cost: Option<f64>,
    pub product_weight: Option<f64>,
    pub product_height: Option<f64>,
    pub product_width: Option<f64>,
    pub product_length: Option<f64>,
    pub package_weight: Option<f64>,
    pub package_height: Option<f64>,
    pub package_width: Option<f64>,
    pub package_length: Option<f64>,
    pub quantity_per_package: Option<i32>,
    pub available_on: Option<DateTime<Utc>>,
}

impl ProductUpdate {
    /// Validate the update without applying it.
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(sku) = &self.sku {
            validate_sku(sku)?;
        }
        Ok(())
    }

    /// Apply every present field to `product`.
    pub fn apply_to(&self, product: &mut Product) -> DomainResult<()> {
        self.validate()?;

        if let Some(sku) = &self.sku {
            product.sku = sku.clone();
        }

        let d = &mut product.details;
        if let Some(v) = &self.name {
            d.name = v.clone();
        }
        if let Some(v) = &self.subtitle {
            d.subtitle = v.clone();
        }
        if let Some(v) = &self.description {
            d.description = v.clone();
        }
        if let Some(v) = &self.manufacturer {
            d.manufacturer = v.clone();
        }
        if let Some(v) = &self.brand {
            d.brand = v.clone();
        }
        if let Some(v) = &self.upc {
            d.upc = v.clone();
        }
        if let Some(v) = self.quantity {
            d.quantity = v;
        }
        if let Some(v) = self.taxable {
            d.taxable = v;
        }
        if let Some(v) = self.price {
            d.price = v;
        }
        if let Some(v) = self.on_sale {
            d.on_sale = v;
        }
        if let Some(v) = self.sale_price {
            d.sale_price = v;
        }
        if let Some(v) = self.cost {
            d.cost = v;
        }
        if let Some(v) = self.quantity_per_package {
            d.quantity_per_package = v.max(1);
        }
        if let Some(v) = self.available_on {
            d.available_on = v;
        }

        let p = &mut d.physical;
        if let Some(v) = self.product_weight {
            p.product_weight = v;
        }
        if let Some(v) = self.product_height {
            p.product_height = v;
        }
        if let Some(v) = self.product_width {
            p.product_width = v;
        }
        if let Some(v) = self.product_length {
            p.product_length = v;
        }
        if let Some(v) = self.package_weight {
            p.package_weight = v;
        }
        if let Some(v) = self.package_height {
            p.package_height = v;
        }
        if let Some(v) = self.package_width {
            p.package_width = v;
        }
        if let Some(v) = self.package_length {
            p.package_length = v;
        }

        Ok(())
    }
}
