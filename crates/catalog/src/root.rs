use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Entity, ProductRootId};

use crate::option::ProductOption;
use crate::product::{PhysicalAttributes, Product, ProductDetails};

/// Template/parent for a family of variants.
///
/// `options` and `products` are populated on reads that materialize the whole
/// family; listings leave them empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRoot {
    pub id: ProductRootId,
    pub sku_prefix: String,
    pub name: String,
    pub subtitle: String,
    pub description: String,
    pub manufacturer: String,
    pub brand: String,
    pub taxable: bool,
    pub cost: f64,
    #[serde(flatten)]
    pub physical: PhysicalAttributes,
    pub quantity_per_package: i32,
    pub available_on: DateTime<Utc>,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
    pub archived_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Entity for ProductRoot {
    type Id = ProductRootId;

    fn id(&self) -> ProductRootId {
        self.id
    }

    fn is_archived(&self) -> bool {
        self.archived_on.is_some()
    }
}

/// Root row as written by the store (identity and timestamps not yet assigned).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProductRoot {
    pub sku_prefix: String,
    pub name: String,
    pub subtitle: String,
    pub description: String,
    pub manufacturer: String,
    pub brand: String,
    pub taxable: bool,
    pub cost: f64,
    pub physical: PhysicalAttributes,
    pub quantity_per_package: i32,
    pub available_on: DateTime<Utc>,
}

impl NewProductRoot {
    /// Derive the root row from the family's shared fields.
    pub fn from_details(sku_prefix: impl Into<String>, details: &ProductDetails) -> Self {
        Self {
            sku_prefix: sku_prefix.into(),
            name: details.name.clone(),
            subtitle: details.subtitle.clone(),
            description: details.description.clone(),
            manufacturer: details.manufacturer.clone(),
            brand: details.brand.clone(),
            taxable: details.taxable,
            cost: details.cost,
            physical: details.physical.clone(),
            quantity_per_package: details.quantity_per_package,
            available_on: details.available_on,
        }
    }

    pub fn into_root(self, id: ProductRootId, created_on: DateTime<Utc>) -> ProductRoot {
        ProductRoot {
            id,
            sku_prefix: self.sku_prefix,
            name: self.name,
            subtitle: self.subtitle,
            description: self.description,
            manufacturer: self.manufacturer,
            brand: self.brand,
            taxable: self.taxable,
            cost: self.cost,
            physical: self.physical,
            quantity_per_package: self.quantity_per_package,
            available_on: self.available_on,
            created_on,
            updated_on: None,
            archived_on: None,
            options: Vec::new(),
            products: Vec::new(),
        }
    }
}
