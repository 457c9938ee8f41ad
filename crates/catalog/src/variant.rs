//! Variant materialization: turning a base template plus one combination into
//! an independent product record ready for insertion.
//!
//! Both the single-variant family (no options) and the per-combination path go
//! through [`instantiate`], so shared fields (pricing, dimensions, stock) are
//! copied the same way regardless of how many options a family has.

use chrono::{DateTime, Utc};

use storefront_core::{ProductId, ProductOptionValueId, ProductRootId};

use crate::combination::Combination;
use crate::option::ProductOptionValue;
use crate::product::{Product, ProductDetails};
use crate::sku::SKU_SEPARATOR;

/// A variant about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub product_root_id: ProductRootId,
    pub sku: String,
    pub option_summary: String,
    pub details: ProductDetails,
    pub applicable_options: Vec<ProductOptionValue>,
}

impl NewProduct {
    /// Values to link through the variant bridge, one per option.
    pub fn option_value_ids(&self) -> Vec<ProductOptionValueId> {
        self.applicable_options.iter().map(|v| v.id).collect()
    }

    pub fn into_product(
        self,
        id: ProductId,
        available_on: DateTime<Utc>,
        created_on: DateTime<Utc>,
    ) -> Product {
        let mut details = self.details;
        details.available_on = available_on;
        Product {
            id,
            product_root_id: self.product_root_id,
            sku: self.sku,
            option_summary: self.option_summary,
            details,
            applicable_options: self.applicable_options,
            created_on,
            updated_on: None,
            archived_on: None,
        }
    }
}

fn instantiate(
    template: &ProductDetails,
    product_root_id: ProductRootId,
    sku: String,
    option_summary: String,
    applicable_options: Vec<ProductOptionValue>,
) -> NewProduct {
    NewProduct {
        product_root_id,
        sku,
        option_summary,
        details: template.clone(),
        applicable_options,
    }
}

/// The only variant of a family without options: SKU is the bare prefix.
pub fn materialize_base_variant(
    template: &ProductDetails,
    product_root_id: ProductRootId,
    sku_prefix: &str,
) -> NewProduct {
    instantiate(
        template,
        product_root_id,
        sku_prefix.to_string(),
        String::new(),
        Vec::new(),
    )
}

/// Variant for one combination: `<prefix>_<suffix>`, combination summary, its values.
pub fn materialize_variant(
    template: &ProductDetails,
    product_root_id: ProductRootId,
    sku_prefix: &str,
    combination: &Combination<'_>,
) -> NewProduct {
    let sku = format!("{sku_prefix}{SKU_SEPARATOR}{}", combination.sku_suffix());
    instantiate(
        template,
        product_root_id,
        sku,
        combination.summary(),
        combination.values(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combination::combinations;
    use crate::combination::tests::test_options;
    use crate::product::PhysicalAttributes;
    use chrono::TimeZone;

    fn test_template() -> ProductDetails {
        ProductDetails {
            name: "T-Shirt".to_string(),
            subtitle: "soft".to_string(),
            description: "a shirt".to_string(),
            manufacturer: "Acme".to_string(),
            brand: "Acme".to_string(),
            upc: "012345".to_string(),
            quantity: 100,
            taxable: true,
            price: 19.99,
            on_sale: true,
            sale_price: 14.99,
            cost: 5.25,
            physical: PhysicalAttributes {
                product_weight: 0.2,
                product_height: 1.0,
                product_width: 20.0,
                product_length: 30.0,
                package_weight: 0.3,
                package_height: 2.0,
                package_width: 22.0,
                package_length: 32.0,
            },
            quantity_per_package: 1,
            available_on: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn variant_sku_joins_prefix_and_suffix() {
        let options = test_options(&[
            ("Size", &["small", "medium", "large"]),
            ("Color", &["red", "green", "blue"]),
        ]);
        let first = combinations(&options).next().unwrap();
        let variant = materialize_variant(&test_template(), ProductRootId::new(9), "t-shirt", &first);

        assert_eq!(variant.sku, "t-shirt_small_red");
        assert_eq!(variant.option_summary, "Size: small, Color: red");
        assert_eq!(variant.product_root_id, ProductRootId::new(9));
        assert_eq!(variant.applicable_options.len(), 2);
        assert_eq!(variant.option_value_ids(), first.option_value_ids());
    }

    #[test]
    fn base_variant_has_bare_prefix_and_no_links() {
        let variant = materialize_base_variant(&test_template(), ProductRootId::new(3), "mug");

        assert_eq!(variant.sku, "mug");
        assert_eq!(variant.option_summary, "");
        assert!(variant.applicable_options.is_empty());
        assert_eq!(variant.details, test_template());
    }

    #[test]
    fn both_paths_copy_identical_shared_fields() {
        let template = test_template();
        let options = test_options(&[("Size", &["s", "m"])]);
        let base = materialize_base_variant(&template, ProductRootId::new(1), "cap");

        for combination in combinations(&options) {
            let variant = materialize_variant(&template, ProductRootId::new(1), "cap", &combination);
            assert_eq!(variant.details, base.details);
        }
    }

    #[test]
    fn variants_do_not_share_state() {
        let template = test_template();
        let options = test_options(&[("Size", &["s", "m"])]);
        let mut variants: Vec<_> = combinations(&options)
            .map(|c| materialize_variant(&template, ProductRootId::new(1), "cap", &c))
            .collect();

        variants[0].details.price = 1.0;
        assert_eq!(variants[1].details.price, 19.99);
        assert_eq!(template.price, 19.99);
    }

    #[test]
    fn into_product_uses_store_timestamps() {
        let variant = materialize_base_variant(&test_template(), ProductRootId::new(3), "mug");
        let available_on = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let created_on = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let product = variant.into_product(ProductId::new(5), available_on, created_on);

        assert_eq!(product.id, ProductId::new(5));
        assert_eq!(product.details.available_on, available_on);
        assert_eq!(product.created_on, created_on);
        assert!(product.archived_on.is_none());
    }
}
