//! Product catalog domain: product families, option axes, variants, discounts.
//!
//! Variant generation lives in two pure steps:
//! - [`combination`]: Cartesian product of a root's option values
//! - [`variant`]: per-combination value copy of the base template
//!
//! Persistence and the transactional workflow around them live in `storefront-infra`.

pub mod combination;
pub mod creation;
pub mod discount;
pub mod option;
pub mod product;
pub mod root;
pub mod sku;
pub mod variant;

pub use combination::{combination_count, combinations, Combination, Combinations, Selection};
pub use creation::{CreationPlan, ProductCreationInput};
pub use discount::{Discount, DiscountType, DiscountUpdate, NewDiscount};
pub use option::{
    validate_option_value, OptionInput, OptionUpdate, ProductOption, ProductOptionValue,
};
pub use product::{PhysicalAttributes, Product, ProductDetails, ProductUpdate};
pub use root::{NewProductRoot, ProductRoot};
pub use sku::{is_valid_sku, validate_sku};
pub use variant::{materialize_base_variant, materialize_variant, NewProduct};
