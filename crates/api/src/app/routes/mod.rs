use axum::Router;

pub mod common;
pub mod discounts;
pub mod option_values;
pub mod options;
pub mod product_roots;
pub mod products;
pub mod system;
pub mod webhooks;

/// Router for every `/v1` endpoint.
pub fn router() -> Router {
    Router::new()
        .merge(product_roots::router())
        .merge(products::router())
        .merge(options::router())
        .merge(option_values::router())
        .merge(discounts::router())
        .merge(webhooks::router())
}
