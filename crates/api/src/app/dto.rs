use serde::Deserialize;

use storefront_core::ListQuery;

/// `?page=&limit=` on every listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        ListQuery::new(params.page, params.limit)
    }
}

#[derive(Debug, Deserialize)]
pub struct OptionValueRequest {
    pub value: String,
}
