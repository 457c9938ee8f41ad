//! Option axes and their values.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{
    DomainError, DomainResult, Entity, ProductOptionId, ProductOptionValueId, ProductRootId,
};

/// A named axis of variation (e.g. "Size"), owned by one root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: ProductOptionId,
    pub name: String,
    pub product_root_id: ProductRootId,
    /// Values in insertion order.
    #[serde(default)]
    pub values: Vec<ProductOptionValue>,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
    pub archived_on: Option<DateTime<Utc>>,
}

impl Entity for ProductOption {
    type Id = ProductOptionId;

    fn id(&self) -> ProductOptionId {
        self.id
    }

    fn is_archived(&self) -> bool {
        self.archived_on.is_some()
    }
}

/// One concrete value along an option axis (e.g. "small").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOptionValue {
    pub id: ProductOptionValueId,
    pub product_option_id: ProductOptionId,
    pub value: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
    pub archived_on: Option<DateTime<Utc>>,
}

impl Entity for ProductOptionValue {
    type Id = ProductOptionValueId;

    fn id(&self) -> ProductOptionValueId {
        self.id
    }

    fn is_archived(&self) -> bool {
        self.archived_on.is_some()
    }
}

/// Requested option: a name plus its ordered values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionInput {
    pub name: String,
    pub values: Vec<String>,
}

impl OptionInput {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Names must be non-empty; values must be non-empty and unique within the
    /// option, ignoring case.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("option name must not be empty"));
        }
        if self.values.is_empty() {
            return Err(DomainError::validation(format!(
                "option '{}' must have at least one value",
                self.name
            )));
        }
        // SKU suffixes lower-case each value, so uniqueness is case-insensitive.
        let mut seen: HashMap<String, &str> = HashMap::with_capacity(self.values.len());
        for value in &self.values {
            validate_option_value(value)?;
            if let Some(previous) = seen.insert(value.to_lowercase(), value.as_str()) {
                let msg = if previous == value {
                    format!("option '{}' contains duplicate value '{}'", self.name, value)
                } else {
                    format!(
                        "option '{}' contains values that map to the same sku: '{}' and '{}'",
                        self.name, previous, value
                    )
                };
                return Err(DomainError::validation(msg));
            }
        }
        Ok(())
    }
}

pub fn validate_option_value(value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation("option value must not be empty"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionUpdate {
    pub name: String,
}

impl OptionUpdate {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("option name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_option_passes() {
        OptionInput::new("Size", ["small", "medium", "large"])
            .validate()
            .unwrap();
    }

    #[test]
    fn empty_value_list_is_rejected() {
        let input = OptionInput::new("Size", Vec::<String>::new());
        match input.validate() {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("at least one value")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_values_are_rejected() {
        let input = OptionInput::new("Color", ["red", "blue", "red"]);
        match input.validate() {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("duplicate value 'red'")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn values_differing_only_in_case_are_rejected() {
        let input = OptionInput::new("Color", ["Red", "blue", "red"]);
        match input.validate() {
            Err(DomainError::Validation(msg)) => {
                assert!(msg.contains("map to the same sku"), "{msg}");
                assert!(msg.contains("'Red' and 'red'"), "{msg}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(OptionInput::new("  ", ["x"]).validate().is_err());
        assert!(OptionUpdate { name: String::new() }.validate().is_err());
    }
}
