//! Temporary pricing changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DiscountId, DomainError, DomainResult, Entity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    FlatAmount,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::FlatAmount => "flat_amount",
        }
    }
}

impl core::str::FromStr for DiscountType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "flat_amount" => Ok(Self::FlatAmount),
            other => Err(DomainError::validation(format!(
                "invalid discount type '{other}': must be 'percentage' or 'flat_amount'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub name: String,
    pub discount_type: DiscountType,
    pub amount: f64,
    pub starts_on: DateTime<Utc>,
    pub expires_on: Option<DateTime<Utc>>,
    pub requires_code: bool,
    pub code: String,
    pub limited_use: bool,
    pub number_of_uses: i64,
    pub login_required: bool,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
    pub archived_on: Option<DateTime<Utc>>,
}

impl Entity for Discount {
    type Id = DiscountId;

    fn id(&self) -> DiscountId {
        self.id
    }

    fn is_archived(&self) -> bool {
        self.archived_on.is_some()
    }
}

/// Discount fields before the store assigns identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDiscount {
    pub name: String,
    pub discount_type: DiscountType,
    pub amount: f64,
    pub starts_on: DateTime<Utc>,
    pub expires_on: Option<DateTime<Utc>>,
    pub requires_code: bool,
    pub code: String,
    pub limited_use: bool,
    pub number_of_uses: i64,
    pub login_required: bool,
}

impl NewDiscount {
    pub fn validate(&self) -> DomainResult<()> {
        validate_terms(
            &self.name,
            self.discount_type,
            self.amount,
            self.starts_on,
            self.expires_on,
            self.requires_code,
            &self.code,
            self.number_of_uses,
        )
    }

    pub fn into_discount(self, id: DiscountId, created_on: DateTime<Utc>) -> Discount {
        Discount {
            id,
            name: self.name,
            discount_type: self.discount_type,
            amount: self.amount,
            starts_on: self.starts_on,
            expires_on: self.expires_on,
            requires_code: self.requires_code,
            code: self.code,
            limited_use: self.limited_use,
            number_of_uses: self.number_of_uses,
            login_required: self.login_required,
            created_on,
            updated_on: None,
            archived_on: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscountUpdate {
    pub name: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub amount: Option<f64>,
    pub starts_on: Option<DateTime<Utc>>,
    pub expires_on: Option<DateTime<Utc>>,
    pub requires_code: Option<bool>,
    pub code: Option<String>,
    pub limited_use: Option<bool>,
    pub number_of_uses: Option<i64>,
    pub login_required: Option<bool>,
}

impl DiscountUpdate {
    /// Apply present fields, then re-validate the merged discount.
    ///
    /// `discount` is only modified when the merged result is valid.
    pub fn apply_to(&self, discount: &mut Discount) -> DomainResult<()> {
        let mut merged = discount.clone();
        if let Some(v) = &self.name {
            merged.name = v.clone();
        }
        if let Some(v) = self.discount_type {
            merged.discount_type = v;
        }
        if let Some(v) = self.amount {
            merged.amount = v;
        }
        if let Some(v) = self.starts_on {
            merged.starts_on = v;
        }
        if let Some(v) = self.expires_on {
            merged.expires_on = Some(v);
        }
        if let Some(v) = self.requires_code {
            merged.requires_code = v;
        }
        if let Some(v) = &self.code {
            merged.code = v.clone();
        }
        if let Some(v) = self.limited_use {
            merged.limited_use = v;
        }
        if let Some(v) = self.number_of_uses {
            merged.number_of_uses = v;
        }
        if let Some(v) = self.login_required {
            merged.login_required = v;
        }

        validate_terms(
            &merged.name,
            merged.discount_type,
            merged.amount,
            merged.starts_on,
            merged.expires_on,
            merged.requires_code,
            &merged.code,
            merged.number_of_uses,
        )?;
        *discount = merged;
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn validate_terms(
    name: &str,
    discount_type: DiscountType,
    amount: f64,
    starts_on: DateTime<Utc>,
    expires_on: Option<DateTime<Utc>>,
    requires_code: bool,
    code: &str,
    number_of_uses: i64,
) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("discount name must not be empty"));
    }
    if amount.is_nan() || amount <= 0.0 {
        return Err(DomainError::validation("discount amount must be positive"));
    }
    if discount_type == DiscountType::Percentage && amount > 100.0 {
        return Err(DomainError::validation(
            "percentage discount amount must not exceed 100",
        ));
    }
    if let Some(expires_on) = expires_on {
        if expires_on <= starts_on {
            return Err(DomainError::validation(
                "discount must expire after it starts",
            ));
        }
    }
    if requires_code && code.trim().is_empty() {
        return Err(DomainError::validation(
            "a code is required when requires_code is set",
        ));
    }
    if number_of_uses < 0 {
        return Err(DomainError::validation("number_of_uses must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_discount() -> NewDiscount {
        NewDiscount {
            name: "Spring sale".to_string(),
            discount_type: DiscountType::Percentage,
            amount: 15.0,
            starts_on: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            expires_on: Some(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()),
            requires_code: false,
            code: String::new(),
            limited_use: false,
            number_of_uses: 0,
            login_required: false,
        }
    }

    #[test]
    fn valid_discount_passes() {
        test_discount().validate().unwrap();
    }

    #[test]
    fn percentage_over_hundred_is_rejected() {
        let mut d = test_discount();
        d.amount = 150.0;
        assert!(d.validate().is_err());

        d.discount_type = DiscountType::FlatAmount;
        d.validate().unwrap();
    }

    #[test]
    fn expiry_must_follow_start() {
        let mut d = test_discount();
        d.expires_on = Some(d.starts_on);
        match d.validate() {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("expire")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn code_required_when_flagged() {
        let mut d = test_discount();
        d.requires_code = true;
        assert!(d.validate().is_err());
        d.code = "SPRING".to_string();
        d.validate().unwrap();
    }

    #[test]
    fn update_is_all_or_nothing() {
        let created_on = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let mut discount = test_discount().into_discount(DiscountId::new(1), created_on);
        let before = discount.clone();

        let bad = DiscountUpdate {
            name: Some("Renamed".to_string()),
            amount: Some(-1.0),
            ..DiscountUpdate::default()
        };
        assert!(bad.apply_to(&mut discount).is_err());
        assert_eq!(discount, before);

        let good = DiscountUpdate {
            name: Some("Renamed".to_string()),
            ..DiscountUpdate::default()
        };
        good.apply_to(&mut discount).unwrap();
        assert_eq!(discount.name, "Renamed");
    }

    #[test]
    fn discount_type_round_trips_as_snake_case() {
        assert_eq!(
            serde_json::to_value(DiscountType::FlatAmount).unwrap(),
            serde_json::json!("flat_amount")
        );
        assert_eq!("percentage".parse::<DiscountType>().unwrap(), DiscountType::Percentage);
        assert!("bogus".parse::<DiscountType>().is_err());
    }
}
