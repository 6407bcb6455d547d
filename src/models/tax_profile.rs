//! Reusable tax configuration model.

use crate::models::HsnCode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// What a tax profile applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliesTo {
    Products,
    Services,
    Both,
}

impl AppliesTo {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppliesTo::Products => "products",
            AppliesTo::Services => "services",
            AppliesTo::Both => "both",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "products" => AppliesTo::Products,
            "services" => AppliesTo::Services,
            _ => AppliesTo::Both,
        }
    }
}

/// Named tax configuration.
///
/// `id` is the row UUID rendered as text for persisted profiles, or a
/// `temp_`-prefixed marker for ephemeral profiles synthesized from an HSN
/// record or the hardcoded fallback. Ephemeral profiles are never persisted
/// and carry no `created_utc`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaxProfile {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub tax_type: String,
    pub tax_rate: Decimal,
    pub hsn_code: Option<String>,
    pub is_default: bool,
    pub applies_to: String,
    pub is_active: bool,
    pub created_utc: Option<DateTime<Utc>>,
}

impl TaxProfile {
    /// Hardcoded fallback when no persisted default exists: 18% GST on both
    /// products and services.
    pub fn temp_default() -> Self {
        Self {
            id: "temp_default".to_string(),
            name: "Default GST".to_string(),
            description: None,
            tax_type: "gst".to_string(),
            tax_rate: Decimal::from(18),
            hsn_code: None,
            is_default: true,
            applies_to: AppliesTo::Both.as_str().to_string(),
            is_active: true,
            created_utc: None,
        }
    }

    /// Synthesize an ephemeral profile from an HSN record that has no
    /// explicitly linked profile.
    pub fn from_hsn(hsn: &HsnCode) -> Self {
        let applies_to = if hsn.is_service {
            AppliesTo::Services
        } else {
            AppliesTo::Products
        };
        Self {
            id: format!("temp_{}", hsn.code),
            name: hsn
                .description
                .clone()
                .unwrap_or_else(|| format!("HSN {}", hsn.code)),
            description: hsn.description.clone(),
            tax_type: "gst".to_string(),
            tax_rate: hsn.gst_rate,
            hsn_code: Some(hsn.code.clone()),
            is_default: false,
            applies_to: applies_to.as_str().to_string(),
            is_active: true,
            created_utc: None,
        }
    }
}

/// Input for creating a tax profile.
#[derive(Debug, Clone)]
pub struct CreateTaxProfile {
    pub name: String,
    pub description: Option<String>,
    pub tax_type: String,
    pub tax_rate: Decimal,
    pub hsn_code: Option<String>,
    pub is_default: bool,
    pub applies_to: AppliesTo,
}

/// Input for updating a tax profile.
#[derive(Debug, Clone, Default)]
pub struct UpdateTaxProfile {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tax_type: Option<String>,
    pub tax_rate: Option<Decimal>,
    pub hsn_code: Option<String>,
    pub is_default: Option<bool>,
    pub applies_to: Option<AppliesTo>,
    pub is_active: Option<bool>,
}
