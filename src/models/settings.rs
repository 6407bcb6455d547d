//! Per-branch invoice settings model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Counter reset cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetFrequency {
    Never,
    Monthly,
    Quarterly,
    Yearly,
}

impl ResetFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetFrequency::Never => "never",
            ResetFrequency::Monthly => "monthly",
            ResetFrequency::Quarterly => "quarterly",
            ResetFrequency::Yearly => "yearly",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "monthly" => ResetFrequency::Monthly,
            "quarterly" => ResetFrequency::Quarterly,
            "yearly" => ResetFrequency::Yearly,
            _ => ResetFrequency::Never,
        }
    }
}

/// Invoice numbering and tax defaults for one branch.
///
/// `next_number` is the next value to allocate and stays >= 1; a periodic
/// reset sets it back to 1 and stamps `last_reset_date`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceSettings {
    pub branch_id: Uuid,
    pub number_prefix: String,
    pub number_suffix: String,
    pub next_number: i64,
    pub number_digits: i32,
    pub reset_frequency: String,
    pub last_reset_date: DateTime<Utc>,
    pub default_tax_enabled: bool,
    pub default_tax_type: String,
    pub default_tax_rate: Decimal,
    pub default_gst_treatment: String,
    pub default_place_of_supply: Option<String>,
    pub default_terms: Option<String>,
    pub default_notes: Option<String>,
    pub company_name: Option<String>,
    pub company_address: Option<String>,
    pub company_gst_number: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl InvoiceSettings {
    /// Settings created lazily on first access for a branch.
    pub fn defaults(branch_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            branch_id,
            number_prefix: "INV".to_string(),
            number_suffix: String::new(),
            next_number: 1,
            number_digits: 5,
            reset_frequency: ResetFrequency::Yearly.as_str().to_string(),
            last_reset_date: now,
            default_tax_enabled: true,
            default_tax_type: "gst".to_string(),
            default_tax_rate: Decimal::from(18),
            default_gst_treatment: "registered_business".to_string(),
            default_place_of_supply: None,
            default_terms: None,
            default_notes: None,
            company_name: None,
            company_address: None,
            company_gst_number: None,
            created_utc: now,
        }
    }
}

/// Input for partially updating invoice settings.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceSettings {
    pub number_prefix: Option<String>,
    pub number_suffix: Option<String>,
    pub number_digits: Option<i32>,
    pub reset_frequency: Option<ResetFrequency>,
    pub default_tax_enabled: Option<bool>,
    pub default_tax_type: Option<String>,
    pub default_tax_rate: Option<Decimal>,
    pub default_gst_treatment: Option<String>,
    pub default_place_of_supply: Option<String>,
    pub default_terms: Option<String>,
    pub default_notes: Option<String>,
    pub company_name: Option<String>,
    pub company_address: Option<String>,
    pub company_gst_number: Option<String>,
}
