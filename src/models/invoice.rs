//! Invoice value types consumed by the tax computation engine.
//!
//! Invoices themselves are persisted by the caller; these are the in-memory
//! shapes the engine reads and stamps tax fields onto.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// GST treatment classification of the invoiced party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GstTreatment {
    RegisteredBusiness,
    UnregisteredBusiness,
    Consumer,
    Overseas,
    Sez,
    DeemedExport,
}

impl GstTreatment {
    pub fn as_str(&self) -> &'static str {
        match self {
            GstTreatment::RegisteredBusiness => "registered_business",
            GstTreatment::UnregisteredBusiness => "unregistered_business",
            GstTreatment::Consumer => "consumer",
            GstTreatment::Overseas => "overseas",
            GstTreatment::Sez => "sez",
            GstTreatment::DeemedExport => "deemed_export",
        }
    }

    /// Parse a stored treatment string. Unrecognized values yield `None`;
    /// callers persist free-form strings, so this must not default.
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "registered_business" => Some(GstTreatment::RegisteredBusiness),
            "unregistered_business" => Some(GstTreatment::UnregisteredBusiness),
            "consumer" => Some(GstTreatment::Consumer),
            "overseas" => Some(GstTreatment::Overseas),
            "sez" => Some(GstTreatment::Sez),
            "deemed_export" => Some(GstTreatment::DeemedExport),
            _ => None,
        }
    }

    /// Export-like treatments carry no GST at all.
    pub fn is_zero_rated(&self) -> bool {
        matches!(
            self,
            GstTreatment::Overseas | GstTreatment::Sez | GstTreatment::DeemedExport
        )
    }
}

/// One named tax line (CGST/SGST/IGST) with its rate and amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxDetail {
    pub name: String,
    pub rate: Decimal,
    pub amount: Decimal,
}

/// Line item on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub description: String,
    pub price: Decimal,
    pub quantity: Decimal,
    #[serde(default)]
    pub tax_type: Option<String>,
    #[serde(default)]
    pub gst_rate: Option<Decimal>,
    #[serde(default)]
    pub hsn_sac_code: Option<String>,
    #[serde(default)]
    pub cgst: Decimal,
    #[serde(default)]
    pub sgst: Decimal,
    #[serde(default)]
    pub igst: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
}

impl InvoiceItem {
    /// Taxable base for this line.
    pub fn base_amount(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// Invoice value with computed totals.
///
/// `subtotal` is `None` on a fresh draft; the engine derives it from the
/// items and always returns it populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(default)]
    pub subtotal: Option<Decimal>,
    #[serde(default)]
    pub items: Vec<InvoiceItem>,
    #[serde(default)]
    pub tax_type: Option<String>,
    #[serde(default)]
    pub gst_treatment: Option<String>,
    #[serde(default)]
    pub place_of_supply: Option<String>,
    #[serde(default)]
    pub tax_details: Vec<TaxDetail>,
    #[serde(default)]
    pub tax_amount: Decimal,
    #[serde(default)]
    pub amount: Decimal,
}
