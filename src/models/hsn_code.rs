//! HSN/SAC classification model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Harmonized-system classification record with its GST rate.
///
/// `code` is a numeric string of 4 to 8 digits (shorter inputs are
/// zero-padded on the way in).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HsnCode {
    pub hsn_code_id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub gst_rate: Decimal,
    pub is_service: bool,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating an HSN code.
#[derive(Debug, Clone)]
pub struct CreateHsnCode {
    pub code: String,
    pub description: Option<String>,
    pub gst_rate: Decimal,
    pub is_service: bool,
}
