//! Domain models for invoicing-core.

mod hsn_code;
mod invoice;
mod settings;
mod tax_profile;

pub use hsn_code::{CreateHsnCode, HsnCode};
pub use invoice::{GstTreatment, Invoice, InvoiceItem, TaxDetail};
pub use settings::{InvoiceSettings, ResetFrequency, UpdateInvoiceSettings};
pub use tax_profile::{AppliesTo, CreateTaxProfile, TaxProfile, UpdateTaxProfile};
