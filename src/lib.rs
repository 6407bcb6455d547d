//! invoicing-core: invoice numbering and GST tax computation for
//! multi-tenant billing.
//!
//! Two cooperating units:
//!
//! - the **invoice numbering allocator** ([`services::Database::generate_invoice_number`]
//!   plus the pure helpers in [`engine::numbering`]), which advances a
//!   per-branch counter atomically, resets it on calendar boundaries, and
//!   formats the result through prefix/suffix date templates;
//! - the **tax computation engine** ([`engine::tax`]), which stamps a
//!   deterministic CGST/SGST/IGST breakdown onto an invoice according to its
//!   GST treatment and place of supply.
//!
//! Storage is PostgreSQL via sqlx; callers that still expect the legacy
//! dual snake_case/camelCase wire shape go through [`legacy`].

pub mod config;
pub mod engine;
pub mod error;
pub mod legacy;
pub mod models;
pub mod observability;
pub mod services;

pub use error::AppError;
