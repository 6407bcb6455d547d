//! Pure computation: numbering, tax math, and format validation.

pub mod numbering;
pub mod tax;
pub mod validation;
