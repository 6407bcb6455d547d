//! Pure pieces of the invoice numbering allocator: reset decision, date-token
//! substitution, and number formatting. The counter advance itself lives in
//! [`crate::services::Database::generate_invoice_number`].

use crate::models::{InvoiceSettings, ResetFrequency};
use chrono::{DateTime, Datelike, Utc};

/// Decide whether the counter must reset before allocating.
///
/// Comparisons are calendar-boundary crossings, not elapsed durations:
/// yearly compares the year, monthly the year then month, quarterly the year
/// then `floor(month0 / 3)` with a 0-indexed month (Jan = 0).
pub fn needs_reset(
    frequency: ResetFrequency,
    last_reset: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    match frequency {
        ResetFrequency::Never => false,
        ResetFrequency::Yearly => now.year() > last_reset.year(),
        ResetFrequency::Quarterly => {
            now.year() > last_reset.year()
                || (now.year() == last_reset.year()
                    && now.month0() / 3 > last_reset.month0() / 3)
        }
        ResetFrequency::Monthly => {
            now.year() > last_reset.year()
                || (now.year() == last_reset.year() && now.month0() > last_reset.month0())
        }
    }
}

/// Substitute `{YYYY}`, `{YY}`, `{MM}`, `{DD}` tokens in a prefix/suffix
/// template.
pub fn substitute_date_tokens(template: &str, date: DateTime<Utc>) -> String {
    template
        .replace("{YYYY}", &format!("{:04}", date.year()))
        .replace("{YY}", &format!("{:02}", date.year().rem_euclid(100)))
        .replace("{MM}", &format!("{:02}", date.month()))
        .replace("{DD}", &format!("{:02}", date.day()))
}

/// Left-pad the counter with `'0'` to the configured width. A number wider
/// than the configured width passes through untruncated.
pub fn pad_number(number: i64, digits: i32) -> String {
    let width = digits.max(1) as usize;
    format!("{:0width$}", number, width = width)
}

/// Format one allocated counter value into the final invoice number.
pub fn format_invoice_number(
    settings: &InvoiceSettings,
    number: i64,
    now: DateTime<Utc>,
) -> String {
    let prefix = substitute_date_tokens(&settings.number_prefix, now);
    let suffix = substitute_date_tokens(&settings.number_suffix, now);
    format!(
        "{}{}{}",
        prefix,
        pad_number(number, settings.number_digits),
        suffix
    )
}
