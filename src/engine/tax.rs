//! GST tax computation engine.
//!
//! Pure value-in/value-out: callers must use the returned invoice or item,
//! the inputs are never mutated in place.

use crate::models::{GstTreatment, Invoice, InvoiceItem, TaxDetail, TaxProfile};
use rust_decimal::Decimal;

/// Applied when an item carries no explicit rate.
pub fn default_gst_rate() -> Decimal {
    Decimal::from(18)
}

fn hundred() -> Decimal {
    Decimal::from(100)
}

/// Compute and stamp the GST breakdown for an invoice.
///
/// Registered businesses, unregistered businesses and consumers all get the
/// full per-item computation; overseas, SEZ and deemed-export supplies are
/// zero-rated. An unrecognized treatment string returns the invoice
/// unchanged.
pub fn calculate_gst(
    invoice: &Invoice,
    gst_treatment: &str,
    place_of_supply: &str,
    is_intra_state: bool,
) -> Invoice {
    let treatment = match GstTreatment::from_string(gst_treatment) {
        Some(t) => t,
        None => return invoice.clone(),
    };

    let mut out = invoice.clone();
    out.tax_type = Some("gst".to_string());
    out.gst_treatment = Some(treatment.as_str().to_string());
    out.place_of_supply = Some(place_of_supply.to_string());

    let subtotal = invoice
        .subtotal
        .unwrap_or_else(|| invoice.items.iter().map(|i| i.base_amount()).sum());
    out.subtotal = Some(subtotal);

    if treatment.is_zero_rated() {
        for item in &mut out.items {
            item.gst_rate = Some(Decimal::ZERO);
            item.cgst = Decimal::ZERO;
            item.sgst = Decimal::ZERO;
            item.igst = Decimal::ZERO;
            item.tax_amount = Decimal::ZERO;
        }
        out.tax_details.clear();
        out.tax_amount = Decimal::ZERO;
        out.amount = subtotal;
        return out;
    }

    let mut details = Vec::new();
    let mut total_tax = Decimal::ZERO;

    for item in &mut out.items {
        let base = item.base_amount();
        let rate = item.gst_rate.unwrap_or_else(default_gst_rate);

        if is_intra_state {
            let half_rate = rate / Decimal::from(2);
            let half_amount = base * half_rate / hundred();
            item.cgst = half_amount;
            item.sgst = half_amount;
            item.igst = Decimal::ZERO;
            details.push(TaxDetail {
                name: "CGST".to_string(),
                rate: half_rate,
                amount: half_amount,
            });
            details.push(TaxDetail {
                name: "SGST".to_string(),
                rate: half_rate,
                amount: half_amount,
            });
        } else {
            let igst_amount = base * rate / hundred();
            item.cgst = Decimal::ZERO;
            item.sgst = Decimal::ZERO;
            item.igst = igst_amount;
            details.push(TaxDetail {
                name: "IGST".to_string(),
                rate,
                amount: igst_amount,
            });
        }

        item.gst_rate = Some(rate);
        item.tax_amount = item.cgst + item.sgst + item.igst;
        total_tax += item.tax_amount;
    }

    out.tax_details = details;
    out.tax_amount = total_tax;
    out.amount = subtotal + total_tax;
    out
}

/// Stamp a tax profile onto a single item and recompute its split.
///
/// Only the `gst` tax type computes anything; other types zero out every tax
/// field.
pub fn apply_tax_profile_to_item(
    item: &InvoiceItem,
    profile: &TaxProfile,
    is_intra_state: bool,
) -> InvoiceItem {
    let mut out = item.clone();
    out.tax_type = Some(profile.tax_type.clone());
    out.hsn_sac_code = profile.hsn_code.clone();

    if profile.tax_type != "gst" {
        out.gst_rate = Some(Decimal::ZERO);
        out.cgst = Decimal::ZERO;
        out.sgst = Decimal::ZERO;
        out.igst = Decimal::ZERO;
        out.tax_amount = Decimal::ZERO;
        return out;
    }

    out.gst_rate = Some(profile.tax_rate);
    let base = out.base_amount();

    if is_intra_state {
        let half_amount = base * (profile.tax_rate / Decimal::from(2)) / hundred();
        out.cgst = half_amount;
        out.sgst = half_amount;
        out.igst = Decimal::ZERO;
    } else {
        out.cgst = Decimal::ZERO;
        out.sgst = Decimal::ZERO;
        out.igst = base * profile.tax_rate / hundred();
    }
    out.tax_amount = out.cgst + out.sgst + out.igst;
    out
}

/// Display-only aggregation: sum tax-detail amounts grouped by name, keeping
/// first-seen order. The per-item lines on the invoice stay unmerged.
pub fn gst_breakdown(invoice: &Invoice) -> Vec<TaxDetail> {
    let mut grouped: Vec<TaxDetail> = Vec::new();
    for detail in &invoice.tax_details {
        match grouped.iter_mut().find(|g| g.name == detail.name) {
            Some(existing) => existing.amount += detail.amount,
            None => grouped.push(detail.clone()),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, quantity: i64, gst_rate: Option<i64>) -> InvoiceItem {
        InvoiceItem {
            description: "Membership".to_string(),
            price: Decimal::from(price),
            quantity: Decimal::from(quantity),
            tax_type: None,
            gst_rate: gst_rate.map(Decimal::from),
            hsn_sac_code: None,
            cgst: Decimal::ZERO,
            sgst: Decimal::ZERO,
            igst: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
        }
    }

    fn draft(items: Vec<InvoiceItem>) -> Invoice {
        Invoice {
            subtotal: None,
            items,
            tax_type: None,
            gst_treatment: None,
            place_of_supply: None,
            tax_details: Vec::new(),
            tax_amount: Decimal::ZERO,
            amount: Decimal::ZERO,
        }
    }

    #[test]
    fn intra_state_splits_into_equal_halves() {
        let invoice = draft(vec![item(1000, 2, Some(18))]);
        let out = calculate_gst(&invoice, "registered_business", "29", true);

        let it = &out.items[0];
        assert_eq!(it.cgst, Decimal::from(180));
        assert_eq!(it.sgst, Decimal::from(180));
        assert_eq!(it.igst, Decimal::ZERO);
        assert_eq!(it.tax_amount, Decimal::from(360));
        assert_eq!(out.subtotal, Some(Decimal::from(2000)));
        assert_eq!(out.tax_amount, Decimal::from(360));
        assert_eq!(out.amount, Decimal::from(2360));
        assert_eq!(out.tax_details.len(), 2);
        assert_eq!(out.tax_details[0].name, "CGST");
        assert_eq!(out.tax_details[0].rate, Decimal::from(9));
        assert_eq!(out.tax_details[1].name, "SGST");
    }

    #[test]
    fn inter_state_charges_igst_only() {
        let invoice = draft(vec![item(1000, 2, Some(18))]);
        let out = calculate_gst(&invoice, "registered_business", "27", false);

        let it = &out.items[0];
        assert_eq!(it.igst, Decimal::from(360));
        assert_eq!(it.cgst, Decimal::ZERO);
        assert_eq!(it.sgst, Decimal::ZERO);
        assert_eq!(it.tax_amount, Decimal::from(360));
        // Split differs from intra-state, totals do not
        assert_eq!(out.amount, Decimal::from(2360));
        assert_eq!(out.tax_details.len(), 1);
        assert_eq!(out.tax_details[0].name, "IGST");
        assert_eq!(out.tax_details[0].rate, Decimal::from(18));
    }

    #[test]
    fn consumer_and_unregistered_match_registered() {
        let invoice = draft(vec![item(500, 1, Some(12))]);
        let registered = calculate_gst(&invoice, "registered_business", "29", true);
        for treatment in ["consumer", "unregistered_business"] {
            let out = calculate_gst(&invoice, treatment, "29", true);
            assert_eq!(out.tax_amount, registered.tax_amount);
            assert_eq!(out.amount, registered.amount);
        }
    }

    #[test]
    fn export_like_treatments_are_zero_rated() {
        for treatment in ["overseas", "sez", "deemed_export"] {
            let invoice = draft(vec![item(1000, 2, Some(18)), item(300, 1, Some(5))]);
            let out = calculate_gst(&invoice, treatment, "96", false);
            for it in &out.items {
                assert_eq!(it.cgst, Decimal::ZERO);
                assert_eq!(it.sgst, Decimal::ZERO);
                assert_eq!(it.igst, Decimal::ZERO);
                assert_eq!(it.tax_amount, Decimal::ZERO);
                assert_eq!(it.gst_rate, Some(Decimal::ZERO));
            }
            assert!(out.tax_details.is_empty());
            assert_eq!(out.tax_amount, Decimal::ZERO);
            assert_eq!(out.amount, Decimal::from(2300));
        }
    }

    #[test]
    fn unrecognized_treatment_returns_invoice_unchanged() {
        let invoice = draft(vec![item(1000, 1, Some(18))]);
        let out = calculate_gst(&invoice, "composition_scheme", "29", true);
        assert_eq!(out.tax_amount, Decimal::ZERO);
        assert_eq!(out.subtotal, None);
        assert!(out.tax_details.is_empty());
        assert!(out.gst_treatment.is_none());
    }

    #[test]
    fn missing_item_rate_defaults_to_eighteen() {
        let invoice = draft(vec![item(100, 1, None)]);
        let out = calculate_gst(&invoice, "registered_business", "29", false);
        assert_eq!(out.items[0].gst_rate, Some(Decimal::from(18)));
        assert_eq!(out.items[0].igst, Decimal::from(18));
    }

    #[test]
    fn preset_subtotal_is_not_rederived() {
        let mut invoice = draft(vec![item(100, 1, Some(18))]);
        invoice.subtotal = Some(Decimal::from(500));
        let out = calculate_gst(&invoice, "registered_business", "29", false);
        assert_eq!(out.subtotal, Some(Decimal::from(500)));
        assert_eq!(out.amount, Decimal::from(518));
    }

    #[test]
    fn empty_invoice_computes_zero_totals() {
        let out = calculate_gst(&draft(vec![]), "registered_business", "29", true);
        assert_eq!(out.subtotal, Some(Decimal::ZERO));
        assert_eq!(out.amount, Decimal::ZERO);
        assert!(out.tax_details.is_empty());
    }

    #[test]
    fn detail_lines_accumulate_per_item_in_order() {
        let invoice = draft(vec![item(100, 1, Some(18)), item(200, 1, Some(12))]);
        let out = calculate_gst(&invoice, "registered_business", "29", true);
        let names: Vec<&str> = out.tax_details.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["CGST", "SGST", "CGST", "SGST"]);
    }

    #[test]
    fn breakdown_groups_by_name_in_first_seen_order() {
        let invoice = draft(vec![item(100, 1, Some(18)), item(200, 1, Some(12))]);
        let out = calculate_gst(&invoice, "registered_business", "29", true);
        let breakdown = gst_breakdown(&out);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].name, "CGST");
        // 9 + 12 from the two items
        assert_eq!(breakdown[0].amount, Decimal::from(21));
        assert_eq!(breakdown[1].name, "SGST");
        assert_eq!(breakdown[1].amount, Decimal::from(21));
    }

    #[test]
    fn profile_stamps_rate_and_hsn_onto_item() {
        let mut profile = TaxProfile::temp_default();
        profile.tax_rate = Decimal::from(12);
        profile.hsn_code = Some("9983".to_string());

        let out = apply_tax_profile_to_item(&item(100, 2, None), &profile, true);
        assert_eq!(out.gst_rate, Some(Decimal::from(12)));
        assert_eq!(out.hsn_sac_code.as_deref(), Some("9983"));
        assert_eq!(out.cgst, Decimal::from(12));
        assert_eq!(out.sgst, Decimal::from(12));
        assert_eq!(out.tax_amount, Decimal::from(24));
    }

    #[test]
    fn non_gst_profile_zeroes_item_tax() {
        let mut profile = TaxProfile::temp_default();
        profile.tax_type = "vat".to_string();

        let mut taxed = item(100, 2, Some(18));
        taxed.cgst = Decimal::from(18);
        taxed.tax_amount = Decimal::from(18);

        let out = apply_tax_profile_to_item(&taxed, &profile, true);
        assert_eq!(out.gst_rate, Some(Decimal::ZERO));
        assert_eq!(out.cgst, Decimal::ZERO);
        assert_eq!(out.tax_amount, Decimal::ZERO);
    }
}
