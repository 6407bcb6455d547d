//! Tax computation engine tests for invoicing-core.

use invoicing_core::engine::tax::{apply_tax_profile_to_item, calculate_gst, gst_breakdown};
use invoicing_core::engine::validation::{
    format_hsn_sac_code, state_code_from_gstin, validate_gstin,
};
use invoicing_core::models::{Invoice, InvoiceItem, TaxProfile};
use rust_decimal::Decimal;

fn membership_item(price: i64, quantity: i64, gst_rate: i64) -> InvoiceItem {
    InvoiceItem {
        description: "Gold membership".to_string(),
        price: Decimal::from(price),
        quantity: Decimal::from(quantity),
        tax_type: None,
        gst_rate: Some(Decimal::from(gst_rate)),
        hsn_sac_code: Some("9997".to_string()),
        cgst: Decimal::ZERO,
        sgst: Decimal::ZERO,
        igst: Decimal::ZERO,
        tax_amount: Decimal::ZERO,
    }
}

fn draft_invoice(items: Vec<InvoiceItem>) -> Invoice {
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
fn intra_state_invoice_splits_gst_into_cgst_and_sgst() {
    let invoice = draft_invoice(vec![membership_item(1000, 2, 18)]);
    let out = calculate_gst(&invoice, "registered_business", "29", true);

    assert_eq!(out.items[0].cgst, Decimal::from(180));
    assert_eq!(out.items[0].sgst, Decimal::from(180));
    assert_eq!(out.items[0].igst, Decimal::ZERO);
    assert_eq!(
        out.items[0].tax_amount,
        out.items[0].cgst + out.items[0].sgst + out.items[0].igst
    );
    assert_eq!(out.amount, Decimal::from(2360));
    assert_eq!(out.place_of_supply.as_deref(), Some("29"));
}

#[test]
fn inter_state_invoice_charges_igst_with_identical_totals() {
    let invoice = draft_invoice(vec![membership_item(1000, 2, 18)]);
    let intra = calculate_gst(&invoice, "registered_business", "29", true);
    let inter = calculate_gst(&invoice, "registered_business", "27", false);

    assert_eq!(inter.items[0].igst, Decimal::from(360));
    assert_eq!(inter.items[0].cgst, Decimal::ZERO);
    assert_eq!(inter.items[0].sgst, Decimal::ZERO);
    assert_eq!(inter.tax_amount, intra.tax_amount);
    assert_eq!(inter.amount, intra.amount);
}

#[test]
fn zero_rated_treatments_clear_all_tax() {
    for treatment in ["overseas", "sez", "deemed_export"] {
        let invoice = draft_invoice(vec![membership_item(1000, 2, 18)]);
        let out = calculate_gst(&invoice, treatment, "96", false);

        assert_eq!(out.items[0].tax_amount, Decimal::ZERO);
        assert!(out.tax_details.is_empty());
        assert_eq!(out.amount, Decimal::from(2000));
    }
}

#[test]
fn multi_item_invoice_sums_item_taxes() {
    let invoice = draft_invoice(vec![
        membership_item(1000, 1, 18),
        membership_item(500, 2, 12),
    ]);
    let out = calculate_gst(&invoice, "consumer", "29", true);

    // 180 + 120
    assert_eq!(out.tax_amount, Decimal::from(300));
    assert_eq!(out.subtotal, Some(Decimal::from(2000)));
    assert_eq!(out.amount, Decimal::from(2300));
    assert_eq!(out.tax_details.len(), 4);

    let breakdown = gst_breakdown(&out);
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].amount + breakdown[1].amount, out.tax_amount);
}

#[test]
fn applying_default_profile_to_item_computes_igst() {
    let profile = TaxProfile::temp_default();
    let item = membership_item(2500, 1, 0);
    let out = apply_tax_profile_to_item(&item, &profile, false);

    assert_eq!(out.gst_rate, Some(Decimal::from(18)));
    assert_eq!(out.igst, Decimal::from(450));
    assert_eq!(out.tax_amount, Decimal::from(450));
    assert_eq!(out.tax_type.as_deref(), Some("gst"));
}

#[test]
fn temp_default_profile_matches_fallback_contract() {
    let profile = TaxProfile::temp_default();
    assert_eq!(profile.id, "temp_default");
    assert_eq!(profile.tax_rate, Decimal::from(18));
    assert!(profile.is_default);
    assert_eq!(profile.applies_to, "both");
    assert!(profile.created_utc.is_none());
}

#[test]
fn gstin_validation_accepts_valid_and_rejects_short() {
    assert!(validate_gstin("29ABCDE1234F1Z5"));
    assert!(!validate_gstin("29ABCDE1234F1Z"));
}

#[test]
fn hsn_formatting_pads_strips_and_never_truncates() {
    assert_eq!(format_hsn_sac_code("12"), "0012");
    assert_eq!(format_hsn_sac_code("hs12ab34"), "1234");
    assert_eq!(format_hsn_sac_code("123456"), "123456");
}

#[test]
fn state_code_comes_from_gstin_prefix() {
    assert_eq!(state_code_from_gstin("29ABCDE1234F1Z5"), "29");
    assert_eq!(state_code_from_gstin("9"), "");
}
