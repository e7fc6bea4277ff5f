mod common;

use std::collections::HashSet;

use billsync_core::config::BillMatchingSettings;
use billsync_core::core::services::{MatchingService, PaymentService, ReconciliationService};
use billsync_core::ledger::{
    generate_occurrences, BillDefinition, Frequency, LedgerEntry, MonthWindow, Transaction,
};
use common::{bill, date, txn};

fn february() -> MonthWindow {
    MonthWindow::new(2024, 2).unwrap()
}

fn household() -> Vec<LedgerEntry> {
    vec![
        BillDefinition::new("Netflix", 15.49, date(2024, 1, 5), Frequency::Monthly)
            .with_id("netflix")
            .into(),
        BillDefinition::new("Electric", 80.0, date(2023, 12, 12), Frequency::Monthly)
            .with_id("electric")
            .into(),
        BillDefinition::new("Car Insurance", 240.0, date(2023, 11, 28), Frequency::Quarterly)
            .with_id("insurance")
            .into(),
        Transaction::new(date(2024, 1, 5), "NETFLIX.COM", -15.49)
            .with_id("jan-netflix")
            .into(),
        Transaction::new(date(2024, 2, 6), "NETFLIX.COM", -15.49)
            .with_id("feb-netflix")
            .into(),
        Transaction::new(date(2024, 2, 13), "CITY ELECTRIC", -79.40)
            .with_id("feb-electric")
            .into(),
        Transaction::new(date(2024, 2, 14), "ELECTRIC AUTOPAY", -80.00)
            .with_id("feb-electric-dup")
            .into(),
        Transaction::new(date(2024, 2, 27), "CAR INSURANCE CO", -240.0)
            .with_id("feb-insurance")
            .into(),
        Transaction::new(date(2024, 2, 1), "Payroll", 3200.0)
            .with_id("salary")
            .into(),
    ]
}

#[test]
fn netflix_scenario_links_february_occurrence() {
    let entries: Vec<LedgerEntry> = vec![
        BillDefinition::new("Netflix", 15.49, date(2024, 1, 5), Frequency::Monthly)
            .with_id("netflix")
            .into(),
        Transaction::new(date(2024, 2, 6), "NETFLIX.COM", -15.49)
            .with_id("t1")
            .into(),
    ];
    let settings = BillMatchingSettings {
        amount_tolerance: 1.0,
        date_window_days: 7,
        minimum_score: 60,
        require_description_match: true,
        require_amount_match: true,
        require_date_window: true,
    };

    let occurrences = generate_occurrences(&entries, february());
    let found = MatchingService::find_best_match(txn(&entries, "t1"), &occurrences, &settings);
    assert!(found.match_score >= 80);
    assert_eq!(found.match_score, 40 + 30 + 10 + 27);

    let reconciled = ReconciliationService::reconcile(&entries, february(), &settings);
    assert_eq!(txn(&reconciled, "t1").matched_to_bill_id.as_deref(), Some("netflix"));
    assert!(txn(&reconciled, "t1").hidden_as_bill_payment);

    let payments = &bill(&reconciled, "netflix").bill.payments;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].occurrence_date, date(2024, 2, 5));
    assert_eq!(payments[0].transaction_date, date(2024, 2, 6));
    assert_eq!(payments[0].transaction_amount, -15.49);
    assert_eq!(payments[0].transaction_description, "NETFLIX.COM");
    assert!(!payments[0].manually_marked);
}

#[test]
fn reconcile_is_idempotent() {
    let settings = BillMatchingSettings::default();
    let once = ReconciliationService::reconcile(&household(), february(), &settings);
    let twice = ReconciliationService::reconcile(&once, february(), &settings);
    assert_eq!(once, twice);
}

#[test]
fn reconcile_covers_every_transaction_month() {
    let settings = BillMatchingSettings::default();
    let reconciled = ReconciliationService::reconcile(&household(), february(), &settings);
    assert_eq!(
        txn(&reconciled, "jan-netflix").matched_to_bill_id.as_deref(),
        Some("netflix")
    );
    let dates: Vec<_> = bill(&reconciled, "netflix")
        .bill
        .payments
        .iter()
        .map(|payment| payment.occurrence_date)
        .collect();
    assert!(dates.contains(&date(2024, 1, 5)));
    assert!(dates.contains(&date(2024, 2, 5)));
    assert!(!txn(&reconciled, "salary").is_matched());
}

#[test]
fn each_occurrence_receives_at_most_one_transaction() {
    let settings = BillMatchingSettings::default();
    let reconciled = ReconciliationService::reconcile(&household(), february(), &settings);

    let mut slots = HashSet::new();
    for def in reconciled.iter().filter_map(LedgerEntry::as_bill) {
        for payment in &def.bill.payments {
            assert!(slots.insert((def.id(), payment.occurrence_date)));
        }
    }

    let electric = &bill(&reconciled, "electric").bill.payments;
    let february_electric: Vec<_> = electric
        .iter()
        .filter(|payment| payment.occurrence_date == date(2024, 2, 12))
        .collect();
    assert_eq!(february_electric.len(), 1);
    // The exact amount outscores the near one for the February slot.
    assert_eq!(february_electric[0].transaction_description, "ELECTRIC AUTOPAY");
    assert!(!txn(&reconciled, "feb-electric").is_matched());
}

#[test]
fn manual_payments_survive_reconciliation() {
    let settings = BillMatchingSettings::default();
    let entries = PaymentService::mark_paid(&household(), "netflix", date(2024, 2, 5)).unwrap();
    let manual = bill(&entries, "netflix").bill.payments[0].clone();

    let reconciled = ReconciliationService::reconcile(&entries, february(), &settings);
    let payments = &bill(&reconciled, "netflix").bill.payments;
    let kept = payments
        .iter()
        .find(|payment| payment.occurrence_date == date(2024, 2, 5))
        .unwrap();
    assert_eq!(kept, &manual);
    assert!(!txn(&reconciled, "feb-netflix").is_matched());

    let again = ReconciliationService::reconcile(&reconciled, february(), &settings);
    assert_eq!(again, reconciled);
}

#[test]
fn income_and_weak_candidates_stay_unmatched() {
    let entries: Vec<LedgerEntry> = vec![
        BillDefinition::new("Phone", 45.0, date(2024, 1, 20), Frequency::Monthly)
            .with_id("phone")
            .into(),
        Transaction::new(date(2024, 2, 20), "Refund", 45.0)
            .with_id("refund")
            .into(),
        Transaction::new(date(2024, 2, 9), "GROCERY MART", -45.0)
            .with_id("groceries")
            .into(),
    ];
    let reconciled =
        ReconciliationService::reconcile(&entries, february(), &BillMatchingSettings::default());
    assert_eq!(reconciled, entries);
}

#[test]
fn report_lists_applied_matches() {
    let settings = BillMatchingSettings::default();
    let report = ReconciliationService::reconcile_with_report(&household(), february(), &settings);
    let linked: HashSet<_> = report
        .applied
        .iter()
        .map(|applied| applied.transaction_id.as_str())
        .collect();
    assert!(linked.contains("feb-netflix"));
    assert!(linked.contains("feb-insurance"));
    assert!(report.applied.iter().all(|applied| applied.score >= settings.minimum_score));
}
