use billsync_core::config::BillMatchingSettings;
use billsync_core::core::services::ReconciliationService;
use billsync_core::ledger::{
    generate_occurrences, BillDefinition, Frequency, LedgerEntry, MonthWindow, Transaction,
};
use billsync_core::storage::json_backend::{load_entries_from_path, save_entries_to_path};
use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::tempdir;

const BILL_NAMES: [&str; 6] = ["Rent", "Electric", "Water", "Internet", "Phone", "Gym"];
const FREQUENCIES: [Frequency; 3] = [Frequency::Monthly, Frequency::Quarterly, Frequency::Weekly];

fn build_sample_entries(bill_count: usize, txn_count: usize) -> Vec<LedgerEntry> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut entries = Vec::with_capacity(bill_count + txn_count);

    for idx in 0..bill_count {
        let name = format!("{} {}", BILL_NAMES[idx % BILL_NAMES.len()], idx);
        let due = start + Duration::days((idx % 28) as i64);
        let frequency = FREQUENCIES[idx % FREQUENCIES.len()];
        entries.push(
            BillDefinition::new(name, 20.0 + idx as f64, due, frequency)
                .with_id(format!("bill-{idx}"))
                .into(),
        );
    }

    for idx in 0..txn_count {
        let bill_idx = idx % bill_count;
        let date = start + Duration::days((idx % 365) as i64);
        let description = format!("{} {} PAYMENT", BILL_NAMES[bill_idx % BILL_NAMES.len()], bill_idx);
        let amount = -(20.0 + bill_idx as f64) - if idx % 4 == 0 { 0.5 } else { 0.0 };
        entries.push(
            Transaction::new(date, description, amount)
                .with_id(format!("txn-{idx}"))
                .into(),
        );
    }

    entries
}

fn bench_reconcile(c: &mut Criterion) {
    let entries = build_sample_entries(24, 600);
    let settings = BillMatchingSettings::default();
    let window = MonthWindow::new(2024, 6).unwrap();

    c.bench_function("occurrences_24_bills", |b| {
        b.iter(|| black_box(generate_occurrences(black_box(&entries), window)))
    });

    c.bench_function("reconcile_600_txns", |b| {
        b.iter(|| {
            black_box(ReconciliationService::reconcile(
                black_box(&entries),
                window,
                &settings,
            ))
        })
    });
}

fn bench_entry_io(c: &mut Criterion) {
    let entries = ReconciliationService::reconcile(
        &build_sample_entries(24, 2_000),
        MonthWindow::new(2024, 6).unwrap(),
        &BillMatchingSettings::default(),
    );
    let dir = tempdir().expect("tempdir");
    let file_path = dir.path().join("entries.json");

    c.bench_function("entries_save_2k", |b| {
        b.iter(|| save_entries_to_path(&entries, &file_path).expect("save entries"))
    });

    save_entries_to_path(&entries, &file_path).expect("seed");

    c.bench_function("entries_load_2k", |b| {
        b.iter(|| black_box(load_entries_from_path(&file_path).expect("load entries")))
    });
}

criterion_group!(benches, bench_reconcile, bench_entry_io);
criterion_main!(benches);
