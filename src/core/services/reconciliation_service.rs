//! Automatic reconciliation of transactions against bill occurrences.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::BillMatchingSettings;
use crate::core::services::matching_service::{MatchingService, TransactionBillMatch};
use crate::core::services::payment_service::upsert_payment;
use crate::ledger::recurring::generate_for_windows;
use crate::ledger::{BillOccurrence, BillPayment, LedgerEntry, MonthWindow, Transaction};

/// Lowest score surfaced as a suggestion when it falls short of the auto-match threshold.
pub const SUGGESTION_FLOOR: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMatch {
    pub transaction_id: String,
    pub bill_id: String,
    pub occurrence_date: NaiveDate,
    pub score: u32,
}

#[derive(Debug, Clone)]
pub struct ReconciliationReport {
    pub entries: Vec<LedgerEntry>,
    pub applied: Vec<AppliedMatch>,
    pub passes: usize,
}

struct Candidate {
    index: usize,
    occurrence: BillOccurrence,
    score: u32,
}

pub struct ReconciliationService;

impl ReconciliationService {
    /// Links unmatched transactions to bill occurrences and records the payments.
    pub fn reconcile(
        entries: &[LedgerEntry],
        window: MonthWindow,
        settings: &BillMatchingSettings,
    ) -> Vec<LedgerEntry> {
        Self::reconcile_with_report(entries, window, settings).entries
    }

    /// Repeats match, dedup, and write-back until a pass links nothing new.
    ///
    /// A transaction that loses its best occurrence to a stronger one is retried
    /// against the remaining free occurrences on the next pass, so the returned
    /// collection is stable under another reconciliation.
    pub fn reconcile_with_report(
        entries: &[LedgerEntry],
        window: MonthWindow,
        settings: &BillMatchingSettings,
    ) -> ReconciliationReport {
        let windows = active_windows(entries, window);
        let mut current = entries.to_vec();
        let mut applied = Vec::new();
        let mut passes = 0usize;

        loop {
            passes += 1;
            let winners = select_winners(&current, &windows, settings);
            if winners.is_empty() {
                break;
            }
            tracing::debug!(pass = passes, matches = winners.len(), "reconciliation pass");
            let (next, pass_applied) = apply_winners(&current, winners);
            current = next;
            applied.extend(pass_applied);
        }

        if !applied.is_empty() {
            tracing::info!(
                month = %window,
                matched = applied.len(),
                passes,
                "reconciliation linked transactions to bills"
            );
        }

        ReconciliationReport {
            entries: current,
            applied,
            passes,
        }
    }

    /// Best candidate for every unmatched, visible transaction dated in `window`.
    pub fn match_month(
        entries: &[LedgerEntry],
        window: MonthWindow,
        settings: &BillMatchingSettings,
    ) -> Vec<TransactionBillMatch> {
        let pool = open_occurrences(entries, &active_windows(entries, window));
        unmatched_transactions(entries)
            .filter(|(_, txn)| !txn.hidden_as_bill_payment && window.contains(txn.date))
            .map(|(_, txn)| MatchingService::find_best_match(txn, &pool, settings))
            .collect()
    }

    /// Matches too weak to apply automatically but worth showing to the user.
    pub fn suggest_matches(
        entries: &[LedgerEntry],
        window: MonthWindow,
        settings: &BillMatchingSettings,
    ) -> Vec<TransactionBillMatch> {
        Self::match_month(entries, window, settings)
            .into_iter()
            .filter(|candidate| {
                candidate.is_match()
                    && candidate.match_score >= SUGGESTION_FLOOR
                    && candidate.match_score < settings.minimum_score
            })
            .collect()
    }
}

/// Every month holding a plain transaction, plus the month being viewed.
fn active_windows(entries: &[LedgerEntry], window: MonthWindow) -> Vec<MonthWindow> {
    let mut windows: BTreeSet<MonthWindow> = entries
        .iter()
        .filter_map(LedgerEntry::as_plain)
        .map(|txn| MonthWindow::of(txn.date))
        .collect();
    windows.insert(window);
    windows.into_iter().collect()
}

/// Occurrences without a recorded payment. Paid occurrences, manual ones
/// included, are never offered to the matcher.
fn open_occurrences(entries: &[LedgerEntry], windows: &[MonthWindow]) -> Vec<BillOccurrence> {
    generate_for_windows(entries, windows.iter().copied())
        .into_iter()
        .filter(|occurrence| !occurrence.is_paid())
        .collect()
}

fn unmatched_transactions(entries: &[LedgerEntry]) -> impl Iterator<Item = (usize, &Transaction)> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| entry.as_plain().map(|txn| (index, txn)))
        .filter(|(_, txn)| !txn.is_matched())
}

/// Scores every unmatched transaction and keeps the strongest one per occurrence.
fn select_winners(
    entries: &[LedgerEntry],
    windows: &[MonthWindow],
    settings: &BillMatchingSettings,
) -> Vec<Candidate> {
    let pool = open_occurrences(entries, windows);
    if pool.is_empty() {
        return Vec::new();
    }

    let mut winners: Vec<Candidate> = Vec::new();
    let mut slots: HashMap<(String, NaiveDate), usize> = HashMap::new();

    for (index, txn) in unmatched_transactions(entries) {
        let found = MatchingService::find_best_match(txn, &pool, settings);
        let Some(occurrence) = found.matched_bill else {
            continue;
        };
        if found.match_score < settings.minimum_score {
            continue;
        }
        let candidate = Candidate {
            index,
            occurrence,
            score: found.match_score,
        };
        match slots.get(&candidate.occurrence.slot()) {
            Some(&slot) => {
                if candidate.score > winners[slot].score {
                    winners[slot] = candidate;
                }
            }
            None => {
                slots.insert(candidate.occurrence.slot(), winners.len());
                winners.push(candidate);
            }
        }
    }

    winners
}

fn apply_winners(
    entries: &[LedgerEntry],
    winners: Vec<Candidate>,
) -> (Vec<LedgerEntry>, Vec<AppliedMatch>) {
    let bill_positions: HashMap<String, usize> = entries
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, entry)| entry.is_bill())
        .map(|(index, entry)| (entry.key(), index))
        .collect();

    let mut updated = entries.to_vec();
    let mut applied = Vec::with_capacity(winners.len());

    for winner in winners {
        let Some(&bill_index) = bill_positions.get(&winner.occurrence.bill_id) else {
            continue;
        };
        let Some(txn) = updated[winner.index].as_plain_mut() else {
            continue;
        };
        txn.link_to_bill(&winner.occurrence.bill_id);
        let payment =
            BillPayment::from_transaction(winner.occurrence.occurrence_date, txn, false);
        let transaction_id = txn.key();

        if let Some(def) = updated[bill_index].as_bill_mut() {
            def.bill.payments = upsert_payment(&def.bill.payments, payment, false);
        }
        applied.push(AppliedMatch {
            transaction_id,
            bill_id: winner.occurrence.bill_id,
            occurrence_date: winner.occurrence.occurrence_date,
            score: winner.score,
        });
    }

    (updated, applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{BillDefinition, Frequency};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(y: i32, m: u32) -> MonthWindow {
        MonthWindow::new(y, m).unwrap()
    }

    #[test]
    fn dedup_loser_takes_next_free_occurrence() {
        let entries: Vec<LedgerEntry> = vec![
            BillDefinition::new("Gym", 30.0, date(2024, 1, 15), Frequency::Monthly)
                .with_id("gym")
                .into(),
            Transaction::new(date(2024, 2, 14), "GYM", -30.0).with_id("a").into(),
            Transaction::new(date(2024, 2, 15), "GYM", -30.0).with_id("b").into(),
            Transaction::new(date(2024, 3, 1), "Salary", 2500.0).with_id("pay").into(),
        ];
        let settings = BillMatchingSettings {
            date_window_days: 31,
            require_date_window: false,
            ..BillMatchingSettings::default()
        };
        let report = ReconciliationService::reconcile_with_report(&entries, month(2024, 2), &settings);
        // "b" wins February outright; "a" settles for the nearest remaining month.
        assert_eq!(report.applied[0].transaction_id, "b");
        assert_eq!(report.applied[0].occurrence_date, date(2024, 2, 15));
        assert_eq!(report.applied[1].transaction_id, "a");
        assert_eq!(report.passes, 3);
    }

    #[test]
    fn active_windows_include_target_month() {
        let entries: Vec<LedgerEntry> =
            vec![Transaction::new(date(2023, 12, 30), "X", -1.0).into()];
        let windows = active_windows(&entries, month(2024, 2));
        assert_eq!(windows, vec![month(2023, 12), month(2024, 2)]);
    }

    #[test]
    fn suggestions_sit_between_floor_and_threshold() {
        let entries: Vec<LedgerEntry> = vec![
            BillDefinition::new("Insurance", 120.0, date(2024, 3, 1), Frequency::Monthly)
                .with_id("ins")
                .into(),
            Transaction::new(date(2024, 3, 4), "ACME MUTUAL", -120.0)
                .with_id("t")
                .into(),
        ];
        let settings = BillMatchingSettings {
            minimum_score: 90,
            ..BillMatchingSettings::default()
        };
        let suggestions = ReconciliationService::suggest_matches(&entries, month(2024, 3), &settings);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].match_score, 30 + 10 + 21);

        let applied = ReconciliationService::reconcile(&entries, month(2024, 3), &settings);
        assert_eq!(applied, entries);
    }
}
